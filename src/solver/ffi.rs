//! Raw bindings to the C shim in `csrc/mumps_shim.c`

#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_double, c_int};

// The index vectors are Vec<i32> handed over as c_int, matching the shim's
// 32-bit MUMPS_INT check
const _: () = assert!(std::mem::size_of::<c_int>() == std::mem::size_of::<i32>());

/// Opaque handle wrapping a `DMUMPS_STRUC_C`
#[repr(C)]
pub struct bench_mumps {
    _private: [u8; 0],
}

extern "C" {
    pub fn bench_mumps_new(sym: c_int, par: c_int, comm_fortran: c_int) -> *mut bench_mumps;
    pub fn bench_mumps_free(h: *mut bench_mumps);

    /// Runs JOB and returns INFOG(1)
    pub fn bench_mumps_job(h: *mut bench_mumps, job: c_int) -> c_int;

    pub fn bench_mumps_set_icntl(h: *mut bench_mumps, index: c_int, value: c_int);
    pub fn bench_mumps_get_icntl(h: *const bench_mumps, index: c_int) -> c_int;

    pub fn bench_mumps_set_problem(
        h: *mut bench_mumps,
        n: c_int,
        nnz: i64,
        irn: *mut c_int,
        jcn: *mut c_int,
        a: *mut c_double,
        rhs: *mut c_double,
    );

    pub fn bench_mumps_infog(h: *const bench_mumps, index: c_int) -> c_int;
    pub fn bench_mumps_rinfog(h: *const bench_mumps, index: c_int) -> c_double;
    pub fn bench_mumps_version(h: *const bench_mumps) -> *const c_char;

    pub fn bench_mpi_init() -> c_int;
    pub fn bench_mpi_rank(rank: *mut c_int) -> c_int;
    pub fn bench_mpi_size(size: *mut c_int) -> c_int;
    pub fn bench_mpi_finalize() -> c_int;
}
