//! MUMPS backend through the C shim
//!
//! The backend owns copies of the triplet arrays and the right-hand side so
//! the raw pointers stored inside `DMUMPS_STRUC_C` stay valid from
//! definition until [`Job::End`]. MUMPS overwrites `RHS` with the solution,
//! so the right-hand side is restored before every solve.

use std::ffi::CStr;
use std::ptr::NonNull;

use super::control::ControlParameters;
use super::ffi;
use super::{Diagnostics, HostRole, Job, SolverBackend, Symmetry};
use crate::constants::{INFOG_LEN, RINFOG_LEN, USE_COMM_WORLD};
use crate::error::{BenchError, Result};
use crate::matrix::CooMatrix;

/// Host-side copy of the problem handed to MUMPS
#[derive(Debug, Default)]
struct HostData {
    irn: Vec<i32>,
    jcn: Vec<i32>,
    values: Vec<f64>,
    rhs: Vec<f64>,
    /// MUMPS reads and overwrites this buffer
    work: Vec<f64>,
}

/// A `DMUMPS_STRUC_C` instance
pub struct MumpsBackend {
    handle: Option<NonNull<ffi::bench_mumps>>,
    symmetry: Symmetry,
    host: HostRole,
    data: Option<HostData>,
    initialized: bool,
}

impl MumpsBackend {
    pub fn new() -> Self {
        Self {
            handle: None,
            symmetry: Symmetry::default(),
            host: HostRole::default(),
            data: None,
            initialized: false,
        }
    }

    /// Version string reported by the library after initialization
    pub fn version(&self) -> Option<String> {
        let handle = self.handle?;
        // SAFETY: the handle is live and version_number is NUL terminated
        let raw = unsafe { CStr::from_ptr(ffi::bench_mumps_version(handle.as_ptr())) };
        Some(raw.to_string_lossy().trim().to_string())
    }

    /// INFOG(`index`), 1-based; `None` outside `1..=80` or before init
    pub fn infog(&self, index: usize) -> Option<i32> {
        if !(1..=INFOG_LEN).contains(&index) {
            return None;
        }
        let handle = self.handle?;
        // SAFETY: the handle is live and index lies within the INFOG array
        Some(unsafe { ffi::bench_mumps_infog(handle.as_ptr(), index as i32) })
    }

    /// RINFOG(`index`), 1-based; `None` outside `1..=40` or before init
    pub fn rinfog(&self, index: usize) -> Option<f64> {
        if !(1..=RINFOG_LEN).contains(&index) {
            return None;
        }
        let handle = self.handle?;
        // SAFETY: the handle is live and index lies within the RINFOG array
        Some(unsafe { ffi::bench_mumps_rinfog(handle.as_ptr(), index as i32) })
    }

    fn diagnostics(&self) -> Diagnostics {
        match self.handle {
            Some(_) => Diagnostics {
                infog: [
                    self.infog(1).unwrap_or_default(),
                    self.infog(2).unwrap_or_default(),
                    self.infog(3).unwrap_or_default(),
                ],
            },
            None => Diagnostics::default(),
        }
    }

    fn ensure_handle(&mut self) -> Result<NonNull<ffi::bench_mumps>> {
        if let Some(h) = self.handle {
            return Ok(h);
        }
        // SAFETY: plain constructor, returns NULL on allocation failure
        let raw = unsafe {
            ffi::bench_mumps_new(self.symmetry.code(), self.host.code(), USE_COMM_WORLD)
        };
        let handle = NonNull::new(raw)
            .ok_or_else(|| BenchError::Backend("failed to allocate MUMPS instance".to_string()))?;
        self.handle = Some(handle);
        Ok(handle)
    }

    fn run(&mut self, job: Job) -> Diagnostics {
        let handle = match self.ensure_handle() {
            Ok(h) => h,
            Err(err) => {
                tracing::error!(%err);
                return Diagnostics::error(crate::constants::INFO_ERR_ALLOCATION, 0);
            }
        };

        if job == Job::Solve {
            if let Some(data) = self.data.as_mut() {
                data.work.copy_from_slice(&data.rhs);
            }
        }

        // SAFETY: the handle is live and every pointer registered through
        // bench_mumps_set_problem points into self.data, which is neither
        // moved nor resized until the instance is terminated
        unsafe { ffi::bench_mumps_job(handle.as_ptr(), job.code()) };
        self.diagnostics()
    }

    fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            // SAFETY: handle came from bench_mumps_new and is dropped once
            unsafe { ffi::bench_mumps_free(handle.as_ptr()) };
        }
        self.data = None;
    }
}

impl Default for MumpsBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverBackend for MumpsBackend {
    fn name(&self) -> &'static str {
        "mumps"
    }

    fn is_distributed(&self) -> bool {
        true
    }

    fn configure(&mut self, symmetry: Symmetry, host: HostRole) {
        self.symmetry = symmetry;
        self.host = host;
    }

    fn set_control(&mut self, params: &ControlParameters) {
        if let Some(handle) = self.handle {
            for (index, value) in params.iter() {
                // SAFETY: handle is live and index is within 1..=60
                let stored = unsafe {
                    ffi::bench_mumps_set_icntl(handle.as_ptr(), index as i32, value);
                    ffi::bench_mumps_get_icntl(handle.as_ptr(), index as i32)
                };
                tracing::trace!(index, value = stored, "ICNTL set");
            }
        }
    }

    fn define_problem(&mut self, matrix: &CooMatrix, rhs: &[f64]) {
        let handle = match self.handle {
            Some(h) => h,
            None => {
                tracing::error!("define_problem called before initialization");
                return;
            }
        };

        let mut rhs = rhs.to_vec();
        rhs.resize(matrix.n_rows, 0.0);
        let data = self.data.insert(HostData {
            irn: matrix.rows.clone(),
            jcn: matrix.cols.clone(),
            values: matrix.values.clone(),
            work: rhs.clone(),
            rhs,
        });

        // SAFETY: pointers stay valid while `self.data` is untouched, which
        // holds until release() after JOB = -2
        unsafe {
            ffi::bench_mumps_set_problem(
                handle.as_ptr(),
                matrix.n_rows as i32,
                data.values.len() as i64,
                data.irn.as_mut_ptr(),
                data.jcn.as_mut_ptr(),
                data.values.as_mut_ptr(),
                data.work.as_mut_ptr(),
            )
        };
    }

    fn execute(&mut self, job: Job) -> Diagnostics {
        let diag = self.run(job);
        match job {
            Job::Init => {
                self.initialized = !diag.is_error();
                if let Some(version) = self.version() {
                    tracing::debug!(%version, "MUMPS initialized");
                }
            }
            Job::End => {
                self.initialized = false;
                self.release();
            }
            _ => {}
        }
        diag
    }

    fn solution(&self) -> &[f64] {
        self.data.as_ref().map(|d| d.work.as_slice()).unwrap_or(&[])
    }
}

impl Drop for MumpsBackend {
    fn drop(&mut self) {
        if self.initialized {
            if let Some(handle) = self.handle {
                // SAFETY: terminate the instance before freeing the handle
                unsafe { ffi::bench_mumps_job(handle.as_ptr(), Job::End.code()) };
            }
        }
        self.release();
    }
}
