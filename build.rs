//! Build script for mumps_bench
//!
//! Compiles the C shim around `dmumps_c` when the `mumps` feature is enabled.
//! The shim includes the installed `dmumps_c.h`, so the layout of
//! `DMUMPS_STRUC_C` always matches the library we link against. A MUMPS
//! built with 64-bit `MUMPS_INT` is rejected at compile time.
//!
//! # Environment Variables
//!
//! - `MUMPS_DIR`: MUMPS installation prefix (uses `include/` and `lib/`)
//! - `MUMPS_INCLUDE_DIR` / `MUMPS_LIB_DIR`: override the two paths separately
//! - `MUMPS_LIBS`: comma separated link names (default `dmumps,mumps_common,pord`)
//! - `MPI_INCLUDE_DIR`: directory holding `mpi.h` (or libseq's stub header)
//! - `MUMPS_EXTRA_LIBS`: extra link names (MPI, ScaLAPACK, BLAS, gfortran, ...)

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Only compile the shim when the real solver is requested
    #[cfg(feature = "mumps")]
    compile_mumps_shim();
}

#[cfg(feature = "mumps")]
fn compile_mumps_shim() {
    use std::env;
    use std::path::PathBuf;

    for var in [
        "MUMPS_DIR",
        "MUMPS_INCLUDE_DIR",
        "MUMPS_LIB_DIR",
        "MUMPS_LIBS",
        "MPI_INCLUDE_DIR",
        "MUMPS_EXTRA_LIBS",
    ] {
        println!("cargo:rerun-if-env-changed={}", var);
    }
    println!("cargo:rerun-if-changed=csrc/mumps_shim.c");
    println!("cargo:rerun-if-changed=csrc/mumps_shim.h");

    let prefix = env::var("MUMPS_DIR").ok().map(PathBuf::from);
    let include_dir = env::var("MUMPS_INCLUDE_DIR")
        .ok()
        .map(PathBuf::from)
        .or_else(|| prefix.as_ref().map(|p| p.join("include")));
    let lib_dir = env::var("MUMPS_LIB_DIR")
        .ok()
        .map(PathBuf::from)
        .or_else(|| prefix.as_ref().map(|p| p.join("lib")));

    let mut build = cc::Build::new();
    build.file("csrc/mumps_shim.c").include("csrc").std("c11");
    if let Some(dir) = &include_dir {
        build.include(dir);
    }
    if let Ok(dir) = env::var("MPI_INCLUDE_DIR") {
        build.include(dir);
    }
    build.compile("mumps_shim");

    if let Some(dir) = &lib_dir {
        println!("cargo:rustc-link-search=native={}", dir.display());
    }

    let libs = env::var("MUMPS_LIBS").unwrap_or_else(|_| "dmumps,mumps_common,pord".to_string());
    let extra = env::var("MUMPS_EXTRA_LIBS").unwrap_or_default();
    for lib in libs.split(',').chain(extra.split(',')) {
        let lib = lib.trim();
        if !lib.is_empty() {
            println!("cargo:rustc-link-lib={}", lib);
        }
    }
}
