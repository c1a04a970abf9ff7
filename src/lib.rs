//! # mumps_bench: benchmark drivers for sparse direct solvers
//!
//! Reads a sparse matrix in Matrix Market coordinate format, drives a
//! direct solver through the MUMPS job protocol and reports how long the
//! analysis, factorization and solve phases took and how accurate the
//! solution is.
//!
//! ## Overview
//!
//! ```text
//! parse input → configure solver → init → analyze → factorize → solve
//!             → end → relative error → statistics table
//! ```
//!
//! - [`matrix`]: coordinate storage, Matrix Market I/O, model problems
//! - [`solver`]: the job protocol, ICNTL handling and the backends
//! - [`bench`]: the timed pipeline and the report formats
//! - [`runtime`]: MPI rank/size and thread detection
//! - [`cli`]: argument parsing shared by the driver binaries
//!
//! The right-hand side is `b = A·1`, so the exact solution is the vector of
//! ones and the relative error is `‖x − 1‖₂ / √n`.
//!
//! ## Backends
//!
//! The native backend (banded LU on a rayon pool) is always available. The
//! real MUMPS library is linked with the `mumps` feature; see `build.rs`
//! for the environment variables that locate it.
//!
//! ## Usage
//!
//! ```
//! use mumps_bench::matrix::generate;
//! use mumps_bench::solver::{ControlParameters, HostRole, NativeBackend, Symmetry};
//! use mumps_bench::{relative_error, solve, RunMode};
//!
//! let a = generate::laplacian_1d(50, true);
//! let b = a.matvec(&vec![1.0; 50], true);
//!
//! let mut backend = NativeBackend::with_threads(2).unwrap();
//! let outcome = solve(
//!     &mut backend,
//!     Symmetry::PositiveDefinite,
//!     HostRole::Working,
//!     &ControlParameters::silent(),
//!     Some((&a, b.as_slice())),
//!     RunMode::Functional,
//! )
//! .unwrap();
//!
//! assert!(relative_error(&outcome.solution) < 1e-10);
//! ```

pub mod bench;
pub mod cli;
pub mod constants;
pub mod error;
pub mod logging;
pub mod matrix;
pub mod runtime;
pub mod solver;

// Re-export primary components
pub use bench::{
    relative_error, run_benchmark, solve, BenchConfig, BenchStats, OutputFormat, PhaseTimings,
    RunMode, SolveOutcome,
};
pub use error::{BenchError, Result};
pub use matrix::{read_matrix_market, CooMatrix, HeaderPolicy, MatrixMarketHeader};
pub use runtime::{detect_thread_count, Communicator};
pub use solver::{
    check, create_backend, BackendKind, ControlParameters, Diagnostics, HostRole, Job,
    SolverBackend, Symmetry,
};

/// Version of the benchmark drivers
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
