//! Solver backends behind the MUMPS job protocol
//!
//! A solver instance is driven exactly like `dmumps_c`: set `SYM`/`PAR`,
//! run [`Job::Init`], set ICNTL and the problem on the host, then run
//! [`Job::Analyze`], [`Job::Factorize`], [`Job::Solve`] and finally
//! [`Job::End`]. After every job the caller inspects INFOG(1) through
//! [`check`].
//!
//! Two backends implement [`SolverBackend`]:
//!
//! - [`NativeBackend`]: banded LU in Rust, always available
//! - `MumpsBackend`: the real library through FFI (feature `mumps`)

use std::fmt;
use std::str::FromStr;

use crate::constants::*;
use crate::error::{BenchError, Result};
use crate::matrix::CooMatrix;

pub mod control;
pub mod native;

#[cfg(feature = "mumps")]
pub(crate) mod ffi;
#[cfg(feature = "mumps")]
pub mod mumps;

pub use control::ControlParameters;
pub use native::NativeBackend;

#[cfg(feature = "mumps")]
pub use mumps::MumpsBackend;

/// A solver job (the `JOB` field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Job {
    Init,
    End,
    Analyze,
    Factorize,
    Solve,
}

impl Job {
    /// Integer code passed to the library
    pub fn code(self) -> i32 {
        match self {
            Job::Init => JOB_INIT,
            Job::End => JOB_END,
            Job::Analyze => JOB_ANALYZE,
            Job::Factorize => JOB_FACTORIZE,
            Job::Solve => JOB_SOLVE,
        }
    }

    /// Human-readable phase name used in logs and diagnostics
    pub fn label(self) -> &'static str {
        match self {
            Job::Init => "Initialization",
            Job::End => "Termination",
            Job::Analyze => "Analysis",
            Job::Factorize => "Factorization",
            Job::Solve => "Solution",
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (JOB = {})", self.label(), self.code())
    }
}

/// Matrix symmetry as understood by the solver (`SYM`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Symmetry {
    /// SYM = 0
    #[default]
    Unsymmetric,
    /// SYM = 1, symmetric positive definite
    PositiveDefinite,
    /// SYM = 2
    GeneralSymmetric,
}

impl Symmetry {
    pub fn code(self) -> i32 {
        match self {
            Symmetry::Unsymmetric => 0,
            Symmetry::PositiveDefinite => 1,
            Symmetry::GeneralSymmetric => 2,
        }
    }

    pub fn from_code(code: i32) -> Result<Self> {
        match code {
            0 => Ok(Symmetry::Unsymmetric),
            1 => Ok(Symmetry::PositiveDefinite),
            2 => Ok(Symmetry::GeneralSymmetric),
            other => Err(BenchError::InvalidArgument(format!(
                "symmetry type must be 0, 1 or 2, got {}",
                other
            ))),
        }
    }

    /// Whether only one triangle of the matrix is meaningful
    pub fn is_symmetric(self) -> bool {
        !matches!(self, Symmetry::Unsymmetric)
    }
}

impl FromStr for Symmetry {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "unsymmetric" | "general" => Ok(Symmetry::Unsymmetric),
            "spd" | "positive-definite" => Ok(Symmetry::PositiveDefinite),
            "symmetric" => Ok(Symmetry::GeneralSymmetric),
            other => other
                .parse::<i32>()
                .map_err(|_| BenchError::InvalidArgument(format!("unknown symmetry '{}'", s)))
                .and_then(Symmetry::from_code),
        }
    }
}

/// Whether the host process takes part in factorization and solve (`PAR`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HostRole {
    /// PAR = 1
    #[default]
    Working,
    /// PAR = 0
    Idle,
}

impl HostRole {
    pub fn code(self) -> i32 {
        match self {
            HostRole::Working => 1,
            HostRole::Idle => 0,
        }
    }
}

/// The first entries of the solver's INFOG array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    /// INFOG(1), INFOG(2), INFOG(3)
    pub infog: [i32; 3],
}

impl Diagnostics {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn error(code: i32, detail: i32) -> Self {
        Self {
            infog: [code, detail, 0],
        }
    }

    /// INFOG(1)
    pub fn status(&self) -> i32 {
        self.infog[0]
    }

    pub fn is_error(&self) -> bool {
        self.status() < 0
    }

    pub fn is_warning(&self) -> bool {
        self.status() > 0
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INFOG(1) = {}, INFOG(2) = {}, INFOG(3) = {}",
            self.infog[0], self.infog[1], self.infog[2]
        )
    }
}

/// Converts a negative INFOG(1) into an error
pub fn check(job: Job, diagnostics: Diagnostics) -> Result<Diagnostics> {
    if diagnostics.is_error() {
        Err(BenchError::Solver { job, diagnostics })
    } else {
        if diagnostics.is_warning() {
            tracing::warn!(%job, %diagnostics, "solver returned a warning");
        }
        Ok(diagnostics)
    }
}

/// A direct solver instance driven through the job protocol
pub trait SolverBackend {
    /// Short name for logs and reports
    fn name(&self) -> &'static str;

    /// Whether the instance spans every rank of the communicator
    ///
    /// Backends that are not distributed run on the host rank only.
    fn is_distributed(&self) -> bool {
        false
    }

    /// Sets `SYM` and `PAR`; must be called before [`Job::Init`]
    fn configure(&mut self, symmetry: Symmetry, host: HostRole);

    /// Applies ICNTL overrides; call after [`Job::Init`], which resets them
    fn set_control(&mut self, params: &ControlParameters);

    /// Hands the assembled problem to the solver (host only)
    ///
    /// The backend keeps its own copy of the data for the lifetime of the
    /// instance.
    fn define_problem(&mut self, matrix: &CooMatrix, rhs: &[f64]);

    /// Runs one job and returns the resulting INFOG entries
    fn execute(&mut self, job: Job) -> Diagnostics;

    /// Solution of the last successful [`Job::Solve`]
    fn solution(&self) -> &[f64];
}

/// Which backend to instantiate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Native,
    Mumps,
}

impl Default for BackendKind {
    fn default() -> Self {
        if cfg!(feature = "mumps") {
            BackendKind::Mumps
        } else {
            BackendKind::Native
        }
    }
}

impl FromStr for BackendKind {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(BackendKind::Native),
            "mumps" => Ok(BackendKind::Mumps),
            other => Err(BenchError::InvalidArgument(format!(
                "unknown backend '{}' (expected native or mumps)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => write!(f, "native"),
            BackendKind::Mumps => write!(f, "mumps"),
        }
    }
}

/// Creates a backend of the requested kind
///
/// `threads` sizes the native backend's worker pool; the MUMPS backend
/// takes its threading from ICNTL(16) and the OpenMP runtime instead.
pub fn create_backend(kind: BackendKind, threads: usize) -> Result<Box<dyn SolverBackend>> {
    match kind {
        BackendKind::Native => Ok(Box::new(NativeBackend::with_threads(threads)?)),
        #[cfg(feature = "mumps")]
        BackendKind::Mumps => Ok(Box::new(MumpsBackend::new())),
        #[cfg(not(feature = "mumps"))]
        BackendKind::Mumps => Err(BenchError::Backend(
            "this build does not link MUMPS; rebuild with --features mumps or use --backend native"
                .to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_codes() {
        assert_eq!(Job::Init.code(), -1);
        assert_eq!(Job::End.code(), -2);
        assert_eq!(Job::Analyze.code(), 1);
        assert_eq!(Job::Factorize.code(), 2);
        assert_eq!(Job::Solve.code(), 3);
    }

    #[test]
    fn test_symmetry_parsing() {
        assert_eq!("0".parse::<Symmetry>().unwrap(), Symmetry::Unsymmetric);
        assert_eq!("spd".parse::<Symmetry>().unwrap(), Symmetry::PositiveDefinite);
        assert_eq!("2".parse::<Symmetry>().unwrap(), Symmetry::GeneralSymmetric);
        assert!("3".parse::<Symmetry>().is_err());
        assert!("hermitian".parse::<Symmetry>().is_err());
    }

    #[test]
    fn test_check_rejects_negative_status() {
        assert!(check(Job::Solve, Diagnostics::ok()).is_ok());
        assert!(check(Job::Solve, Diagnostics::error(1, 3)).is_ok());

        let err = check(Job::Factorize, Diagnostics::error(-10, 0)).unwrap_err();
        assert_eq!(err.diagnostics().map(|d| d.status()), Some(-10));
        assert!(err.to_string().contains("Factorization"));
    }

    #[cfg(not(feature = "mumps"))]
    #[test]
    fn test_mumps_backend_unavailable_without_feature() {
        assert!(matches!(
            create_backend(BackendKind::Mumps, 1),
            Err(BenchError::Backend(_))
        ));
    }
}
