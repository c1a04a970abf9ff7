//! Benchmark pipeline
//!
//! ```text
//! read matrix → init → ICNTL + problem → analyze → factorize → solve
//!             [→ cold calls → hot calls] → end → relative error → stats
//! ```
//!
//! Every job is checked right after it returns; the first negative
//! INFOG(1) aborts the run with [`BenchError::Solver`].

pub mod stats;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::constants::COLD_CALLS;
use crate::error::{BenchError, Result};
use crate::matrix::{read_header, read_matrix_market, CooMatrix, HeaderPolicy, MatrixMarketHeader};
use crate::runtime::{detect_thread_count, Communicator};
use crate::solver::{
    check, create_backend, BackendKind, ControlParameters, Diagnostics, HostRole, Job,
    SolverBackend, Symmetry,
};

pub use stats::{relative_error, BenchStats, OutputFormat, PhaseTimings};

/// How phases are timed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// One pass of analyze/factorize/solve, each timed once
    #[default]
    Functional,
    /// After the functional pass, [`COLD_CALLS`] warm-up calls per phase,
    /// then `iterations` timed hot calls per phase
    Performance { iterations: usize },
}

impl RunMode {
    /// Maps the drivers' `perf_mode`/`iter` pair: 0 means functional
    pub fn from_flags(perf_mode: u32, iterations: usize) -> Self {
        if perf_mode == 0 {
            RunMode::Functional
        } else {
            RunMode::Performance {
                iterations: iterations.max(1),
            }
        }
    }
}

/// Configuration of one benchmark run
#[derive(Debug, Clone)]
pub struct BenchConfig {
    /// Matrix Market input
    pub matrix_path: PathBuf,

    /// `SYM`; taken from the file's banner when `None`
    pub symmetry: Option<Symmetry>,

    /// `PAR`
    pub host_role: HostRole,

    pub mode: RunMode,

    pub backend: BackendKind,

    pub format: OutputFormat,

    /// ICNTL overrides applied after initialization
    pub control: ControlParameters,

    pub header_policy: HeaderPolicy,

    /// Worker threads per rank, reported in the stats
    pub threads: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            matrix_path: PathBuf::new(),
            symmetry: None,
            host_role: HostRole::Working,
            mode: RunMode::Functional,
            backend: BackendKind::default(),
            format: OutputFormat::Table,
            control: ControlParameters::benchmark_defaults(false),
            header_policy: HeaderPolicy::Strict,
            threads: detect_thread_count(),
        }
    }
}

impl BenchConfig {
    /// Default configuration for `path`
    pub fn for_matrix<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            matrix_path: path.into(),
            ..Self::default()
        }
    }
}

/// Solution and timings of a completed solve sequence
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub timings: PhaseTimings,
    /// Empty on ranks other than the host
    pub solution: Vec<f64>,
}

/// Runs one job and checks its status
pub fn run_job(backend: &mut dyn SolverBackend, job: Job) -> Result<Diagnostics> {
    tracing::debug!(%job, "start");
    let diagnostics = check(job, backend.execute(job))?;
    tracing::debug!(%job, "done");
    Ok(diagnostics)
}

/// Average wall time of `calls` consecutive runs of `job`
fn time_job(backend: &mut dyn SolverBackend, job: Job, calls: usize) -> Result<Duration> {
    let calls = calls.max(1);
    let start = Instant::now();
    for _ in 0..calls {
        check(job, backend.execute(job))?;
    }
    Ok(average(start.elapsed(), calls))
}

fn average(total: Duration, calls: usize) -> Duration {
    total.div_f64(calls.max(1) as f64)
}

/// Drives a backend through the whole job sequence
///
/// `problem` is the matrix and right-hand side on the host and `None`
/// elsewhere. The instance is terminated with [`Job::End`] before
/// returning successfully.
pub fn solve(
    backend: &mut dyn SolverBackend,
    symmetry: Symmetry,
    host_role: HostRole,
    control: &ControlParameters,
    problem: Option<(&CooMatrix, &[f64])>,
    mode: RunMode,
) -> Result<SolveOutcome> {
    backend.configure(symmetry, host_role);
    run_job(backend, Job::Init)?;

    backend.set_control(control);
    if let Some((matrix, rhs)) = problem {
        backend.define_problem(matrix, rhs);
    }

    let mut timings = PhaseTimings {
        analysis: time_job(backend, Job::Analyze, 1)?,
        factorization: time_job(backend, Job::Factorize, 1)?,
        solve: time_job(backend, Job::Solve, 1)?,
    };
    tracing::debug!(?timings, "functional pass");

    if let RunMode::Performance { iterations } = mode {
        for job in [Job::Analyze, Job::Factorize, Job::Solve] {
            time_job(backend, job, COLD_CALLS)?;
        }
        timings = PhaseTimings {
            analysis: time_job(backend, Job::Analyze, iterations)?,
            factorization: time_job(backend, Job::Factorize, iterations)?,
            solve: time_job(backend, Job::Solve, iterations)?,
        };
        tracing::debug!(?timings, iterations, "hot calls");
    }

    let solution = match problem {
        Some(_) => backend.solution().to_vec(),
        None => Vec::new(),
    };
    run_job(backend, Job::End)?;

    Ok(SolveOutcome { timings, solution })
}

/// Runs the benchmark described by `config`
///
/// Returns the statistics on the host rank and `None` on every other rank.
pub fn run_benchmark(config: &BenchConfig, comm: &Communicator) -> Result<Option<BenchStats>> {
    let mut backend = create_backend(config.backend, config.threads)?;
    if !comm.is_host() && !backend.is_distributed() {
        tracing::info!(
            rank = comm.rank(),
            backend = backend.name(),
            "backend runs on the host rank only; nothing to do"
        );
        return Ok(None);
    }

    let market = if comm.is_host() {
        Some(read_matrix_market(&config.matrix_path, config.header_policy)?)
    } else {
        None
    };

    let symmetry = match config.symmetry {
        Some(s) => s,
        None => {
            let header = match &market {
                Some(m) => m.header,
                None => read_header(&config.matrix_path, config.header_policy)?,
            };
            symmetry_from_header(&header)
        }
    };

    let problem = match &market {
        Some(m) => {
            let matrix = &m.matrix;
            if matrix.n_rows != matrix.n_cols {
                return Err(BenchError::InvalidArgument(format!(
                    "matrix must be square, got {}x{}",
                    matrix.n_rows, matrix.n_cols
                )));
            }
            tracing::info!(
                path = %config.matrix_path.display(),
                n = matrix.n_rows,
                nnz = matrix.nnz(),
                header = %m.header,
                "matrix loaded"
            );
            let ones = vec![1.0; matrix.n_cols];
            Some((matrix, matrix.matvec(&ones, symmetry.is_symmetric())))
        }
        None => None,
    };

    tracing::info!(
        backend = backend.name(),
        sym = symmetry.code(),
        ranks = comm.size(),
        threads = config.threads,
        mode = ?config.mode,
        "starting benchmark"
    );

    let outcome = solve(
        backend.as_mut(),
        symmetry,
        config.host_role,
        &config.control,
        problem.as_ref().map(|(m, rhs)| (*m, rhs.as_slice())),
        config.mode,
    )?;

    Ok(problem.map(|(matrix, _)| BenchStats {
        name: config.matrix_path.display().to_string(),
        nrows: matrix.n_rows,
        ncols: matrix.n_cols,
        nnz: matrix.nnz(),
        mpi_ranks: comm.size(),
        threads: config.threads,
        symmetry,
        sparsity_percent: matrix.sparsity_percent(),
        timings: outcome.timings,
        relative_error: relative_error(&outcome.solution),
    }))
}

/// `SYM = 2` for a symmetric banner, `SYM = 0` otherwise
pub fn symmetry_from_header(header: &MatrixMarketHeader) -> Symmetry {
    if header.is_symmetric() {
        Symmetry::GeneralSymmetric
    } else {
        Symmetry::Unsymmetric
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::generate;
    use crate::matrix::{write_matrix_market, Field, MarketSymmetry};
    use crate::solver::NativeBackend;

    #[test]
    fn test_average_keeps_large_call_counts() {
        let total = Duration::from_secs(6);
        assert_eq!(average(total, 3), Duration::from_secs(2));
        assert_eq!(average(total, 0), total);

        // 2^32 + 2 calls: truncating the count to u32 would divide by 2
        let calls = (u32::MAX as u64 + 3) as usize;
        if calls > u32::MAX as usize {
            assert!(average(total, calls) < Duration::from_micros(1));
        }
    }

    #[test]
    fn test_run_mode_flags() {
        assert_eq!(RunMode::from_flags(0, 10), RunMode::Functional);
        assert_eq!(
            RunMode::from_flags(1, 3),
            RunMode::Performance { iterations: 3 }
        );
        assert_eq!(
            RunMode::from_flags(2, 0),
            RunMode::Performance { iterations: 1 }
        );
    }

    #[test]
    fn test_solve_diagonal_system() {
        let mut backend = NativeBackend::with_threads(1).unwrap();
        let matrix = generate::diagonal(&[1.0, 2.0]);
        let outcome = solve(
            &mut backend,
            Symmetry::Unsymmetric,
            HostRole::Working,
            &ControlParameters::silent(),
            Some((&matrix, [1.0, 4.0].as_slice())),
            RunMode::Functional,
        )
        .unwrap();

        assert!((outcome.solution[0] - 1.0).abs() < 1e-14);
        assert!((outcome.solution[1] - 2.0).abs() < 1e-14);
    }

    #[test]
    fn test_performance_mode_runs_all_calls() {
        let mut backend = NativeBackend::with_threads(2).unwrap();
        let matrix = generate::laplacian_1d(20, true);
        let rhs = matrix.matvec(&vec![1.0; 20], true);
        let outcome = solve(
            &mut backend,
            Symmetry::PositiveDefinite,
            HostRole::Working,
            &ControlParameters::benchmark_defaults(false),
            Some((&matrix, rhs.as_slice())),
            RunMode::Performance { iterations: 2 },
        )
        .unwrap();

        assert!(relative_error(&outcome.solution) < 1e-10);
    }

    #[test]
    fn test_run_benchmark_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lap2d.mtx");
        let header = MatrixMarketHeader {
            field: Field::Real,
            symmetry: MarketSymmetry::Symmetric,
        };
        write_matrix_market(&path, &generate::laplacian_2d(6, true), &header).unwrap();

        let config = BenchConfig {
            backend: BackendKind::Native,
            threads: 2,
            ..BenchConfig::for_matrix(&path)
        };
        let stats = run_benchmark(&config, &Communicator::single())
            .unwrap()
            .unwrap();

        assert_eq!(stats.nrows, 36);
        assert_eq!(stats.symmetry, Symmetry::GeneralSymmetric);
        assert_eq!(stats.mpi_ranks, 1);
        assert!(stats.relative_error < 1e-10);
    }

    #[test]
    fn test_solver_error_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("singular.mtx");
        // Second row and column are empty
        let matrix = CooMatrix::from_triplets(2, 2, vec![1], vec![1], vec![1.0]).unwrap();
        write_matrix_market(&path, &matrix, &MatrixMarketHeader::default()).unwrap();

        let config = BenchConfig {
            backend: BackendKind::Native,
            threads: 1,
            ..BenchConfig::for_matrix(&path)
        };
        let err = run_benchmark(&config, &Communicator::single()).unwrap_err();
        assert_eq!(err.diagnostics().map(|d| d.status()), Some(-10));
    }

    #[test]
    fn test_non_square_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rect.mtx");
        let matrix = CooMatrix::from_triplets(2, 3, vec![1, 2], vec![1, 3], vec![1.0, 1.0]).unwrap();
        write_matrix_market(&path, &matrix, &MatrixMarketHeader::default()).unwrap();

        let config = BenchConfig {
            backend: BackendKind::Native,
            threads: 1,
            ..BenchConfig::for_matrix(&path)
        };
        assert!(matches!(
            run_benchmark(&config, &Communicator::single()),
            Err(BenchError::InvalidArgument(_))
        ));
    }
}
