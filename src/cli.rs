//! Command-line interfaces of the drivers
//!
//! Argument errors exit with status 1 like every other failure; `--help`
//! and `--version` exit with 0.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{ArgAction, Parser};

use crate::bench::{run_benchmark, BenchConfig, OutputFormat, RunMode};
use crate::constants::DEFAULT_HOT_CALLS;
use crate::error::{BenchError, Result};
use crate::matrix::HeaderPolicy;
use crate::runtime::{detect_thread_count, Communicator};
use crate::solver::control::{self, ControlOverride};
use crate::solver::{BackendKind, ControlParameters, Symmetry};

/// `mumps_bench --mtx PATH [options]`
#[derive(Parser, Debug, Clone)]
#[command(
    name = "mumps_bench",
    version,
    about = "Time the analysis, factorization and solve phases of a sparse direct solver on a Matrix Market file"
)]
pub struct BenchArgs {
    /// Input matrix in Matrix Market coordinate format
    #[arg(long = "mtx", value_name = "PATH")]
    pub mtx: PathBuf,

    /// 0 runs one functional pass; anything else adds warm-up and timed hot calls
    #[arg(long = "perf_mode", value_name = "N", default_value_t = 0)]
    pub perf_mode: u32,

    /// Number of hot calls per phase in performance mode
    #[arg(long = "iter", value_name = "N", default_value_t = DEFAULT_HOT_CALLS)]
    pub iter: usize,

    /// Solver symmetry: 0/unsymmetric, 1/spd, 2/symmetric (default: from the banner)
    #[arg(long = "sym", value_name = "S")]
    pub sym: Option<Symmetry>,

    /// Solver backend: native or mumps
    #[arg(long, value_name = "B", env = "MUMPS_BENCH_BACKEND")]
    pub backend: Option<BackendKind>,

    /// Report layout: table, table-sci, csv or summary
    #[arg(long, value_name = "F", default_value = "table")]
    pub format: OutputFormat,

    /// ICNTL override, repeatable
    #[arg(long = "icntl", value_name = "I=V")]
    pub icntl: Vec<ControlOverride>,

    /// Threads per rank (also sets ICNTL(16))
    #[arg(long, value_name = "T")]
    pub threads: Option<usize>,

    /// More logging; also keeps the solver's own output streams
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl BenchArgs {
    pub fn to_config(&self) -> BenchConfig {
        let mut params = ControlParameters::benchmark_defaults(self.verbose > 0);
        if let Some(threads) = self.threads {
            params.set(control::THREADS, threads.min(i32::MAX as usize) as i32);
        }
        params.apply(&self.icntl);

        BenchConfig {
            matrix_path: self.mtx.clone(),
            symmetry: self.sym,
            mode: RunMode::from_flags(self.perf_mode, self.iter),
            backend: self.backend.unwrap_or_default(),
            format: self.format,
            control: params,
            header_policy: HeaderPolicy::Strict,
            threads: self.threads.unwrap_or_else(detect_thread_count),
            ..BenchConfig::default()
        }
    }
}

/// `amd_mumps <mtx> <symmetry> <perf_mode> <iterations>`
#[derive(Parser, Debug, Clone)]
#[command(
    name = "amd_mumps",
    version,
    about = "Benchmark a Matrix Market file with positional arguments"
)]
pub struct PositionalArgs {
    /// Input matrix in Matrix Market format
    pub mtx: PathBuf,

    /// 0: unsymmetric, 1: SPD, 2: general symmetric
    pub symmetry: Symmetry,

    /// 0 for functional tests, anything else for performance runs
    pub perf_mode: u32,

    /// Number of hot calls in performance runs
    pub iterations: usize,

    /// Solver backend: native or mumps
    #[arg(long, value_name = "B", env = "MUMPS_BENCH_BACKEND")]
    pub backend: Option<BackendKind>,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl PositionalArgs {
    pub fn to_config(&self) -> BenchConfig {
        BenchConfig {
            matrix_path: self.mtx.clone(),
            symmetry: Some(self.symmetry),
            mode: RunMode::from_flags(self.perf_mode, self.iterations),
            backend: self.backend.unwrap_or_default(),
            format: OutputFormat::Table,
            control: ControlParameters::benchmark_defaults(self.verbose > 0),
            header_policy: HeaderPolicy::Lenient,
            ..BenchConfig::default()
        }
    }
}

/// `amd_mumps_basic <mtx>`: one SPD pass with a summary report
#[derive(Parser, Debug, Clone)]
#[command(
    name = "amd_mumps_basic",
    version,
    about = "Solve a symmetric positive definite Matrix Market file once and print a summary"
)]
pub struct BasicArgs {
    /// Input matrix in Matrix Market format
    pub mtx: PathBuf,

    /// Solver backend: native or mumps
    #[arg(long, value_name = "B", env = "MUMPS_BENCH_BACKEND")]
    pub backend: Option<BackendKind>,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl BasicArgs {
    pub fn to_config(&self) -> BenchConfig {
        BenchConfig {
            matrix_path: self.mtx.clone(),
            symmetry: Some(Symmetry::PositiveDefinite),
            mode: RunMode::Functional,
            backend: self.backend.unwrap_or_default(),
            format: OutputFormat::Summary,
            control: ControlParameters::benchmark_defaults(self.verbose > 0),
            header_policy: HeaderPolicy::Lenient,
            ..BenchConfig::default()
        }
    }
}

/// `simple`: the 2x2 demo
#[derive(Parser, Debug, Clone)]
#[command(name = "simple", version, about = "Solve diag(1, 2) x = (1, 4)")]
pub struct DemoArgs {
    /// Solver backend: native or mumps
    #[arg(long, value_name = "B", env = "MUMPS_BENCH_BACKEND")]
    pub backend: Option<BackendKind>,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Parses the process arguments, exiting with status 1 on bad input
pub fn parse_or_exit<T: Parser>() -> T {
    parse_from_or_exit(std::env::args_os())
}

/// Like [`parse_or_exit`] for an explicit argument list
pub fn parse_from_or_exit<T, I, S>(args: I) -> T
where
    T: Parser,
    I: IntoIterator<Item = S>,
    S: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(parsed) => parsed,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
            _ => {
                let _ = err.print();
                std::process::exit(1);
            }
        },
    }
}

/// Runs a benchmark and prints the report on the host rank
pub fn run(config: &BenchConfig) -> Result<()> {
    let comm = Communicator::init()?;
    if let Some(stats) = run_benchmark(config, &comm)? {
        print!("{}", stats.render(config.format));
    }
    Ok(())
}

/// Reports `err` the way the drivers always have
///
/// Solver failures print INFOG(1..=3) on stdout; everything else goes to
/// stderr.
pub fn report_error(err: &BenchError) {
    tracing::error!(%err);
    match err.diagnostics() {
        Some(diag) => {
            println!("Error Return in Test application, INFOG(1) = {}", diag.infog[0]);
            println!("Error Return in Test application, INFOG(2) = {}", diag.infog[1]);
            println!("INFOG(3) = {}", diag.infog[2]);
        }
        None => eprintln!("Error: {}", err),
    }
}

/// Maps a driver result to the process exit status
pub fn exit_code(result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::from(1)
        }
    }
}
