//! `mumps_bench --mtx PATH [--perf_mode N] [--iter N] [options]`
//!
//! Reads a Matrix Market file, runs analysis, factorization and solve, and
//! prints the statistics table on the host rank.

use std::process::ExitCode;

use mumps_bench::cli::{self, BenchArgs};
use mumps_bench::logging::init_logging;

fn main() -> ExitCode {
    let args: BenchArgs = cli::parse_or_exit();
    init_logging(args.verbose);

    let config = args.to_config();
    cli::exit_code(cli::run(&config))
}
