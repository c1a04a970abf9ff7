//! `amd_mumps <mtx> <symmetry> <perf_mode> <iterations>`
//!
//! Positional form of the benchmark. The first line of the file is not
//! validated and the report is the fixed-width table.

use std::process::ExitCode;

use mumps_bench::cli::{self, PositionalArgs};
use mumps_bench::logging::init_logging;

fn main() -> ExitCode {
    let args: PositionalArgs = cli::parse_or_exit();
    init_logging(args.verbose);

    cli::exit_code(cli::run(&args.to_config()))
}
