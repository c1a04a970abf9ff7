//! `amd_mumps_basic <mtx>`
//!
//! Solves a symmetric positive definite system once and prints the `$$$`
//! summary followed by a CSV line.

use std::process::ExitCode;

use mumps_bench::cli::{self, BasicArgs};
use mumps_bench::logging::init_logging;

fn main() -> ExitCode {
    let args: BasicArgs = cli::parse_or_exit();
    init_logging(args.verbose);

    cli::exit_code(cli::run(&args.to_config()))
}
