//! Smallest possible run: solve diag(1, 2) x = (1, 4)
//!
//! Expected output on the host is `Solution is : (    1.00      2.00)`.

use std::process::ExitCode;

use mumps_bench::cli::{self, DemoArgs};
use mumps_bench::logging::init_logging;
use mumps_bench::matrix::generate;
use mumps_bench::{create_backend, solve, Communicator, ControlParameters, HostRole, Result};
use mumps_bench::{RunMode, Symmetry};

fn main() -> ExitCode {
    let args: DemoArgs = cli::parse_or_exit();
    init_logging(args.verbose);

    cli::exit_code(run(&args))
}

fn run(args: &DemoArgs) -> Result<()> {
    let comm = Communicator::init()?;
    println!("No of Processes = {}, My Rank = {}", comm.size(), comm.rank());

    let mut backend = create_backend(args.backend.unwrap_or_default(), 1)?;
    if !comm.is_host() && !backend.is_distributed() {
        return Ok(());
    }

    let matrix = generate::diagonal(&[1.0, 2.0]);
    let rhs = [1.0, 4.0];
    let problem = comm.is_host().then(|| (&matrix, rhs.as_slice()));

    let outcome = solve(
        backend.as_mut(),
        Symmetry::Unsymmetric,
        HostRole::Working,
        &ControlParameters::silent(),
        problem,
        RunMode::Functional,
    )?;

    if let [x0, x1] = outcome.solution[..] {
        println!("Solution is : ({:8.2}  {:8.2})", x0, x1);
    }
    Ok(())
}
