//! Log setup shared by the drivers
//!
//! Logs go to stderr so the statistics on stdout stay machine readable.
//! `RUST_LOG` takes precedence over the verbosity flag.

use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber
///
/// `verbosity` counts `-v` flags: 0 shows warnings, 1 info, 2 debug and
/// anything above that trace. Calling this twice is harmless.
pub fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
