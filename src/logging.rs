//! Logging configuration for cmdgate.
//!
//! Logs go to stderr so replies printed on stdout stay machine-readable.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Builds the filter from `RUST_LOG`, falling back to `default`.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initializes logging to stderr.
///
/// `quiet` lowers the fallback level to warnings, for scripted runs.
pub fn init_stderr_logging(quiet: bool) {
    let default = if quiet { "warn" } else { DEFAULT_FILTER };
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default))
        .with_writer(std::io::stderr)
        .init();
}
