//! Logging setup for the binaries.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies. Calling this
/// twice is harmless, the second call is ignored.
pub fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
