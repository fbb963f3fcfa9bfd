//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber: JSON lines with timestamps, to stderr.
///
/// `RUST_LOG` wins over `default_filter`. An unparseable default falls back
/// to `info`. Safe to call multiple times (subsequent calls are no-ops).
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
