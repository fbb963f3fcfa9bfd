//! Process-wide tracing setup shared by the binaries.

/// Initialize JSON logging filtered by `RUST_LOG` (default `info`).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init("info");
}

/// Like [`init`], with `default_filter` used when `RUST_LOG` is unset.
pub fn init_with_filter(default_filter: &str) {
    tracing::init(default_filter);
}

/// Subscriber construction (filters, layers).
pub mod tracing;
