//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialize tracing for the process: JSON lines, timestamps, level filter
/// from `RUST_LOG` (default `info`).
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    init_with_default_filter("info");
}

/// Same, with an explicit fallback filter for when `RUST_LOG` is unset.
pub fn init_with_default_filter(default: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
