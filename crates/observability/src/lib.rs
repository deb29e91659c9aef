//! Tracing and logging setup shared by every binary embedding the ledger.

pub mod tracing;

/// Initialize process-wide observability (tracing/logging).
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}
