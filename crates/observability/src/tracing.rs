//! Tracing/logging initialization.
//!
//! The engine crates only emit `tracing` events; hosts decide where they
//! go. This module gives embedding binaries and tests a ready-made
//! subscriber so replay skips and shortfall warnings land somewhere.

use tracing_subscriber::EnvFilter;

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // JSON logs + timestamps, configurable via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}

/// Initialize with an explicit filter, ignoring `RUST_LOG`.
///
/// Handy in tests that want replay diagnostics at `debug` without touching
/// the environment. Also a no-op once a subscriber is installed.
pub fn init_with_filter(directives: &str) {
    let filter = EnvFilter::new(directives);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
