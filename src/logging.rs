//! Logging bootstrap for the embedding backend
//!
//! The library itself only emits `tracing` events; the host process decides
//! where they go. This helper wires up the common case: a formatted
//! subscriber filtered by `RUST_LOG`, defaulting to `info`.

use tracing_subscriber::EnvFilter;

/// Install the default subscriber. Safe to call more than once; only the
/// first call takes effect.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
