//! Logging and tracing utilities

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the tracing subscriber
///
/// Honors `RUST_LOG`; defaults to `info` when unset. Panics if a global
/// subscriber is already installed; use [`try_init_tracing`] where that is
/// not certain.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Initialize the tracing subscriber if none is installed yet
///
/// Returns whether this call installed it. Safe to call repeatedly, e.g.
/// from tests and examples.
pub fn try_init_tracing() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}
