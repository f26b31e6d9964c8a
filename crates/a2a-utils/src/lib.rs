//! Shared utilities for the A2A analysis workspace
//!
//! Currently just the tracing bootstrap used by binaries and examples that
//! compose the runtime.

pub mod logging;

pub use logging::{init_tracing, try_init_tracing};
