//! A2A protocol runtime
//!
//! Everything between the wire and the engines: the capability router with
//! its registered adapters, the correlation & expiry manager matching
//! asynchronous responses to pending requests, the bounded worker pool, the
//! outbound client used for analysis chaining, and the WebSocket/HTTP
//! transport bindings.
//!
//! Composition is owned by the caller: construct the providers, the
//! adapters, the pool, and the correlation manager, register the adapters
//! with a [`CapabilityRouter`], and hand the router to a transport. See
//! `examples/loopback.rs` for a complete wiring.

pub mod adapters;
pub mod client;
pub mod correlation;
pub mod error;
pub mod router;
pub mod transport;
pub mod workers;

pub use adapters::{Adapter, InvestmentAdapter, PortfolioAdapter, RiskAdapter, RiskQuery};
pub use client::{A2aClient, LoopbackSink, MessageSink};
pub use correlation::CorrelationManager;
pub use error::{Result, RuntimeError};
pub use router::CapabilityRouter;
pub use workers::WorkerPool;
