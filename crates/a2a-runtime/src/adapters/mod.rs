//! Capability adapters
//!
//! One adapter per capability, each behind the same narrow interface:
//! validate the typed payload, invoke the engine, wrap the result. The
//! router owns the closed set of registered adapters; engine errors never
//! escape an adapter as anything but an `AnalysisError`, which the router
//! converts to an `ANALYSIS_FAILED` envelope.

mod investment;
mod portfolio;
mod risk;

pub use investment::InvestmentAdapter;
pub use portfolio::PortfolioAdapter;
pub use risk::RiskAdapter;

use async_trait::async_trait;
use serde_json::Value;

use a2a_analysis::Result;
use a2a_core::Capability;
use a2a_core::payload::RiskResponse;

/// The single interface every capability adapter implements
#[async_trait]
pub trait Adapter: Send + Sync {
    /// The capability this adapter serves
    fn capability(&self) -> Capability;

    /// Validate the request payload, run the engine, return the response
    /// payload
    async fn handle(&self, payload: &Value) -> Result<Value>;
}

/// Seam through which the investment adapter chains a risk analysis
///
/// Implemented by the outbound A2A client; injected so comprehensive
/// analyses exercise the same correlation path external callers use.
#[async_trait]
pub trait RiskQuery: Send + Sync {
    /// Request an event-risk assessment for a ticker
    async fn query_risk(&self, ticker: &str) -> Result<RiskResponse>;
}
