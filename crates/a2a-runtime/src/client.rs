//! Outbound A2A client
//!
//! Used when this core itself issues requests — e.g. chaining a risk
//! analysis from a comprehensive investment request. Every outbound request
//! is registered with the correlation manager before it is handed to the
//! sink, so the response, error, or sweeper-synthesized timeout arrives
//! through the same single-resolution path external traffic uses.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use a2a_analysis::error::AnalysisError;
use a2a_core::payload::{RiskRequest, RiskResponse, Severity};
use a2a_core::{Capability, Envelope, MessageType, Priority};

use crate::adapters::RiskQuery;
use crate::correlation::CorrelationManager;
use crate::error::{Result, RuntimeError};
use crate::router::CapabilityRouter;

/// Where outbound envelopes go: a connected transport or an in-process
/// loopback
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Hand one envelope to the peer
    async fn send(&self, envelope: Envelope) -> Result<()>;
}

/// Outbound request issuer with correlation-backed response matching
pub struct A2aClient {
    agent_id: String,
    sink: Arc<dyn MessageSink>,
    correlation: Arc<CorrelationManager>,
    default_ttl: chrono::Duration,
}

impl A2aClient {
    /// Create a client sending as `agent_id` through `sink`
    pub fn new(
        agent_id: impl Into<String>,
        sink: Arc<dyn MessageSink>,
        correlation: Arc<CorrelationManager>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            sink,
            correlation,
            default_ttl: chrono::Duration::seconds(30),
        }
    }

    /// Override the deadline applied to outbound requests
    pub fn with_default_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Issue a request and await its correlated resolution
    ///
    /// The returned envelope is the peer's response, the peer's error, or
    /// the sweeper's synthetic `TIMEOUT` error — whichever arrives first.
    pub async fn request(
        &self,
        receiver_id: impl Into<String>,
        payload: serde_json::Value,
        priority: Priority,
    ) -> Result<Envelope> {
        let envelope = Envelope::request(
            self.agent_id.clone(),
            receiver_id,
            payload,
            priority,
            self.default_ttl,
        );
        debug!(
            message_id = %envelope.message_id,
            receiver = %envelope.receiver_id,
            "issuing outbound request"
        );

        // Register before sending so a fast response cannot race the table.
        let rx = self.correlation.register(&envelope);
        self.sink.send(envelope).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

#[async_trait]
impl RiskQuery for A2aClient {
    async fn query_risk(&self, ticker: &str) -> a2a_analysis::Result<RiskResponse> {
        let request = RiskRequest {
            ticker: ticker.to_string(),
            event_sources: vec!["news".to_string(), "filings".to_string()],
            time_horizon: "1d".to_string(),
            severity_threshold: Severity::Low,
        };
        let payload = serde_json::to_value(&request)
            .map_err(|e| AnalysisError::Other(format!("risk request serialization: {e}")))?;

        let reply = self
            .request(
                Capability::Risk.default_agent_id(),
                payload,
                Priority::High,
            )
            .await
            .map_err(|e| AnalysisError::Provider(e.to_string()))?;

        match reply.message_type {
            MessageType::Response => serde_json::from_value(reply.payload)
                .map_err(|e| AnalysisError::Provider(format!("malformed risk response: {e}"))),
            _ => {
                let message = a2a_core::codec::decode_error_payload(&reply)
                    .map(|p| p.error_message)
                    .unwrap_or_else(|_| "risk analysis failed".to_string());
                Err(AnalysisError::Provider(message))
            }
        }
    }
}

/// In-process sink dispatching straight into a router
///
/// Replies the router produces are fed back through `dispatch`, which
/// resolves them against the shared correlation manager — the same shape a
/// networked peer would have, minus the socket.
pub struct LoopbackSink {
    router: Arc<CapabilityRouter>,
}

impl LoopbackSink {
    pub fn new(router: Arc<CapabilityRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl MessageSink for LoopbackSink {
    async fn send(&self, envelope: Envelope) -> Result<()> {
        let router = self.router.clone();
        tokio::spawn(async move {
            if let Some(reply) = router.dispatch(envelope).await {
                router.dispatch(reply).await;
            }
        });
        Ok(())
    }
}
