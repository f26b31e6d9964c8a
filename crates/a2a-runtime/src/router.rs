//! Capability router
//!
//! Owns the closed set of registered adapters and turns every decoded
//! inbound envelope into at most one outbound envelope. Heartbeats are
//! answered inline ahead of any queued work; requests run under the worker
//! pool with a deadline at the envelope's `expires_at`; inbound responses
//! and errors feed the correlation manager and produce no reply.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use a2a_core::{Capability, Envelope, ErrorCode, MessageType, codec};

use crate::adapters::Adapter;
use crate::correlation::CorrelationManager;
use crate::workers::WorkerPool;

/// Routes envelopes to the adapter serving their capability
pub struct CapabilityRouter {
    adapters: DashMap<Capability, Arc<dyn Adapter>>,
    /// Peers that announced themselves via registration envelopes
    registrations: DashMap<String, Value>,
    correlation: Arc<CorrelationManager>,
    workers: Arc<WorkerPool>,
}

impl CapabilityRouter {
    /// Create a router over the shared correlation manager and worker pool
    pub fn new(correlation: Arc<CorrelationManager>, workers: Arc<WorkerPool>) -> Self {
        Self {
            adapters: DashMap::new(),
            registrations: DashMap::new(),
            correlation,
            workers,
        }
    }

    /// Register an adapter for its capability
    ///
    /// Called once per capability at startup; a later registration for the
    /// same capability replaces the earlier one. Shared references suffice
    /// so adapters that chain through the router (comprehensive investment
    /// analysis) can be registered after the router is wrapped in an `Arc`.
    pub fn register(&self, adapter: Arc<dyn Adapter>) {
        let capability = adapter.capability();
        info!(capability = %capability, "adapter registered");
        self.adapters.insert(capability, adapter);
    }

    /// The correlation manager this router resolves responses into
    pub fn correlation(&self) -> &Arc<CorrelationManager> {
        &self.correlation
    }

    /// Capabilities a peer announced, if it registered
    pub fn peer_capabilities(&self, sender_id: &str) -> Option<Value> {
        self.registrations.get(sender_id).map(|e| e.value().clone())
    }

    /// Process one inbound envelope, returning the reply to send, if any
    ///
    /// Responses and errors resolve pending requests and yield no reply;
    /// everything else yields exactly one envelope.
    pub async fn dispatch(&self, envelope: Envelope) -> Option<Envelope> {
        if let Err(e) = codec::validate(&envelope) {
            warn!(message_id = %envelope.message_id, error = %e, "invalid envelope");
            return Some(Envelope::error_to(
                &envelope,
                ErrorCode::InvalidMessage,
                e.to_string(),
            ));
        }

        match envelope.message_type {
            // Heartbeats bypass adapter dispatch and the worker pool.
            MessageType::Heartbeat => Some(Envelope::heartbeat_reply(&envelope)),

            MessageType::Registration => {
                debug!(sender = %envelope.sender_id, "peer registration recorded");
                self.registrations
                    .insert(envelope.sender_id.clone(), envelope.payload.clone());
                Some(Envelope::response_to(
                    &envelope,
                    json!({ "status": "registered" }),
                ))
            }

            MessageType::Response | MessageType::Error => {
                self.correlation.resolve(envelope);
                None
            }

            MessageType::Request => Some(self.handle_request(envelope).await),
        }
    }

    async fn handle_request(&self, envelope: Envelope) -> Envelope {
        let Some(capability) = Capability::from_receiver_id(&envelope.receiver_id) else {
            warn!(receiver = %envelope.receiver_id, "no capability for receiver");
            return Envelope::error_to(
                &envelope,
                ErrorCode::AgentNotFound,
                format!("no agent registered for receiver {}", envelope.receiver_id),
            );
        };
        // Clone the Arc out so no map guard is held across the await below.
        let Some(adapter) = self.adapters.get(&capability).map(|a| a.value().clone()) else {
            warn!(capability = %capability, "capability has no registered adapter");
            return Envelope::error_to(
                &envelope,
                ErrorCode::AgentNotFound,
                format!("no adapter registered for capability {capability}"),
            );
        };

        let now = Utc::now();
        if envelope.is_expired(now) {
            return Envelope::error_to(
                &envelope,
                ErrorCode::Timeout,
                "request expired before processing began",
            );
        }

        // Schema mismatch is caught here, before the adapter runs.
        if let Err(e) = codec::validate_request_payload(capability, &envelope.payload) {
            return Envelope::error_to(&envelope, ErrorCode::InvalidMessage, e.to_string());
        }

        let _permit = self.workers.acquire(envelope.priority).await;
        debug!(
            message_id = %envelope.message_id,
            capability = %capability,
            priority = ?envelope.priority,
            "request dispatched to adapter"
        );

        let outcome = match envelope.time_remaining(Utc::now()) {
            Some(remaining) => {
                let budget = remaining
                    .to_std()
                    .unwrap_or(std::time::Duration::from_millis(1));
                match tokio::time::timeout(budget, adapter.handle(&envelope.payload)).await {
                    Ok(result) => result,
                    Err(_) => {
                        // The in-flight computation is dropped with the future.
                        warn!(message_id = %envelope.message_id, "adapter ran past the request deadline");
                        return Envelope::error_to(
                            &envelope,
                            ErrorCode::Timeout,
                            "analysis did not complete before the request deadline",
                        );
                    }
                }
            }
            None if envelope.expires_at.is_some() => {
                return Envelope::error_to(
                    &envelope,
                    ErrorCode::Timeout,
                    "request expired before processing began",
                );
            }
            None => adapter.handle(&envelope.payload).await,
        };

        match outcome {
            Ok(payload) => Envelope::response_to(&envelope, payload),
            Err(e) => {
                warn!(
                    message_id = %envelope.message_id,
                    capability = %capability,
                    error = %e,
                    "adapter failed"
                );
                Envelope::error_to(&envelope, ErrorCode::AnalysisFailed, e.to_string())
            }
        }
    }
}
