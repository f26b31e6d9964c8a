//! Envelope codec
//!
//! Decoding is strict about the envelope itself (missing required fields,
//! unknown message types, out-of-range priorities all fail with
//! `InvalidMessage`) and lenient about payload contents beyond the schema
//! implied by the receiver capability: unknown payload fields are ignored
//! for forward compatibility. Encoding is the structural inverse, so
//! `decode(encode(e)) == e` for every valid envelope.

use serde_json::Value;

use crate::capability::Capability;
use crate::envelope::{Envelope, MessageType};
use crate::error::{ProtocolError, Result};
use crate::payload::{ErrorPayload, InvestmentRequest, PortfolioRequest, RiskRequest};

/// Serialize an envelope to its JSON wire form
pub fn encode(envelope: &Envelope) -> Result<String> {
    serde_json::to_string(envelope)
        .map_err(|e| ProtocolError::InvalidMessage(format!("encode failed: {e}")))
}

/// Parse and validate raw bytes into an envelope
pub fn decode(raw: &[u8]) -> Result<Envelope> {
    let envelope: Envelope = serde_json::from_slice(raw)
        .map_err(|e| ProtocolError::InvalidMessage(e.to_string()))?;
    validate(&envelope)?;
    Ok(envelope)
}

/// Structural checks beyond what deserialization enforces
pub fn validate(envelope: &Envelope) -> Result<()> {
    if envelope.message_id.trim().is_empty() {
        return Err(ProtocolError::InvalidMessage(
            "message_id must not be empty".to_string(),
        ));
    }
    if envelope.sender_id.trim().is_empty() {
        return Err(ProtocolError::InvalidMessage(
            "sender_id must not be empty".to_string(),
        ));
    }
    if envelope.receiver_id.trim().is_empty() {
        return Err(ProtocolError::InvalidMessage(
            "receiver_id must not be empty".to_string(),
        ));
    }

    match envelope.message_type {
        MessageType::Request if envelope.correlation_id.is_some() => {
            Err(ProtocolError::InvalidMessage(
                "a request must not carry a correlation_id".to_string(),
            ))
        }
        MessageType::Response | MessageType::Error if envelope.correlation_id.is_none() => {
            Err(ProtocolError::InvalidMessage(format!(
                "a {:?} envelope requires a correlation_id",
                envelope.message_type
            )))
        }
        _ => Ok(()),
    }
}

/// Check that a request payload matches the schema implied by the capability
///
/// Runs at the router boundary, before any adapter is invoked.
pub fn validate_request_payload(capability: Capability, payload: &Value) -> Result<()> {
    let outcome = match capability {
        Capability::Investment => {
            serde_json::from_value::<InvestmentRequest>(payload.clone()).map(|_| ())
        }
        Capability::Risk => serde_json::from_value::<RiskRequest>(payload.clone()).map(|_| ()),
        Capability::Portfolio => {
            serde_json::from_value::<PortfolioRequest>(payload.clone()).map(|_| ())
        }
    };
    outcome.map_err(|e| {
        ProtocolError::InvalidMessage(format!("payload does not match {capability} schema: {e}"))
    })
}

/// Parse an error payload out of an error envelope
pub fn decode_error_payload(envelope: &Envelope) -> Result<ErrorPayload> {
    serde_json::from_value(envelope.payload.clone())
        .map_err(|e| ProtocolError::InvalidMessage(format!("malformed error payload: {e}")))
}
