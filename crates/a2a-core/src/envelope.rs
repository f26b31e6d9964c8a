//! A2A message envelope
//!
//! The envelope is the unit of wire communication: routing and correlation
//! metadata around a capability-specific payload. An envelope transits
//! exactly one hop and is discarded once its response is delivered or it
//! expires; the only envelope state the core holds is the pending-request
//! table in the correlation manager.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ErrorCode;
use crate::payload::ErrorPayload;

/// A2A message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Error,
    Heartbeat,
    Registration,
}

/// Message priority, carried as an integer on the wire (low=1 .. critical=4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Priority {
    Low = 1,
    Normal = 2,
    High = 3,
    Critical = 4,
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> Self {
        priority as u8
    }
}

impl TryFrom<u8> for Priority {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Low),
            2 => Ok(Self::Normal),
            3 => Ok(Self::High),
            4 => Ok(Self::Critical),
            other => Err(format!("priority out of range 1..=4: {other}")),
        }
    }
}

/// The wire message carrying routing/correlation metadata plus a payload
///
/// Invariant: a request never carries a `correlation_id`; every
/// response/error carries the originating request's `message_id` there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Globally unique, caller-generated id
    pub message_id: String,
    pub sender_id: String,
    /// Identifies the target adapter/capability
    pub receiver_id: String,
    pub message_type: MessageType,
    pub priority: Priority,
    /// Creation instant
    pub timestamp: DateTime<Utc>,
    /// Shape depends on `message_type` and the receiver capability
    pub payload: Value,
    /// On a response/error: the originating request's `message_id`
    #[serde(default)]
    pub correlation_id: Option<String>,
    /// Instant after which the request is void
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Generate a fresh message id
pub fn new_message_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl Envelope {
    /// Build a request envelope expiring `ttl` from now
    pub fn request(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        payload: Value,
        priority: Priority,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            message_id: new_message_id(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            message_type: MessageType::Request,
            priority,
            timestamp: now,
            payload,
            correlation_id: None,
            expires_at: Some(now + ttl),
        }
    }

    /// Build the response to `original`, correlated to its message id
    ///
    /// Sender/receiver are the original's swapped; priority is inherited.
    pub fn response_to(original: &Envelope, payload: Value) -> Self {
        Self {
            message_id: new_message_id(),
            sender_id: original.receiver_id.clone(),
            receiver_id: original.sender_id.clone(),
            message_type: MessageType::Response,
            priority: original.priority,
            timestamp: Utc::now(),
            payload,
            correlation_id: Some(original.message_id.clone()),
            expires_at: None,
        }
    }

    /// Build an error response to `original`
    ///
    /// The payload always carries the error code, a descriptive message, and
    /// the offending request payload for caller debugging.
    pub fn error_to(original: &Envelope, code: ErrorCode, message: impl Into<String>) -> Self {
        let payload = ErrorPayload {
            error_code: code,
            error_message: message.into(),
            original_request: original.payload.clone(),
        };
        Self {
            message_id: new_message_id(),
            sender_id: original.receiver_id.clone(),
            receiver_id: original.sender_id.clone(),
            message_type: MessageType::Error,
            priority: Priority::High,
            timestamp: Utc::now(),
            payload: serde_json::to_value(payload).unwrap_or(Value::Null),
            correlation_id: Some(original.message_id.clone()),
            expires_at: None,
        }
    }

    /// Build a heartbeat probe
    pub fn heartbeat(sender_id: impl Into<String>, receiver_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            message_id: new_message_id(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            message_type: MessageType::Heartbeat,
            priority: Priority::Normal,
            timestamp: now,
            payload: json!({ "timestamp": now.to_rfc3339() }),
            correlation_id: None,
            expires_at: None,
        }
    }

    /// Answer a heartbeat probe, with sender/receiver swapped
    pub fn heartbeat_reply(probe: &Envelope) -> Self {
        let now = Utc::now();
        Self {
            message_id: new_message_id(),
            sender_id: probe.receiver_id.clone(),
            receiver_id: probe.sender_id.clone(),
            message_type: MessageType::Heartbeat,
            priority: probe.priority,
            timestamp: now,
            payload: json!({ "timestamp": now.to_rfc3339() }),
            correlation_id: Some(probe.message_id.clone()),
            expires_at: None,
        }
    }

    /// Build a registration announcement carrying the sender's capabilities
    pub fn registration(
        sender_id: impl Into<String>,
        receiver_id: impl Into<String>,
        capabilities: Value,
    ) -> Self {
        Self {
            message_id: new_message_id(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            message_type: MessageType::Registration,
            priority: Priority::Normal,
            timestamp: Utc::now(),
            payload: capabilities,
            correlation_id: None,
            expires_at: None,
        }
    }

    /// Whether the envelope's deadline has passed at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|deadline| deadline <= now)
    }

    /// Deadline remaining at `now`, if any
    pub fn time_remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.expires_at
            .map(|deadline| deadline - now)
            .filter(|remaining| *remaining > Duration::zero())
    }
}
