//! Error types for the protocol layer

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding, validating, or routing envelopes
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The raw bytes do not form a valid envelope
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// The receiver id does not map to a known capability
    #[error("No capability registered for receiver: {0}")]
    UnknownCapability(String),
}

/// User-visible error taxonomy carried in error envelope payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Transport-level connection failure
    ConnectionFailed,
    /// A request expired before a response was produced
    Timeout,
    /// Envelope-level malformation caught before any adapter ran
    InvalidMessage,
    /// No adapter is registered for the receiver's capability
    AgentNotFound,
    /// An adapter or engine rejected the request
    AnalysisFailed,
}

impl ErrorCode {
    /// Wire spelling of the code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectionFailed => "CONNECTION_FAILED",
            Self::Timeout => "TIMEOUT",
            Self::InvalidMessage => "INVALID_MESSAGE",
            Self::AgentNotFound => "AGENT_NOT_FOUND",
            Self::AnalysisFailed => "ANALYSIS_FAILED",
        }
    }

    /// HTTP status used by the stateless request/response binding
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ConnectionFailed => 502,
            Self::Timeout => 504,
            Self::InvalidMessage => 400,
            Self::AgentNotFound => 404,
            Self::AnalysisFailed => 422,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_spelling() {
        assert_eq!(ErrorCode::AgentNotFound.as_str(), "AGENT_NOT_FOUND");
        assert_eq!(ErrorCode::Timeout.to_string(), "TIMEOUT");

        let json = serde_json::to_string(&ErrorCode::InvalidMessage).unwrap();
        assert_eq!(json, "\"INVALID_MESSAGE\"");
        let back: ErrorCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ErrorCode::InvalidMessage);
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(ErrorCode::InvalidMessage.http_status(), 400);
        assert_eq!(ErrorCode::AgentNotFound.http_status(), 404);
        assert_eq!(ErrorCode::AnalysisFailed.http_status(), 422);
        assert_eq!(ErrorCode::ConnectionFailed.http_status(), 502);
        assert_eq!(ErrorCode::Timeout.http_status(), 504);
    }
}
