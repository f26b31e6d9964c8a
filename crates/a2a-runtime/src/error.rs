//! Error types for the protocol runtime

use thiserror::Error;

/// Result type alias for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors raised by transports and the outbound client
///
/// Adapter/engine failures never appear here: they are converted to error
/// envelopes (`ANALYSIS_FAILED` et al.) at the router boundary instead.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Transport-level failure sending or accepting messages
    #[error("Connection failed: {0}")]
    Connection(String),

    /// The pending-request channel closed before any resolution arrived
    #[error("correlation channel closed before a response arrived")]
    ChannelClosed,

    /// Envelope-level failure
    #[error(transparent)]
    Protocol(#[from] a2a_core::ProtocolError),
}
