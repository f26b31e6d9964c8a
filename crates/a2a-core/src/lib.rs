//! Core types for the A2A financial analysis protocol
//!
//! This crate defines the wire format shared by every agent speaking the
//! protocol: the message envelope, the closed set of capabilities, the
//! capability-specific payload schemas, and the codec that validates raw
//! bytes into envelopes.

pub mod capability;
pub mod codec;
pub mod envelope;
pub mod error;
pub mod payload;

pub use capability::Capability;
pub use envelope::{Envelope, MessageType, Priority};
pub use error::{ErrorCode, ProtocolError, Result};
