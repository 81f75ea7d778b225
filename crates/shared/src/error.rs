//! Error types for Kuwetex

use crate::protocol::MessageKind;
use thiserror::Error;

/// A peer broke the request/response protocol
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    #[error("Unknown message header {0}")]
    UnknownHeader(u8),

    #[error("Expected a '{expected}' response, got header {received}")]
    MismatchedResponse { expected: MessageKind, received: u8 },

    #[error("'{0}' sent before logging in")]
    NotLoggedIn(MessageKind),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Frame exceeds {limit} bytes")]
    FrameTooLarge { limit: usize },
}

/// General Kuwetex error type
#[derive(Debug, Error)]
pub enum KuwetexError {
    #[error(transparent)]
    Protocol(#[from] ProtocolViolation),

    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Interrupted: {0}")]
    Interrupted(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl KuwetexError {
    /// True when a cancellable wait was cut short by shutdown
    pub fn is_interrupted(&self) -> bool {
        matches!(self, KuwetexError::Interrupted(_))
    }
}

pub type Result<T> = std::result::Result<T, KuwetexError>;
