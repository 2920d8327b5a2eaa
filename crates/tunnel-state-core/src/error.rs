//! Error types for decoding tunnel state notifications and session inputs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TunnelStateError {
    #[error("unknown tunnel state: {0}")]
    UnknownState(String),

    #[error("unknown disconnect reason: {0}")]
    UnknownDisconnectReason(String),

    #[error("unknown expected transition: {0}")]
    UnknownTransition(String),

    #[error("malformed input: {0}")]
    Decode(#[from] serde_json::Error),
}
