//! Error types for playsync.

use thiserror::Error;

/// Errors that can occur while encoding or decoding playsync messages.
#[derive(Debug, Error)]
pub enum SyncError {
    /// MessagePack serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] rmp_serde::encode::Error),

    /// MessagePack deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] rmp_serde::decode::Error),

    /// JSON encoding or decoding failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown message type identifier
    #[error("invalid message type: {0}")]
    InvalidMessageType(String),

    /// Message payload does not match its type
    #[error("invalid data: {0}")]
    InvalidData(String),
}
