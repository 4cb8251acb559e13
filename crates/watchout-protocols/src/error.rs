//! Error types for watchout-protocols.

use thiserror::Error;

/// Result type for watchout-protocols operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during protocol operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),

    /// Message validation failed.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A wait inside the protocol was interrupted.
    #[error(transparent)]
    Sync(#[from] watchout_sync::Error),
}
