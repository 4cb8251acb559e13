//! Error types for the player node.

use thiserror::Error;

/// Result type for player operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running a player.
#[derive(Debug, Error)]
pub enum Error {
    /// Another player already registered with this id.
    #[error("id {0} is already registered")]
    IdConflict(u32),

    /// Registration or telemetry upload failed.
    #[error("registry error: {0}")]
    Registry(String),

    /// A peer could not be reached or answered nonsense.
    #[error("network error: {0}")]
    Network(String),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// The registry assigned a cell outside the board.
    #[error(transparent)]
    Grid(#[from] watchout_grid::GridError),

    /// Wire codec error
    #[error(transparent)]
    Protocol(#[from] watchout_protocols::Error),

    /// A blocking wait was interrupted.
    #[error(transparent)]
    Sync(#[from] watchout_sync::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Registry(e.to_string())
    }
}
