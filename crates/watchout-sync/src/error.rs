//! Error types for watchout-sync.

use thiserror::Error;

/// Result type for watchout-sync operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while waiting on a synchronization point.
#[derive(Debug, Error)]
pub enum Error {
    /// The source of the wake-up went away while a waiter was blocked.
    #[error("wait on {0} was interrupted")]
    Interrupted(&'static str),
}
