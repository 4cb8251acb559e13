//! Error types for watchout-grid.

use thiserror::Error;

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

/// Errors that can occur when building grid positions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// The coordinates fall outside the board.
    #[error("position ({x}, {y}) is outside the {size}x{size} grid")]
    OutOfBounds { x: i64, y: i64, size: u8 },
}
