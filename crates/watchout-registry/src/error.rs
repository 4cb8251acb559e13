//! Error types for the registry.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur in registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A player with this id is already registered.
    #[error("id {0} is already used by another player")]
    Conflict(u32),

    /// A query parameter is out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Nothing matched the query.
    #[error("not found: {0}")]
    NotFound(String),

    /// No heart-rate report was received yet.
    #[error("there are no heart-rate measurements yet")]
    NoMeasurements,

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RegistryError {
    /// HTTP status reported for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidArgument(_) | Self::NoMeasurements => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_) | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RegistryError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
