//! Error types for the offline cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the offline cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Named cache store does not exist
    #[error("Cache store not found: {0}")]
    StoreNotFound(String),

    /// Underlying storage failed (open, read, write, enumerate, delete)
    #[error("Storage failure: {0}")]
    Storage(String),

    /// URL could not be parsed or resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Lifecycle transition not allowed from the current phase
    #[error("Invalid lifecycle transition: {0}")]
    InvalidTransition(String),

    /// Upstream could not be reached on a pass-through request
    #[error("Upstream unreachable: {0}")]
    Upstream(String),

    /// Worker event loop is gone or dropped a completion token
    #[error("Worker unavailable: {0}")]
    WorkerUnavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::StoreNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidUrl(_) | CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::InvalidTransition(_) => StatusCode::CONFLICT,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::WorkerUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Storage(_) | CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the offline cache.
pub type Result<T> = std::result::Result<T, CacheError>;
