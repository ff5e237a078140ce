//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.
//!
//! Misses, expiry and capacity eviction are never errors: only the storage
//! layer (and request validation at the HTTP boundary) produce a `CacheError`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The underlying table operation failed
    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),

    /// Key not found (or expired); only raised by the HTTP layer
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
