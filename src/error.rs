//! Error types for the cache service
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
/// Unified error type for the cache service.
///
/// A rejected guarded write is not an error (it is a `false` return), and a
/// failed fetch is absorbed as an unavailable value. Everything here is a
/// real fault: the store broke, a stored value cannot be decoded under the
/// requested codec, or a request was bad.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Store environment or transaction failure
    #[error("Store error: {0}")]
    Store(#[from] heed::Error),

    /// Filesystem failure while opening the store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored value cannot be decoded under the requested codec
    #[error("Decode error: {0}")]
    Decode(String),

    /// No decoder registered for the requested message type
    #[error("No codec registered for type: {0}")]
    TypeNotSupported(&'static str),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested resource does not exist or is not allowed
    #[error("Not found: {0}")]
    NotFound(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            CacheError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            CacheError::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            CacheError::Decode(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            CacheError::TypeNotSupported(name) => {
                (StatusCode::INTERNAL_SERVER_ERROR, name.to_string())
            }
            CacheError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            CacheError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache service.
pub type Result<T> = std::result::Result<T, CacheError>;
