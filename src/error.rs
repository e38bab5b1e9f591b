//! Error types for the cache server
//!
//! Provides unified error handling using thiserror. The cache engine itself
//! has no failure modes; these are the transport layer's client errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::debug;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache server.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key is not resident in the cache
    #[error("key not found")]
    NotFound(String),

    /// Query string has no usable `key` parameter
    #[error("missing key")]
    MissingKey,

    /// Request body is not a JSON object with a string `key`, or its
    /// `value` is not syntactically valid JSON
    #[error("invalid JSON")]
    InvalidJson(#[from] serde_json::Error),

    /// Request body parsed but carries no `value` to store
    #[error("Invalid JSON value")]
    InvalidValue,
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(key) => {
                debug!(key = %key, "key not found");
                StatusCode::NOT_FOUND
            }
            CacheError::MissingKey | CacheError::InvalidValue => StatusCode::BAD_REQUEST,
            CacheError::InvalidJson(err) => {
                debug!(error = %err, "rejected request body");
                StatusCode::BAD_REQUEST
            }
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache server.
pub type Result<T> = std::result::Result<T, CacheError>;
