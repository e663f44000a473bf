//! Error types for the query cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache engine, the query orchestrator and the API.
///
/// Variants only carry owned strings so a failure can be stored in query state
/// and handed to observers by value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The fetch itself failed (connection refused, timeout, bad URL)
    #[error("Network failure: {0}")]
    Network(String),

    /// The upstream answered with a non-success status
    #[error("Upstream returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// The upstream body was not JSON or not shaped as `{ "data": ... }`
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A persisted collection could not be read or decoded
    #[error("Failed to read collection '{collection}': {reason}")]
    StoreRead { collection: String, reason: String },

    /// The persistent store rejected a write
    #[error("Failed to write collection '{collection}': {reason}")]
    StoreWrite { collection: String, reason: String },

    /// refetch/invalidate was called before any query
    #[error("No request has been issued yet")]
    NoPriorRequest,

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheError {
    pub(crate) fn store_read(collection: &str, reason: impl ToString) -> Self {
        CacheError::StoreRead {
            collection: collection.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn store_write(collection: &str, reason: impl ToString) -> Self {
        CacheError::StoreWrite {
            collection: collection.to_string(),
            reason: reason.to_string(),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Network(_)
            | CacheError::HttpStatus { .. }
            | CacheError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            CacheError::StoreRead { .. } | CacheError::StoreWrite { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            CacheError::NoPriorRequest => StatusCode::CONFLICT,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the query cache.
pub type Result<T> = std::result::Result<T, CacheError>;
