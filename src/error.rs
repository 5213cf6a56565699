//! Error types for the remote store layer and the store server
//!
//! The in-memory containers never fail; only network-facing code has errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Store Error Enum ==
/// Failure talking to a remote key/value store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Connection, timeout or body transfer failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a status the client does not expect
    #[error("Unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Store URL could not be used to build requests
    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
}

/// Convenience Result type for remote store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// == Api Error Enum ==
/// Error returned by store server handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found or expired
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}
