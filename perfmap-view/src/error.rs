//! Error types for perfmap-view

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::backend_client::BackendError;
use crate::services::rating_submitter::RatingError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., a fetch or submission already in flight
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream dashboard API timed out or was unreachable (504)
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// perfmap-common error
    #[error("Common error: {0}")]
    Common(#[from] perfmap_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::UpstreamTimeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

impl From<BackendError> for ApiError {
    fn from(error: BackendError) -> Self {
        match error {
            BackendError::NotFound(what) => ApiError::NotFound(what),
            // Network failures are treated identically to timeouts: surfaced
            // with a retry suggestion, never retried automatically
            BackendError::Timeout(_) | BackendError::Network(_) => ApiError::UpstreamTimeout(
                format!("The dashboard API did not respond ({}); please retry", error),
            ),
            BackendError::ApiStatus(..) | BackendError::Decode(_) => {
                ApiError::Internal(error.to_string())
            }
        }
    }
}

impl From<RatingError> for ApiError {
    fn from(error: RatingError) -> Self {
        match error {
            RatingError::InvalidRating(_) | RatingError::NoDetail(_) => {
                ApiError::BadRequest(error.to_string())
            }
            RatingError::Busy => ApiError::Conflict(error.to_string()),
            RatingError::Backend(e) => e.into(),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
