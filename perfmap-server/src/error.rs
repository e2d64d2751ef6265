//! Error types for perfmap-server
//!
//! Every error response carries the same envelope as successful ones:
//! `{"success": false, "message": "..."}`.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use perfmap_common::ApiEnvelope;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("{0}")]
    NotFound(String),

    /// Internal server error (500)
    #[error("Server error: {0}")]
    Internal(String),

    /// Database failure
    #[error("Server error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (poster storage)
    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or oversized multipart body
    #[error("Invalid form data: {0}")]
    Multipart(#[from] MultipartError),
}

impl From<perfmap_common::Error> for ApiError {
    fn from(err: perfmap_common::Error) -> Self {
        use perfmap_common::Error as Common;
        match err {
            Common::InvalidInput(msg) => ApiError::BadRequest(msg),
            Common::NotFound(msg) => ApiError::NotFound(msg),
            Common::Database(e) => ApiError::Database(e),
            Common::Io(e) => ApiError::Io(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Multipart(err) => err.status(),
            ApiError::Internal(_) | ApiError::Database(_) | ApiError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(ApiEnvelope::<()>::failure(self.to_string()));
        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
