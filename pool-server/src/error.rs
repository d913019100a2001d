//! Error types for the chatpool server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pool_types::ErrorBody;

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// API-level errors, mapped to HTTP responses with an `{"error": ...}`
/// body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 401 - missing/invalid credentials or unknown org.
    #[error("{0}")]
    Unauthorized(String),

    /// 400 - malformed request field. Rejected at the boundary, no
    /// partial effect.
    #[error("{0}")]
    BadRequest(String),

    /// 409 - slug already registered.
    #[error("Organization slug already taken")]
    SlugTaken,

    /// 404 - no such resource.
    #[error("Not found")]
    NotFound,

    /// 500 - storage failure. The client sees a generic message; the
    /// detail goes to the log.
    #[error("internal error")]
    Internal(#[from] StorageError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SlugTaken => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            tracing::error!(error = %err, "request failed");
        }
        let body = match &self {
            ApiError::Internal(_) => ErrorBody::new("internal error"),
            other => ErrorBody::new(other.to_string()),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
