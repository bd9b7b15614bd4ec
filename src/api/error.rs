//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::backend::client::{is_not_found, BackendError};
use crate::compare::CompareError;
use crate::db::DatabaseError;
use crate::marking::MarkError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),
    #[error("Decode failure: {0}")]
    DecodeFailure(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Image backend error: {0}")]
    BadGateway(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::DimensionMismatch(detail) => {
                (StatusCode::BAD_REQUEST, "DIMENSION_MISMATCH", detail)
            }
            ApiError::DecodeFailure(detail) => (StatusCode::BAD_REQUEST, "DECODE_FAILED", detail),
            ApiError::UnsupportedMedia(detail) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA",
                detail,
            ),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::BadGateway(detail) => {
                tracing::warn!(detail = %detail, "Image backend request failed");
                (StatusCode::BAD_GATEWAY, "BACKEND_UNAVAILABLE", detail)
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<CompareError> for ApiError {
    fn from(err: CompareError) -> Self {
        match err {
            CompareError::DimensionMismatch { .. } => ApiError::DimensionMismatch(err.to_string()),
            CompareError::Decode { .. } => ApiError::DecodeFailure(err.to_string()),
        }
    }
}

impl From<MarkError> for ApiError {
    fn from(err: MarkError) -> Self {
        match err {
            MarkError::Decode(_) => ApiError::DecodeFailure(err.to_string()),
            MarkError::Encode(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        if is_not_found(&err) {
            return ApiError::NotFound(err.detail());
        }
        match &err {
            // Client-side mistakes the backend rejected are the caller's to fix
            BackendError::Status { status, .. } if (400..500).contains(status) => {
                ApiError::BadRequest(err.detail())
            }
            _ => ApiError::BadGateway(err.detail()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => ApiError::NotFound("Image not found".into()),
            DatabaseError::ConstraintViolation(detail) => ApiError::BadRequest(detail),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("worker task failed: {err}"))
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}
