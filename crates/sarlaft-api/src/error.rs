//! # API Error Types
//!
//! Maps rules-engine rejections to HTTP status codes and structured JSON
//! error bodies. The UI relies on the machine-readable `code` to block the
//! action and show the specific reason; a failed transition must never be
//! presented as success, and internal details are never leaked.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use sarlaft_core::RulesError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// The error detail.
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable code (e.g. `"CONCURRENT_MODIFICATION"`).
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

/// Application-level error implementing [`IntoResponse`].
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Authentication failure — missing or invalid token (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A rules-engine rejection, mapped per error kind.
    #[error(transparent)]
    Domain(#[from] RulesError),

    /// Internal server error (500). Logged but not returned to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Domain(err) => match err {
                RulesError::Unauthorized { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
                RulesError::InvalidState { .. } => (StatusCode::CONFLICT, "INVALID_STATE"),
                RulesError::MissingJustification { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_JUSTIFICATION")
                }
                RulesError::MissingComment => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_COMMENT")
                }
                RulesError::IncompleteDossier { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "INCOMPLETE_DOSSIER")
                }
                RulesError::ConcurrentModification { .. } => {
                    (StatusCode::CONFLICT, "CONCURRENT_MODIFICATION")
                }
                RulesError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                RulesError::UnknownTag { .. } => (StatusCode::BAD_REQUEST, "UNKNOWN_TAG"),
                RulesError::Validation(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
                }
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        } else {
            tracing::warn!(code, error = %self, "request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
