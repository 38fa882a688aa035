//! API error handling.
//!
//! Every failure leaves a handler as an [`ApiErrorResponse`], rendered as
//! `{"code", "message", "details"?}`. The status and the code both come from
//! the [`ErrorKind`], so the two can never disagree.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use super::auth::AuthError;
use crate::infrastructure::RepositoryError;

// =============================================================================
// Error Kind
// =============================================================================

/// Failure classes reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Validation,
    Unauthorized,
    Forbidden,
    NotFound,
    PreconditionFailed,
    PreconditionRequired,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::BadRequest | Self::Validation => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::PreconditionRequired => StatusCode::PRECONDITION_REQUIRED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code sent in the body.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::BadRequest => "BAD_REQUEST",
            Self::Validation => "VALIDATION_ERROR",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::PreconditionFailed => "PRECONDITION_FAILED",
            Self::PreconditionRequired => "PRECONDITION_REQUIRED",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

// =============================================================================
// Response Body
// =============================================================================

/// JSON body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    /// Per-field problems, present for validation failures only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Error Response
// =============================================================================

/// A status plus the body sent with it.
#[derive(Debug, Clone)]
pub struct ApiErrorResponse {
    pub status: StatusCode,
    pub error: ApiError,
}

impl ApiErrorResponse {
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            status: kind.status(),
            error: ApiError {
                code: kind.code().to_string(),
                message: message.into(),
                details: None,
            },
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        self.error.details = Some(details);
        self
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<RepositoryError> for ApiErrorResponse {
    fn from(error: RepositoryError) -> Self {
        match error {
            // Another writer got in between the precondition check and the save.
            RepositoryError::VersionConflict { .. } => {
                tracing::info!(%error, "Concurrent write rejected");
                Self::new(ErrorKind::PreconditionFailed, "Todo has been modified")
            }
            RepositoryError::StorageError(_) => {
                tracing::error!(%error, "Storage failure");
                Self::new(ErrorKind::Internal, "An internal error occurred")
            }
        }
    }
}

impl From<AuthError> for ApiErrorResponse {
    fn from(error: AuthError) -> Self {
        tracing::debug!(%error, "Authentication failed");
        Self::new(ErrorKind::Unauthorized, error.to_string())
    }
}

impl From<JsonRejection> for ApiErrorResponse {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(ErrorKind::BadRequest, rejection.body_text())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field problems collected while validating a request body or path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    #[must_use]
    pub const fn new(errors: Vec<FieldError>) -> Self {
        Self { errors }
    }

    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(field, message)])
    }
}

impl From<ValidationError> for ApiErrorResponse {
    fn from(error: ValidationError) -> Self {
        Self::new(ErrorKind::Validation, "Validation failed").with_details(error.errors)
    }
}

// =============================================================================
// Tests
// =============================================================================
