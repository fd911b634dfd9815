//! Error taxonomy shared by the query engine and the HTTP boundary.
//!
//! The core emits three kinds of errors:
//!
//! - `NotFound` - the requested quote or filter set has no matches
//! - `Validation` - client input violates a stated constraint
//! - `Internal` - a collaborator failed (dataset read or parse)
//!
//! `ConfigError` only occurs during startup. If it ever reaches a response it
//! is rendered as an internal error with a generic message.
//!
//! # Response Body
//!
//! ```json
//! { "type": "NOT_FOUND", "message": "quote not found", "code": 404 }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error types with appropriate HTTP status codes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Error kind as exposed in the `type` field of error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    Validation,
    Internal,
}

impl ErrorKind {
    /// Wire name of the kind (`NOT_FOUND`, `VALIDATION`, `INTERNAL`).
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl AppError {
    /// The taxonomy kind this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::Internal(_) | AppError::ConfigError(_) => ErrorKind::Internal,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to clients.
    ///
    /// Configuration details never leave the process.
    pub fn public_message(&self) -> &str {
        match self {
            AppError::NotFound(msg) | AppError::Validation(msg) | AppError::Internal(msg) => {
                msg.as_str()
            }
            AppError::ConfigError(_) => "internal server error",
        }
    }
}

/// Error response body for API endpoints.
///
/// Also used by the rate limiter for `RATE_LIMITED` responses, which is why
/// `error_type` is a plain string rather than [`ErrorKind`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    pub code: u16,
}

impl ErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>, status: StatusCode) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            code: status.as_u16(),
        }
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        ErrorResponse::new(err.kind().as_str(), err.public_message(), err.status_code())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, kind = self.kind().as_str(), "Request failed");
        } else {
            tracing::warn!(error = %self, kind = self.kind().as_str(), "Request rejected");
        }

        (status, axum::Json(ErrorResponse::from(&self))).into_response()
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
