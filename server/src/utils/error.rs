use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::codec::CodecError;
use crate::store::StoreError;
use crate::utils::response::error as error_response;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Transient store failure. The request had no durable effect and may
    /// be retried.
    #[error("Ticket store unavailable")]
    StoreUnavailable(#[source] StoreError),

    #[error("Ticket store error")]
    StoreError(#[source] StoreError),

    #[error("Visual code error")]
    CodecError(#[from] CodecError),

    #[error("Internal server error")]
    InternalServerError(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        if err.is_retryable() {
            AppError::StoreUnavailable(err)
        } else {
            AppError::StoreError(err)
        }
    }
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::StoreError(_)
            | AppError::CodecError(_)
            | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AppError::StoreError(_) => "DATABASE_ERROR",
            AppError::CodecError(_) => "CODEC_ERROR",
            AppError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Whether the caller may safely repeat the request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::StoreUnavailable(_))
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::StoreUnavailable(e) | AppError::StoreError(e) => {
                error!(error = ?e, code = self.code(), "Ticket store error");
            }
            AppError::CodecError(e) => {
                error!(error = ?e, "Visual code error");
            }
            AppError::InternalServerError(msg) => {
                error!(message = %msg, "Internal error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Store and codec internals stay in the logs
        let public_message = match &self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg) => msg.clone(),
            AppError::StoreUnavailable(_) => {
                "The ticket service is temporarily unavailable, please retry".to_string()
            }
            AppError::StoreError(_) => "A database error occurred".to_string(),
            AppError::CodecError(_) | AppError::InternalServerError(_) => {
                "An internal error occurred".to_string()
            }
        };

        let details = self
            .is_retryable()
            .then(|| json!({ "retryable": true }));

        error_response(code, public_message, details, status)
    }
}
