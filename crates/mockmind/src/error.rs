//! Error types for the interview server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Result type alias for interview operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Interview server errors
#[derive(Debug, Error)]
pub enum Error {
    /// Client input rejected before reaching the engine
    #[error("{message}")]
    Validation {
        message: String,
        details: Vec<FieldError>,
    },

    /// Session absent from memory and disk
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Session older than the configured maximum age
    #[error("Session has expired: {0}")]
    SessionExpired(String),

    /// Report absent from memory and disk
    #[error("Report not found: {0}")]
    ReportNotFound(String),

    /// Answer or end request for a session that has already finished
    #[error("Session already completed: {0}")]
    SessionCompleted(String),

    /// Answer submitted while no question is outstanding
    #[error("No active question found for session {0}")]
    NoActiveQuestion(String),

    /// LLM provider refused the connection
    #[error("LLM provider unreachable: {0}")]
    ProviderUnreachable(String),

    /// LLM provider did not answer within the request timeout
    #[error("LLM provider too slow: {0}")]
    ProviderTimeout(String),

    /// LLM provider kept rate-limiting after all backoff retries
    #[error("LLM provider rate limited: {0}")]
    RateLimited(String),

    /// LLM output could not be recovered into the expected JSON shape
    #[error("Invalid LLM response: {0}")]
    InvalidResponse(String),

    /// Any other LLM provider failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// Writing session or report state to disk failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error with field-level details
    pub fn validation(message: impl Into<String>, details: Vec<FieldError>) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an invalid-response error
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error originates from the LLM provider
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Error::ProviderUnreachable(_)
                | Error::ProviderTimeout(_)
                | Error::RateLimited(_)
                | Error::InvalidResponse(_)
                | Error::Llm(_)
        )
    }

    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } | Error::Json(_) => StatusCode::BAD_REQUEST,
            Error::SessionNotFound(_) | Error::ReportNotFound(_) => StatusCode::NOT_FOUND,
            Error::SessionExpired(_) => StatusCode::GONE,
            Error::SessionCompleted(_) => StatusCode::CONFLICT,
            e if e.is_provider_error() => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("Request failed ({}): {}", status, self);
        } else {
            tracing::warn!("Request rejected ({}): {}", status, self);
        }

        let body = match &self {
            Error::Validation { message, details } => json!({
                "success": false,
                "error": message,
                "details": details,
            }),
            // Unexpected failures are logged in full but not exposed
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => json!({
                "success": false,
                "error": "Internal server error",
            }),
            other => json!({
                "success": false,
                "error": other.to_string(),
            }),
        };

        (status, Json(body)).into_response()
    }
}
