//! API routes for the interview server

pub mod health;
pub mod interviews;
pub mod reports;

use axum::{
    body::Bytes,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, FieldError, Result};
use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Interview lifecycle
        .route("/interviews/start", post(interviews::start_interview))
        .route("/interviews/:session_id/answer", post(interviews::submit_answer))
        .route("/interviews/:session_id/end", post(interviews::end_interview))
        .route("/interviews/:session_id/status", get(interviews::session_status))
        // Reports
        .route("/reports/:report_id", get(reports::get_report))
        // Health and stats
        .route("/health/ollama", get(health::llm_health))
        .route("/stats", get(health::stats))
}

/// Parse a raw body as JSON. An empty body is treated as `null` so the schema
/// reports it as a non-object.
pub(crate) fn json_body(body: &Bytes) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }

    serde_json::from_slice(body).map_err(|e| {
        Error::validation(
            "Validation failed",
            vec![FieldError::new("body", format!("Malformed JSON: {}", e))],
        )
    })
}

/// Ids that are not UUIDs cannot exist
pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::SessionNotFound(raw.to_string()))
}

pub(crate) fn parse_report_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| Error::ReportNotFound(raw.to_string()))
}
