//! HTTP request bodies
//!
//! Bodies arrive as raw JSON, are checked against the schemas in
//! [`crate::validation`] and only then deserialized into these types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::session::{InterviewSetup, Level};
use crate::error::{Error, Result};
use crate::validation::{self, Schema};

/// Body of `POST /api/interviews/start`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartInterviewRequest {
    pub role: String,
    pub level: Level,
    pub topics: Vec<String>,
}

impl From<StartInterviewRequest> for InterviewSetup {
    fn from(req: StartInterviewRequest) -> Self {
        Self {
            role: req.role.trim().to_string(),
            level: req.level,
            topics: req.topics,
        }
    }
}

/// Optional speech statistics captured by the client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioMetadata {
    pub duration: Option<f64>,
    pub pause_count: Option<f64>,
    pub average_confidence: Option<f64>,
}

/// Body of `POST /api/interviews/:id/answer`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub answer: String,
    #[serde(default)]
    pub audio_metadata: Option<AudioMetadata>,
}

/// Validate a raw body against `schema` and deserialize it
pub fn parse_body<T: DeserializeOwned>(schema: &Schema, body: Value) -> Result<T> {
    if let Err(details) = schema.validate(&body) {
        tracing::warn!("Validation failed: {}", validation::summarize(&details));
        return Err(Error::validation("Validation failed", details));
    }

    serde_json::from_value(body).map_err(|e| {
        Error::validation(
            "Validation failed",
            vec![crate::error::FieldError::new("body", e.to_string())],
        )
    })
}
