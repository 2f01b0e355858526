//! Final interview report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::null_as_default;

/// Denormalized question/answer pair copied into the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    pub score: u8,
    pub feedback: String,
}

/// Per-category scores, each 0 to 100
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScores {
    #[serde(default, deserialize_with = "null_as_default")]
    pub technical: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub communication: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub problem_solving: u8,
}

/// Report content produced by the LLM, before it is bound to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDraft {
    pub overall_score: u8,
    pub summary: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category_scores: CategoryScores,
    /// Three items by prompt contract; cardinality is not enforced
    #[serde(default, deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub improvements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub qa_pairs: Vec<QaPair>,
}

/// Scored summary generated once at session end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: Uuid,
    pub session_id: Uuid,
    pub overall_score: u8,
    pub summary: String,
    pub category_scores: CategoryScores,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub recommendations: Vec<String>,
    pub qa_pairs: Vec<QaPair>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub generated_at: DateTime<Utc>,
}

impl Report {
    /// Bind a draft to its session with a fresh report id
    pub fn from_draft(session_id: Uuid, draft: ReportDraft) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            session_id,
            overall_score: draft.overall_score.min(100),
            summary: draft.summary,
            category_scores: draft.category_scores,
            strengths: draft.strengths,
            improvements: draft.improvements,
            recommendations: draft.recommendations,
            qa_pairs: draft.qa_pairs,
            generated_at: super::timestamp_now(),
        }
    }
}
