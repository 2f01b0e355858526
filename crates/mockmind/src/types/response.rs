//! HTTP response payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::report::Report;
use super::session::{Evaluation, InterviewSetup, Level, Question, Session, SessionStatus};

/// Success envelope: `{"success": true, "data": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewResponse {
    pub session_id: Uuid,
    pub question: Question,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub evaluation: Evaluation,
    pub next_question: Option<Question>,
    pub should_continue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndInterviewResponse {
    pub report_id: Uuid,
    pub report: Report,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub current_question_index: usize,
    pub total_questions: usize,
    pub total_answers: usize,
    pub config: InterviewSetup,
}

impl From<&Session> for SessionStatusResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id,
            status: session.status,
            current_question_index: session.current_question_index,
            total_questions: session.questions.len(),
            total_answers: session.answers.len(),
            config: session.config.clone(),
        }
    }
}

/// Session metadata attached to a report view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub role: String,
    pub level: Level,
    pub topics: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Rounded seconds, absent while the session has no end time
    pub duration: Option<u64>,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        Self {
            role: session.config.role.clone(),
            level: session.config.level,
            topics: session.config.topics.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            duration: session.end_time.map(|end| {
                let ms = end.signed_duration_since(session.start_time).num_milliseconds();
                (ms.max(0) as f64 / 1000.0).round() as u64
            }),
        }
    }
}

/// Report enriched with session metadata for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: Report,
    pub session: Option<SessionSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub active_sessions: usize,
    pub reports_stored: usize,
}
