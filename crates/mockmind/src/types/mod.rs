//! Core types for the interview server

pub mod report;
pub mod request;
pub mod response;
pub mod session;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer};

pub use report::{CategoryScores, QaPair, Report, ReportDraft};
pub use request::{AudioMetadata, StartInterviewRequest, SubmitAnswerRequest};
pub use response::{
    AnswerResponse, ApiResponse, EndInterviewResponse, ReportView, SessionStatusResponse, SessionSummary,
    StartInterviewResponse, StatsResponse,
};
pub use session::{
    Answer, Evaluation, GeneratedQuestion, InterviewSetup, Level, Question, Session,
    SessionContext, SessionStatus,
};

/// Current time truncated to millisecond precision, matching the persisted format
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Deserialize an explicit `null` the same way as a missing field.
/// Pair with `#[serde(default)]`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
