//! Interview session aggregate and its turn records

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::report::QaPair;
use super::{null_as_default, timestamp_now};

/// Number of most recent Q&A pairs kept in the rolling conversation history
pub const HISTORY_WINDOW: usize = 3;

/// Candidate experience level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    Junior,
    #[serde(rename = "Mid-level")]
    MidLevel,
    Senior,
    Lead,
    Principal,
}

impl Level {
    pub const ALL: [Level; 5] = [
        Level::Junior,
        Level::MidLevel,
        Level::Senior,
        Level::Lead,
        Level::Principal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Junior => "Junior",
            Level::MidLevel => "Mid-level",
            Level::Senior => "Senior",
            Level::Lead => "Lead",
            Level::Principal => "Principal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session lifecycle status. Only `Active -> Completed` is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Completed,
}

/// Immutable interview setup chosen by the candidate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewSetup {
    pub role: String,
    pub level: Level,
    pub topics: Vec<String>,
}

/// Rolling state derived from the turns so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    /// Formatted summary of the last few Q&A pairs
    pub conversation_history: String,
    /// Distinct question type tags seen so far, in first-seen order
    pub topics_covered: Vec<String>,
    /// Difficulty of every question asked, in order
    pub difficulty_progression: Vec<u8>,
}

/// Question payload returned by the LLM, not yet attached to a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub difficulty: u8,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expected_key_points: Vec<String>,
}

/// A question asked within a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub question_id: Uuid,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: String,
    /// 1 (easiest) to 5 (hardest)
    pub difficulty: u8,
    #[serde(default)]
    pub expected_key_points: Vec<String>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub asked_at: DateTime<Utc>,
}

/// Evaluation of a single answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    /// 0 to 100
    pub score: u8,
    pub feedback: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub improvements: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub key_points_covered: Vec<String>,
}

/// A candidate answer with its evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub answer_id: Uuid,
    pub question_id: Uuid,
    pub transcription: String,
    pub evaluation: Evaluation,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub submitted_at: DateTime<Utc>,
}

/// One candidate's mock interview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: Uuid,
    pub config: InterviewSetup,
    pub status: SessionStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds_option", default)]
    pub end_time: Option<DateTime<Utc>>,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    pub current_question_index: usize,
    #[serde(default)]
    pub context: SessionContext,
}

impl Session {
    /// Create a fresh active session
    pub fn new(setup: InterviewSetup) -> Self {
        Self::started_at(setup, timestamp_now())
    }

    /// Create a fresh active session with an explicit start time
    pub fn started_at(setup: InterviewSetup, start_time: DateTime<Utc>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            config: setup,
            status: SessionStatus::Active,
            start_time: start_time.trunc_subsecs(3),
            end_time: None,
            questions: Vec::new(),
            answers: Vec::new(),
            current_question_index: 0,
            context: SessionContext::default(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Time elapsed since the session started
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.start_time)
    }

    pub fn is_expired(&self, now: DateTime<Utc>, max_age: chrono::Duration) -> bool {
        self.age(now) > max_age
    }

    /// The outstanding unanswered question, if any
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question_index)
    }

    /// Whether a question has been issued but not yet answered
    pub fn has_pending_question(&self) -> bool {
        self.questions.len() > self.answers.len()
    }

    /// Append a generated question and record its difficulty
    pub fn push_question(&mut self, generated: GeneratedQuestion) -> Question {
        let question = Question {
            question_id: Uuid::new_v4(),
            question: generated.question,
            question_type: generated.question_type,
            difficulty: generated.difficulty.clamp(1, 5),
            expected_key_points: generated.expected_key_points,
            asked_at: timestamp_now(),
        };

        self.context.difficulty_progression.push(question.difficulty);
        self.questions.push(question.clone());
        question
    }

    /// Append an answer, advance the question index and refresh the rolling context
    pub fn push_answer(
        &mut self,
        question_id: Uuid,
        transcription: impl Into<String>,
        mut evaluation: Evaluation,
    ) -> Answer {
        evaluation.score = evaluation.score.min(100);

        let answer = Answer {
            answer_id: Uuid::new_v4(),
            question_id,
            transcription: transcription.into(),
            evaluation,
            submitted_at: timestamp_now(),
        };

        self.answers.push(answer.clone());
        self.current_question_index += 1;
        self.refresh_context();
        answer
    }

    /// Recompute conversation history and covered topics
    fn refresh_context(&mut self) {
        let start = self.answers.len().saturating_sub(HISTORY_WINDOW);

        let recent: Vec<String> = self.answers[start..]
            .iter()
            .filter_map(|answer| {
                self.find_question(answer.question_id).map(|q| {
                    format!(
                        "Q: {}\nA: {}\nScore: {}/100",
                        q.question, answer.transcription, answer.evaluation.score
                    )
                })
            })
            .collect();
        self.context.conversation_history = recent.join("\n\n");

        for question in &self.questions {
            if !question.question_type.is_empty()
                && !self.context.topics_covered.contains(&question.question_type)
            {
                self.context
                    .topics_covered
                    .push(question.question_type.clone());
            }
        }
    }

    pub fn find_question(&self, question_id: Uuid) -> Option<&Question> {
        self.questions.iter().find(|q| q.question_id == question_id)
    }

    /// Configured topics not yet matched by any covered type tag.
    ///
    /// Matching is case-insensitive substring containment of the topic in the
    /// tag, so it is a heuristic: "API" is considered covered by a tag such as
    /// "REST API design".
    pub fn uncovered_topics(&self) -> Vec<String> {
        let covered: Vec<String> = self
            .context
            .topics_covered
            .iter()
            .map(|c| c.to_lowercase())
            .collect();

        self.config
            .topics
            .iter()
            .filter(|topic| {
                let topic = topic.to_lowercase();
                !covered.iter().any(|c| c.contains(&topic))
            })
            .cloned()
            .collect()
    }

    /// Answers joined to their questions, in answer order
    pub fn qa_pairs(&self) -> Vec<QaPair> {
        self.answers
            .iter()
            .map(|answer| QaPair {
                question: self
                    .find_question(answer.question_id)
                    .map(|q| q.question.clone())
                    .unwrap_or_else(|| "Unknown question".to_string()),
                answer: answer.transcription.clone(),
                score: answer.evaluation.score,
                feedback: answer.evaluation.feedback.clone(),
            })
            .collect()
    }

    /// Session duration in whole seconds, 0 when the clock went backwards
    pub fn duration_secs(&self, now: DateTime<Utc>) -> u64 {
        let end = self.end_time.unwrap_or(now);
        end.signed_duration_since(self.start_time)
            .num_seconds()
            .max(0) as u64
    }

    /// Mark the session completed. Returns false if it already was.
    pub fn complete(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == SessionStatus::Completed {
            return false;
        }
        self.status = SessionStatus::Completed;
        self.end_time = Some(now.trunc_subsecs(3));
        true
    }
}
