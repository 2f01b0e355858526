//! Interview orchestration: start, answer, continue-or-stop, report
//!
//! Each turn works on a snapshot of the session. The snapshot is flushed to
//! disk and only then committed to the cache, so a failed evaluation,
//! follow-up generation or write leaves the stored session untouched and the
//! client can resubmit.

pub mod locks;
pub mod policy;

use std::sync::Arc;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::generation::prompt::{EvaluationInput, FollowUpInput, InitialQuestionInput, ReportInput};
use crate::generation::{LlmGateway, PromptBuilder};
use crate::storage::SessionStore;
use crate::types::{timestamp_now, Evaluation, GeneratedQuestion, InterviewSetup, Question, Report};

pub use locks::{SessionLocks, TurnGuard};
pub use policy::ContinuationPolicy;

/// Result of a started interview
#[derive(Debug, Clone)]
pub struct StartedInterview {
    pub session_id: Uuid,
    pub question: Question,
}

/// Result of one answered turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub evaluation: Evaluation,
    /// `None` exactly when `should_continue` is false
    pub next_question: Option<Question>,
    pub should_continue: bool,
}

/// Turn-by-turn interview protocol
pub struct InterviewEngine {
    store: Arc<SessionStore>,
    llm: LlmGateway,
    policy: ContinuationPolicy,
    locks: SessionLocks,
}

impl InterviewEngine {
    pub fn new(store: Arc<SessionStore>, llm: LlmGateway, policy: ContinuationPolicy) -> Self {
        Self {
            store,
            llm,
            policy,
            locks: SessionLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn gateway(&self) -> &LlmGateway {
        &self.llm
    }

    /// Sessions with a turn in progress or queued
    pub fn active_turns(&self) -> usize {
        self.locks.len()
    }

    /// Generate the opening question; not yet attached to any session
    pub async fn generate_initial_question(
        &self,
        setup: &InterviewSetup,
    ) -> Result<GeneratedQuestion> {
        tracing::info!(
            "Generating initial question for {} - {}",
            setup.role,
            setup.level
        );

        let prompt = PromptBuilder::initial_question(&InitialQuestionInput {
            role: &setup.role,
            level: setup.level,
            topics: &setup.topics,
        });
        self.llm.generate_question(&prompt).await
    }

    /// Generate the first question, then create the session holding it
    pub async fn start_interview(&self, setup: InterviewSetup) -> Result<StartedInterview> {
        let generated = self.generate_initial_question(&setup).await?;

        let session = self.store.create_session(setup);
        let question = self
            .store
            .add_question(session.session_id, generated)
            .await?;

        Ok(StartedInterview {
            session_id: session.session_id,
            question,
        })
    }

    /// Evaluate the answer to the outstanding question and, when the policy
    /// allows, ask the next one
    pub async fn evaluate_and_generate_next(
        &self,
        session_id: Uuid,
        answer_text: &str,
    ) -> Result<TurnOutcome> {
        let _turn = self.locks.acquire(session_id).await;

        let mut session = self.store.get_session(session_id).await?;
        if !session.is_active() {
            return Err(Error::SessionCompleted(session_id.to_string()));
        }
        let current = session
            .current_question()
            .cloned()
            .ok_or_else(|| Error::NoActiveQuestion(session_id.to_string()))?;

        tracing::info!("Evaluating answer for session {}", session_id);
        let evaluation = self
            .llm
            .evaluate_answer(&EvaluationInput {
                question: &current.question,
                answer: answer_text,
                expected_key_points: &current.expected_key_points,
                role: &session.config.role,
            })
            .await?;

        let answer = session.push_answer(current.question_id, answer_text, evaluation);
        let should_continue = self.policy.should_continue(&session, timestamp_now());

        let next_question = if should_continue {
            tracing::info!("Generating follow-up question for session {}", session_id);
            let uncovered = session.uncovered_topics();
            let prompt = PromptBuilder::follow_up(&FollowUpInput {
                role: &session.config.role,
                level: session.config.level,
                history: &session.context.conversation_history,
                last_score: answer.evaluation.score,
                topics_covered: &session.context.topics_covered,
                uncovered_topics: &uncovered,
            });
            let generated = self.llm.generate_question(&prompt).await?;
            Some(session.push_question(generated))
        } else {
            tracing::info!(
                "Session {} reached its end after {} answers",
                session_id,
                session.answers.len()
            );
            None
        };

        self.store.persist_session(&session).await?;
        self.store.commit_session(session);

        Ok(TurnOutcome {
            evaluation: answer.evaluation,
            next_question,
            should_continue,
        })
    }

    /// Generate the report, then complete and persist the session
    pub async fn generate_final_report(&self, session_id: Uuid) -> Result<Report> {
        let _turn = self.locks.acquire(session_id).await;

        let session = self.store.get_session(session_id).await?;
        if !session.is_active() {
            return Err(Error::SessionCompleted(session_id.to_string()));
        }

        tracing::info!("Generating final report for session {}", session_id);
        let qa_pairs = session.qa_pairs();
        let mut draft = self
            .llm
            .generate_report(&ReportInput {
                role: &session.config.role,
                level: session.config.level,
                qa_pairs: &qa_pairs,
                duration_secs: session.duration_secs(timestamp_now()),
            })
            .await?;
        draft.qa_pairs = qa_pairs;

        self.store.end_session(session_id, draft).await
    }
}
