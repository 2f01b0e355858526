//! Continuation policy: decides whether another turn should occur

use chrono::{DateTime, Utc};

use crate::types::Session;

#[derive(Debug, Clone, Copy)]
pub struct ContinuationPolicy {
    /// Below this many answers the interview always continues
    pub min_answers: usize,
    /// At this many answers the interview always stops
    pub max_answers: usize,
    /// Wall-clock limit applied between the two bounds
    pub max_duration: chrono::Duration,
}

impl Default for ContinuationPolicy {
    fn default() -> Self {
        Self {
            min_answers: 3,
            max_answers: 10,
            max_duration: chrono::Duration::minutes(30),
        }
    }
}

impl ContinuationPolicy {
    /// Evaluated after the latest answer has been recorded
    pub fn should_continue(&self, session: &Session, now: DateTime<Utc>) -> bool {
        let answered = session.answers.len();

        if answered < self.min_answers {
            return true;
        }
        if answered >= self.max_answers {
            return false;
        }
        session.age(now) <= self.max_duration
    }
}
