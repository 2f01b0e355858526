//! mockmind: Mock-interview practice server
//!
//! This crate drives a multi-turn interview against an LLM backend: it asks an
//! initial question, evaluates each spoken/typed answer, decides whether the
//! interview should continue, generates follow-up questions and finally a
//! scored report. Session state is cached in memory and persisted to disk so an
//! interview survives a server restart.

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;
pub mod validation;

pub use config::MockMindConfig;
pub use engine::{ContinuationPolicy, InterviewEngine, StartedInterview, TurnOutcome};
pub use error::{Error, Result};
pub use storage::SessionStore;
pub use types::{
    report::{CategoryScores, QaPair, Report},
    session::{Answer, Evaluation, Level, Question, Session, SessionStatus},
};
