//! Prompt construction and structured LLM generation

pub mod json;
pub mod prompt;
pub mod structured;

pub use json::extract_json;
pub use prompt::PromptBuilder;
pub use structured::{Generation, LlmGateway, RetryPolicy};
