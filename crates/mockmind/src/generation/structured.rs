//! LLM gateway: retry, JSON recovery and typed calls
//!
//! Wraps an [`LlmProvider`] with the failure policy shared by every backend:
//! - unreachable provider or timeout: fail immediately
//! - rate limited: back off (scaled by attempt number) and retry
//! - output that is not recoverable JSON: retry within `max_attempts`, then fail

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::{ConnectionStatus, GenerateOptions, LlmProvider};
use crate::types::{Evaluation, GeneratedQuestion, ReportDraft};
use crate::validation::{self, Schema, EVALUATION_PAYLOAD, QUESTION_PAYLOAD, REPORT_PAYLOAD};

use super::json::extract_json;
use super::prompt::{EvaluationInput, PromptBuilder, ReportInput};

/// Sampling temperature for question generation
pub const QUESTION_TEMPERATURE: f32 = 0.8;
/// Sampling temperature for answer evaluation
pub const EVALUATION_TEMPERATURE: f32 = 0.6;
/// Sampling temperature for report generation
pub const REPORT_TEMPERATURE: f32 = 0.7;

/// Parsed JSON object plus the raw completion text it came from
#[derive(Debug, Clone)]
pub struct Generation {
    pub data: Value,
    pub raw: String,
}

/// Retry budget for a gateway
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts for output that cannot be parsed
    pub max_attempts: u32,
    /// Additional attempts allowed after rate limiting
    pub rate_limit_retries: u32,
    /// Base rate-limit backoff, multiplied by the retry number
    pub rate_limit_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&LlmConfig::default())
    }
}

impl From<&LlmConfig> for RetryPolicy {
    fn from(config: &LlmConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            rate_limit_retries: config.rate_limit_retries,
            rate_limit_backoff: config.rate_limit_backoff(1),
        }
    }
}

/// Boundary to the text-generation provider
#[derive(Clone)]
pub struct LlmGateway {
    provider: Arc<dyn LlmProvider>,
    retry: RetryPolicy,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    /// Probe the provider; never fails
    pub async fn test_connection(&self) -> ConnectionStatus {
        self.provider.test_connection().await
    }

    /// Send a prompt and recover a JSON object from the completion
    pub async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<Generation> {
        let max_attempts = self.retry.max_attempts;
        let mut attempt = 1;
        let mut rate_limited = 0;

        loop {
            tracing::info!(
                "Sending prompt to {} ({}), attempt {}/{}",
                self.provider.name(),
                self.provider.model(),
                attempt,
                max_attempts
            );

            let outcome = match self.provider.complete(prompt, options).await {
                Ok(raw) => extract_json(&raw).map(|data| Generation { data, raw }),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(generation) => return Ok(generation),
                Err(Error::RateLimited(msg)) if rate_limited < self.retry.rate_limit_retries => {
                    rate_limited += 1;
                    let delay = self.retry.rate_limit_backoff * rate_limited;
                    tracing::warn!(
                        "{} rate limited ({}), retry {}/{} in {:?}",
                        self.provider.name(),
                        msg,
                        rate_limited,
                        self.retry.rate_limit_retries,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(Error::InvalidResponse(msg)) if attempt < max_attempts => {
                    tracing::warn!(
                        "Unusable output from {} (attempt {}/{}): {}",
                        self.provider.name(),
                        attempt,
                        max_attempts,
                        msg
                    );
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!("{} generation failed: {}", self.provider.name(), e);
                    return Err(e);
                }
            }
        }
    }

    /// Generate and validate a question payload
    pub async fn generate_question(&self, prompt: &str) -> Result<GeneratedQuestion> {
        let generation = self
            .generate(prompt, &GenerateOptions::with_temperature(QUESTION_TEMPERATURE))
            .await?;

        let mut data = generation.data;
        check_shape(&QUESTION_PAYLOAD, &data, "question")?;
        normalize_number(&mut data, "difficulty", 1.0, 5.0);
        decode(data, "question")
    }

    /// Evaluate an answer; the score is clamped into 0..=100
    pub async fn evaluate_answer(&self, input: &EvaluationInput<'_>) -> Result<Evaluation> {
        let prompt = PromptBuilder::evaluate_answer(input);
        let generation = self
            .generate(&prompt, &GenerateOptions::with_temperature(EVALUATION_TEMPERATURE))
            .await?;

        let mut data = generation.data;
        check_shape(&EVALUATION_PAYLOAD, &data, "evaluation")?;
        normalize_number(&mut data, "score", 0.0, 100.0);
        decode(data, "evaluation")
    }

    /// Generate the final report draft (without Q&A pairs)
    pub async fn generate_report(&self, input: &ReportInput<'_>) -> Result<ReportDraft> {
        let prompt = PromptBuilder::report(input);
        let generation = self
            .generate(&prompt, &GenerateOptions::with_temperature(REPORT_TEMPERATURE))
            .await?;

        let mut data = generation.data;
        check_shape(&REPORT_PAYLOAD, &data, "report")?;
        normalize_number(&mut data, "overallScore", 0.0, 100.0);
        if let Some(categories) = data.get_mut("categoryScores") {
            for key in ["technical", "communication", "problemSolving"] {
                normalize_number(categories, key, 0.0, 100.0);
            }
        }
        decode(data, "report")
    }
}

fn check_shape(schema: &Schema, data: &Value, what: &str) -> Result<()> {
    schema.validate(data).map_err(|details| {
        Error::invalid_response(format!(
            "Invalid {} format from LLM: {}",
            what,
            validation::summarize(&details)
        ))
    })
}

/// Round a numeric field and clamp it into `[min, max]`
fn normalize_number(data: &mut Value, key: &str, min: f64, max: f64) {
    if let Some(slot) = data.get_mut(key) {
        if let Some(n) = slot.as_f64() {
            *slot = Value::from(n.round().clamp(min, max) as u64);
        }
    }
}

fn decode<T: DeserializeOwned>(data: Value, what: &str) -> Result<T> {
    serde_json::from_value(data)
        .map_err(|e| Error::invalid_response(format!("Invalid {} format from LLM: {}", what, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Replays a fixed sequence of completion results
    struct Scripted {
        replies: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<f32>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl LlmProvider for Scripted {
        async fn complete(&self, _prompt: &str, options: &GenerateOptions) -> Result<String> {
            self.calls.lock().push(options.temperature);
            self.replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(Error::llm("script exhausted")))
        }

        async fn test_connection(&self) -> ConnectionStatus {
            ConnectionStatus::connected("scripted", true)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn gateway(provider: Arc<Scripted>) -> LlmGateway {
        LlmGateway::new(
            provider,
            RetryPolicy {
                max_attempts: 2,
                rate_limit_retries: 2,
                rate_limit_backoff: Duration::from_millis(1),
            },
        )
    }

    fn eval_input() -> EvaluationInput<'static> {
        EvaluationInput {
            question: "What is REST?",
            answer: "I don't know",
            expected_key_points: &[],
            role: "Backend Developer",
        }
    }

    #[tokio::test]
    async fn test_parse_failure_retried_once() {
        let provider = Scripted::new(vec![
            Ok("not json at all".to_string()),
            Ok(r#"{"question": "Why?", "type": "technical", "difficulty": 2}"#.to_string()),
        ]);
        let question = gateway(provider.clone())
            .generate_question("prompt")
            .await
            .unwrap();

        assert_eq!(question.question, "Why?");
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.calls.lock()[0], QUESTION_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_parse_failure_exhausts_budget() {
        let provider = Scripted::new(vec![Ok("nope".into()), Ok("still nope".into())]);
        let err = gateway(provider.clone())
            .generate("prompt", &GenerateOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidResponse(_)));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_unreachable_is_not_retried() {
        let provider = Scripted::new(vec![
            Err(Error::ProviderUnreachable("refused".into())),
            Ok("{}".into()),
        ]);
        let err = gateway(provider.clone())
            .generate("prompt", &GenerateOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ProviderUnreachable(_)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_is_not_retried() {
        let provider = Scripted::new(vec![Err(Error::ProviderTimeout("slow".into()))]);
        let err = gateway(provider.clone())
            .generate("prompt", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ProviderTimeout(_)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_rate_limit_backs_off_then_succeeds() {
        let provider = Scripted::new(vec![
            Err(Error::RateLimited("429".into())),
            Err(Error::RateLimited("429".into())),
            Ok(r#"{"ok": true}"#.into()),
        ]);
        let generation = gateway(provider.clone())
            .generate("prompt", &GenerateOptions::default())
            .await
            .unwrap();

        assert_eq!(generation.data["ok"], true);
        assert_eq!(generation.raw, r#"{"ok": true}"#);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_rate_limit_budget_exhausted() {
        let provider = Scripted::new(vec![
            Err(Error::RateLimited("429".into())),
            Err(Error::RateLimited("429".into())),
            Err(Error::RateLimited("429".into())),
        ]);
        let err = gateway(provider.clone())
            .generate("prompt", &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RateLimited(_)));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_score_clamped() {
        let provider = Scripted::new(vec![
            Ok(r#"{"score": 140, "feedback": "Great"}"#.into()),
            Ok(r#"{"score": -12.4, "feedback": "Off topic"}"#.into()),
        ]);
        let gateway = gateway(provider.clone());

        let high = gateway.evaluate_answer(&eval_input()).await.unwrap();
        assert_eq!(high.score, 100);
        assert!(high.strengths.is_empty());

        let low = gateway.evaluate_answer(&eval_input()).await.unwrap();
        assert_eq!(low.score, 0);
        assert_eq!(provider.calls.lock()[0], EVALUATION_TEMPERATURE);
    }

    #[tokio::test]
    async fn test_question_missing_fields_is_fatal() {
        let provider = Scripted::new(vec![Ok(r#"{"question": "Why?"}"#.into())]);
        let err = gateway(provider.clone())
            .generate_question("prompt")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Invalid question format from LLM"));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_difficulty_rounded_into_range() {
        let provider = Scripted::new(vec![Ok(
            r#"{"question": "Why?", "type": "technical", "difficulty": 7.6}"#.into(),
        )]);
        let question = gateway(provider).generate_question("prompt").await.unwrap();
        assert_eq!(question.difficulty, 5);
    }

    #[tokio::test]
    async fn test_null_lists_treated_as_absent() {
        let provider = Scripted::new(vec![
            Ok(r#"{"score": 40, "feedback": "Vague", "strengths": null, "improvements": ["x"], "keyPointsCovered": null}"#.into()),
            Ok(r#"{"question": "Why?", "type": "technical", "difficulty": 2, "expectedKeyPoints": null}"#.into()),
            Ok(r#"{"overallScore": 55, "summary": "Uneven.", "categoryScores": null, "strengths": null, "recommendations": ["practice"]}"#.into()),
        ]);
        let gateway = gateway(provider.clone());

        let evaluation = gateway.evaluate_answer(&eval_input()).await.unwrap();
        assert_eq!(evaluation.score, 40);
        assert!(evaluation.strengths.is_empty());
        assert!(evaluation.key_points_covered.is_empty());
        assert_eq!(evaluation.improvements, vec!["x".to_string()]);

        let question = gateway.generate_question("prompt").await.unwrap();
        assert!(question.expected_key_points.is_empty());

        let draft = gateway
            .generate_report(&ReportInput {
                role: "Designer",
                level: crate::types::Level::Junior,
                qa_pairs: &[],
                duration_secs: 0,
            })
            .await
            .unwrap();
        assert_eq!(draft.category_scores, crate::types::CategoryScores::default());
        assert!(draft.strengths.is_empty());
        assert_eq!(draft.recommendations.len(), 1);
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_report_requires_summary() {
        let provider = Scripted::new(vec![Ok(r#"{"overallScore": 70, "summary": ""}"#.into())]);
        let err = gateway(provider)
            .generate_report(&ReportInput {
                role: "Designer",
                level: crate::types::Level::Junior,
                qa_pairs: &[],
                duration_secs: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }
}
