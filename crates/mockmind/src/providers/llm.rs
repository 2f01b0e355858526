//! LLM provider trait for prompt completion

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sampling options sent with every completion request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerateOptions {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

impl GenerateOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            ..Self::default()
        }
    }
}

/// Result of probing the provider's model listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub model: String,
    /// Whether the configured model appears in the provider's listing
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConnectionStatus {
    pub fn connected(model: &str, available: bool) -> Self {
        Self {
            connected: true,
            model: model.to_string(),
            available,
            error: None,
        }
    }

    pub fn failed(model: &str, error: impl Into<String>) -> Self {
        Self {
            connected: false,
            model: model.to_string(),
            available: false,
            error: Some(error.into()),
        }
    }
}

/// Trait for text-generation backends
///
/// Implementations:
/// - `OllamaProvider`: local Ollama server (`/api/generate`, JSON format mode)
/// - `GroqProvider`: Groq cloud, OpenAI-compatible chat completions
///
/// Implementations perform a single request per call and classify failures;
/// retry and JSON recovery live in [`crate::generation::LlmGateway`].
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and return the raw completion text
    ///
    /// Errors must be classified as `ProviderUnreachable`, `ProviderTimeout`,
    /// `RateLimited` or `Llm`.
    async fn complete(&self, prompt: &str, options: &GenerateOptions) -> Result<String>;

    /// Probe the discovery endpoint. Never fails; failures are captured in the status.
    async fn test_connection(&self) -> ConnectionStatus;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

/// Classify a transport failure from reqwest
pub(crate) fn transport_error(provider: &str, base_url: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::ProviderTimeout(format!("{} at {} did not respond in time", provider, base_url))
    } else if err.is_connect() {
        Error::ProviderUnreachable(format!("Cannot connect to {} at {}", provider, base_url))
    } else {
        Error::llm(format!("{} request failed: {}", provider, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = GenerateOptions::default();
        assert_eq!(options.temperature, 0.7);
        assert_eq!(options.top_p, 0.9);
        assert_eq!(GenerateOptions::with_temperature(0.8).top_p, 0.9);
    }

    #[test]
    fn test_connection_status_serialization() {
        let ok = serde_json::to_value(ConnectionStatus::connected("llama3.2:3b", true)).unwrap();
        assert_eq!(ok["connected"], true);
        assert!(ok.get("error").is_none());

        let failed = ConnectionStatus::failed("llama3.2:3b", "connection refused");
        assert!(!failed.available);
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
    }
}
