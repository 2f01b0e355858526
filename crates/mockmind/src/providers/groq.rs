//! Groq completion backend (OpenAI-compatible chat completions)

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::{transport_error, ConnectionStatus, GenerateOptions, LlmProvider};

const SYSTEM_PROMPT: &str =
    "You are an expert technical interviewer. Always respond with valid JSON only.";

/// Groq API client
pub struct GroqProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    discovery_timeout: Duration,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    top_p: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

impl GroqProvider {
    /// Create a new Groq provider. Fails without a credential.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| Error::Config("Groq backend requires an API key".to_string()))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            discovery_timeout: Duration::from_secs(config.connect_timeout_secs),
        })
    }
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn complete(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: options.temperature,
            top_p: options.top_p,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("Groq", &self.base_url, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited("Groq returned HTTP 429".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "Groq completion failed: HTTP {} - {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| transport_error("Groq", &self.base_url, e))?;

        Ok(chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    async fn test_connection(&self) -> ConnectionStatus {
        let url = format!("{}/models", self.base_url);

        let result = async {
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.api_key)
                .timeout(self.discovery_timeout)
                .send()
                .await?
                .error_for_status()?;
            response.json::<ModelList>().await
        }
        .await;

        match result {
            Ok(list) => {
                let available = list.data.iter().any(|m| m.id == self.model);
                ConnectionStatus::connected(&self.model, available)
            }
            Err(e) => {
                tracing::error!("Groq connection test failed: {}", e);
                ConnectionStatus::failed(&self.model, e.to_string())
            }
        }
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
