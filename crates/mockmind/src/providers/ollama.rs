//! Ollama completion backend

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::llm::{transport_error, ConnectionStatus, GenerateOptions, LlmProvider};

/// Ollama API client
pub struct OllamaProvider {
    /// HTTP client
    client: Client,
    base_url: String,
    model: String,
    discovery_timeout: Duration,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: &'a GenerateOptions,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    name: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    pub fn new(config: &LlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(5)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            discovery_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }

    /// Tag prefix used to match the configured model in `/api/tags`
    fn model_family(&self) -> &str {
        self.model.split(':').next().unwrap_or(&self.model)
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format: "json",
            options,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("Ollama", &self.base_url, e))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited("Ollama returned HTTP 429".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::llm(format!(
                "Ollama generation failed: HTTP {} - {}",
                status, body
            )));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| transport_error("Ollama", &self.base_url, e))?;

        tracing::debug!("Received {} chars from Ollama", generated.response.len());
        Ok(generated.response)
    }

    async fn test_connection(&self) -> ConnectionStatus {
        let url = format!("{}/api/tags", self.base_url);

        let result = async {
            let response = self
                .client
                .get(&url)
                .timeout(self.discovery_timeout)
                .send()
                .await?
                .error_for_status()?;
            response.json::<TagsResponse>().await
        }
        .await;

        match result {
            Ok(tags) => {
                let family = self.model_family();
                let available = tags.models.iter().any(|m| m.name.contains(family));
                ConnectionStatus::connected(&self.model, available)
            }
            Err(e) => {
                tracing::error!("Ollama connection test failed: {}", e);
                ConnectionStatus::failed(&self.model, e.to_string())
            }
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
