//! LLM provider abstraction
//!
//! The backend is chosen once from configuration; the rest of the crate only
//! sees `Arc<dyn LlmProvider>`.

pub mod groq;
pub mod llm;
pub mod ollama;

use std::sync::Arc;

use crate::config::{LlmBackend, LlmConfig};
use crate::error::Result;

pub use groq::GroqProvider;
pub use llm::{ConnectionStatus, GenerateOptions, LlmProvider};
pub use ollama::OllamaProvider;

/// Construct the configured backend
pub fn build_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let provider: Arc<dyn LlmProvider> = match config.backend {
        LlmBackend::Ollama => Arc::new(OllamaProvider::new(config)),
        LlmBackend::Groq => Arc::new(GroqProvider::new(config)?),
    };

    tracing::info!(
        "Using LLM provider {} with model {}",
        provider.name(),
        provider.model()
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_default_is_ollama() {
        let provider = build_provider(&LlmConfig::default()).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.model(), "llama3.2:3b");
    }

    #[test]
    fn test_build_groq() {
        let config = LlmConfig {
            backend: LlmBackend::Groq,
            api_key: Some("gsk_test".to_string()),
            model: "llama-3.3-70b-versatile".to_string(),
            ..LlmConfig::default()
        };
        assert_eq!(build_provider(&config).unwrap().name(), "groq");
    }
}
