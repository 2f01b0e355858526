//! Configuration for the interview server

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Main server configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MockMindConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// LLM provider configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Session storage configuration
    #[serde(default)]
    pub sessions: SessionConfig,
}

impl MockMindConfig {
    /// Load configuration: optional TOML file named by `MOCKMIND_CONFIG`,
    /// then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("MOCKMIND_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a TOML configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Apply environment overrides using the given lookup function
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid PORT: {}", port)))?;
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }

        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.llm.model = model;
        }

        // A Groq credential switches the backend
        if let Some(key) = lookup("GROQ_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.backend = LlmBackend::Groq;
            self.llm.api_key = Some(key);
            self.llm.base_url =
                lookup("GROQ_BASE_URL").unwrap_or_else(|| GROQ_DEFAULT_BASE_URL.to_string());
            self.llm.model =
                lookup("GROQ_MODEL").unwrap_or_else(|| GROQ_DEFAULT_MODEL.to_string());
        }

        if let Some(age) = lookup("MAX_SESSION_AGE_MS") {
            let ms: u64 = age
                .parse()
                .map_err(|_| Error::Config(format!("Invalid MAX_SESSION_AGE_MS: {}", age)))?;
            self.sessions.max_session_age_secs = ms / 1000;
        }
        if let Some(dir) = lookup("SESSIONS_DIR") {
            self.sessions.data_dir = PathBuf::from(dir);
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            enable_cors: true,
        }
    }
}

/// LLM backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmBackend {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Groq cloud (OpenAI-compatible API)
    Groq,
}

pub const GROQ_DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend provider
    #[serde(default)]
    pub backend: LlmBackend,
    /// Provider base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Provider credential (Groq only)
    #[serde(default)]
    pub api_key: Option<String>,
    /// Request timeout in seconds (first request can be slow on cold start)
    pub timeout_secs: u64,
    /// Timeout for the discovery endpoint in seconds
    pub connect_timeout_secs: u64,
    /// Total attempts for a generation whose output is not valid JSON
    pub max_attempts: u32,
    /// Extra attempts granted when the provider rate-limits
    pub rate_limit_retries: u32,
    /// Base backoff for rate limiting, scaled by attempt number
    pub rate_limit_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: LlmBackend::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            api_key: None,
            timeout_secs: 120,
            connect_timeout_secs: 5,
            max_attempts: 2,
            rate_limit_retries: 3,
            rate_limit_backoff_ms: 1000,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Backoff before retry number `attempt` (1-based) after a rate limit
    pub fn rate_limit_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.rate_limit_backoff_ms.saturating_mul(attempt as u64))
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory holding `session-<id>.json` and `report-<id>.json`
    pub data_dir: PathBuf,
    /// Maximum session age before it expires (default: 2 hours)
    pub max_session_age_secs: u64,
    /// How long a completed session stays in memory (default: 10 minutes)
    pub completed_retention_secs: u64,
    /// Interval of the expired-session sweep (default: 10 minutes)
    pub cleanup_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data").join("sessions"),
            max_session_age_secs: 2 * 60 * 60,
            completed_retention_secs: 10 * 60,
            cleanup_interval_secs: 10 * 60,
        }
    }
}

impl SessionConfig {
    pub fn max_session_age(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.max_session_age_secs as i64)
    }

    pub fn completed_retention(&self) -> Duration {
        Duration::from_secs(self.completed_retention_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}
