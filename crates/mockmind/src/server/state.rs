//! Application state for the interview server

use std::sync::Arc;

use crate::config::MockMindConfig;
use crate::engine::{ContinuationPolicy, InterviewEngine};
use crate::error::Result;
use crate::generation::{LlmGateway, RetryPolicy};
use crate::providers::{self, LlmProvider};
use crate::storage::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: MockMindConfig,
    /// Session and report store (shared with the engine)
    store: Arc<SessionStore>,
    /// Interview orchestration
    engine: InterviewEngine,
}

impl AppState {
    /// Create state with the provider selected by configuration
    pub fn new(config: MockMindConfig) -> Result<Self> {
        let provider = providers::build_provider(&config.llm)?;
        Ok(Self::with_provider(config, provider))
    }

    /// Create state around an explicit provider
    pub fn with_provider(config: MockMindConfig, provider: Arc<dyn LlmProvider>) -> Self {
        tracing::info!("Initializing interview server state...");

        let store = Arc::new(SessionStore::new(config.sessions.clone()));
        let gateway = LlmGateway::new(provider, RetryPolicy::from(&config.llm));
        let engine = InterviewEngine::new(
            Arc::clone(&store),
            gateway,
            ContinuationPolicy::default(),
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                engine,
            }),
        }
    }

    /// Get configuration
    pub fn config(&self) -> &MockMindConfig {
        &self.inner.config
    }

    /// Get session store
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.inner.store
    }

    /// Get interview engine
    pub fn engine(&self) -> &InterviewEngine {
        &self.inner.engine
    }

    /// Get the LLM gateway
    pub fn gateway(&self) -> &LlmGateway {
        self.inner.engine.gateway()
    }
}
