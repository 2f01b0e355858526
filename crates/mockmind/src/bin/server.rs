//! Interview server binary
//!
//! Run with: cargo run -p mockmind --bin mockmind-server

use mockmind::{config::LlmBackend, server::MockMindServer, MockMindConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mockmind=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    println!(
        r#"
╔═══════════════════════════════════════════════════════════╗
║                       MockMind Server                     ║
║          AI Mock Interviews with Scored Feedback          ║
╚═══════════════════════════════════════════════════════════╝
"#
    );

    // Load configuration
    let config = MockMindConfig::load()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - LLM backend: {:?}", config.llm.backend);
    tracing::info!("  - LLM model: {}", config.llm.model);
    tracing::info!("  - Sessions dir: {}", config.sessions.data_dir.display());
    tracing::info!("  - Max session age: {}s", config.sessions.max_session_age_secs);

    let server = MockMindServer::new(config.clone())?;

    // Probe the provider; the server starts either way
    let provider = server.state().gateway().provider().name().to_string();
    tracing::info!("Testing {} connection at {}...", provider, config.llm.base_url);
    let status = server.state().gateway().test_connection().await;

    if !status.connected {
        tracing::warn!("Cannot connect to {}!", provider);
        if config.llm.backend == LlmBackend::Ollama {
            tracing::warn!("Make sure Ollama is running: ollama serve");
        }
        tracing::warn!("Server will start but interview features will not work.");
    } else if !status.available {
        tracing::warn!("Model {} not found!", status.model);
        if config.llm.backend == LlmBackend::Ollama {
            tracing::warn!("Please install it: ollama pull {}", status.model);
        }
        tracing::warn!("Server will start but interview features will not work.");
    } else {
        tracing::info!("{} connected with model: {}", provider, status.model);
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/interviews/start        - Start an interview");
    println!("  POST /api/interviews/:id/answer   - Submit an answer");
    println!("  POST /api/interviews/:id/end      - End and generate report");
    println!("  GET  /api/interviews/:id/status   - Session status");
    println!("  GET  /api/reports/:id             - Get report");
    println!("  GET  /api/health/ollama           - LLM provider health");
    println!("  GET  /api/stats                   - Store statistics");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
