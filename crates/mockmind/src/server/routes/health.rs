//! Provider health and store statistics

use axum::{extract::State, Json};

use crate::providers::ConnectionStatus;
use crate::server::state::AppState;
use crate::types::{ApiResponse, StatsResponse};

/// GET /api/health/ollama - probe the configured LLM provider
pub async fn llm_health(State(state): State<AppState>) -> Json<ApiResponse<ConnectionStatus>> {
    Json(ApiResponse::ok(state.gateway().test_connection().await))
}

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Json<ApiResponse<StatsResponse>> {
    Json(ApiResponse::ok(state.store().stats()))
}
