//! Health and configuration endpoints.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub postgres: bool,
    /// Name of the LLM provider, if generation is available.
    pub llm_provider: Option<String>,
    pub auth_mode: &'static str,
    pub cached_generations: usize,
}

/// Server health
///
/// Reports which backing services are available.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Server is up", body = HealthResponse))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        postgres: state.pg_pool.is_some(),
        llm_provider: state.generator.as_ref().map(|g| g.provider_name().to_string()),
        auth_mode: state.auth.mode(),
        cached_generations: state.cache.len(),
    })
}

/// Redacted configuration
///
/// The active configuration with secrets removed.
#[utoipa::path(
    get,
    path = "/config",
    tag = "Health",
    responses((status = 200, description = "Configuration summary", content_type = "application/json"))
)]
pub async fn config(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(state.config.redacted_summary())
}
