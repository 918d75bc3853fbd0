//! Domain-focused API endpoint modules.
//!
//! Shared error types and the dependency guards live here in mod.rs.

pub mod doc;
pub mod generate;
pub mod health;
pub mod posts;
pub mod score;
pub mod styles;
pub mod usage;

use axum::http::StatusCode;
use axum::Json;
use postforge_core::PostforgeError;
use postforge_llm::{GenerateError, LlmError, PostGenerator};
use postforge_quota::UsageSnapshot;
use serde::Serialize;
use sqlx::PgPool;
use tracing::error;

use crate::db::StoreError;
use crate::state::AppState;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Present on quota rejections (429).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageSnapshot>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), usage: None }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

pub(crate) fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(msg)))
}

pub(crate) fn bad_request(msg: impl Into<String>) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, msg)
}

pub(crate) fn not_found(what: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, format!("{what} not found"))
}

/// Log the cause, return a generic 500.
pub(crate) fn internal_error(e: impl std::fmt::Display) -> ApiError {
    error!("internal error: {}", e);
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

pub(crate) fn quota_exceeded(msg: impl Into<String>, usage: UsageSnapshot) -> ApiError {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorResponse { error: msg.into(), usage: Some(usage) }),
    )
}

pub(crate) fn domain_error(e: PostforgeError) -> ApiError {
    match e {
        PostforgeError::IllegalTransition { .. } => api_error(StatusCode::CONFLICT, e.to_string()),
        _ => bad_request(e.to_string()),
    }
}

/// Map a store failure. Quota errors are handled by the generation
/// handlers, which have the usage snapshot to attach.
pub(crate) fn store_error(e: StoreError, what: &str) -> ApiError {
    match e {
        StoreError::NotFound => not_found(what),
        StoreError::Conflict(msg) => api_error(StatusCode::CONFLICT, msg),
        StoreError::Domain(e) => domain_error(e),
        StoreError::Quota(e) => api_error(StatusCode::TOO_MANY_REQUESTS, e.to_string()),
        StoreError::Db(e) => internal_error(e),
    }
}

pub(crate) fn generate_error(e: GenerateError) -> ApiError {
    match e {
        GenerateError::InvalidRequest(msg) => bad_request(msg),
        GenerateError::EmptyOutput => api_error(StatusCode::BAD_GATEWAY, e.to_string()),
        GenerateError::Llm(LlmError::NotConfigured(msg)) => {
            api_error(StatusCode::SERVICE_UNAVAILABLE, msg)
        }
        GenerateError::Llm(e) => {
            error!("LLM provider failed: {}", e);
            api_error(StatusCode::BAD_GATEWAY, "the language model request failed")
        }
    }
}

// ── Dependency guards ────────────────────────────────────────────

pub(crate) fn require_pg(state: &AppState) -> ApiResult<&PgPool> {
    state
        .pg_pool
        .as_ref()
        .ok_or_else(|| api_error(StatusCode::SERVICE_UNAVAILABLE, "PostgreSQL not configured"))
}

pub(crate) fn require_generator(state: &AppState) -> ApiResult<&PostGenerator> {
    state
        .generator
        .as_ref()
        .ok_or_else(|| api_error(StatusCode::SERVICE_UNAVAILABLE, "LLM provider not configured"))
}
