//! Post generation and regeneration. Both count against the user's quota.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use postforge_core::{Tone, UserId, VersionSource, WritingStyle};
use postforge_llm::{GenerationRequest, StyleContext};
use postforge_quota::UsageSnapshot;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::posts::ScoredPost;
use super::usage::{plan_limits, precheck, quota_rejection, today};
use super::{
    api_error, bad_request, generate_error, internal_error, not_found, require_generator, require_pg,
    store_error, ApiResult,
};
use crate::auth::AuthUser;
use crate::cache::GenerationCache;
use crate::db::StoreError;
use crate::post_store::{self, NewPost};
use crate::state::AppState;
use crate::{style_store, usage_store};

const MAX_INSTRUCTION_CHARS: usize = 500;

#[derive(Serialize, utoipa::ToSchema)]
pub struct GenerateResponse {
    /// One saved draft per requested variant.
    pub posts: Vec<ScoredPost>,
    /// Usage after this request was counted.
    pub usage: UsageSnapshot,
    /// True when the model output came from the generation cache.
    pub cached: bool,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegenerateRequest {
    /// Extra guidance for the rewrite, e.g. "shorter, add a question".
    #[serde(default)]
    pub instructions: Option<String>,
    /// Tone for the rewrite; the post's tone when omitted.
    #[serde(default)]
    pub tone: Option<Tone>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct RegenerateResponse {
    pub post: ScoredPost,
    pub usage: UsageSnapshot,
}

/// Generate posts
///
/// Writes `variants` drafts about a topic in the requested tone, imitating
/// the given writing style (or the user's default style). Each draft is
/// scored, saved as version 1, and counted against the quota.
#[utoipa::path(
    post,
    path = "/api/generate",
    tag = "Generation",
    request_body = GenerationRequest,
    responses(
        (status = 201, description = "Drafts generated and saved", body = GenerateResponse),
        (status = 400, description = "Invalid request", body = super::ErrorResponse),
        (status = 401, description = "Not signed in", body = super::ErrorResponse),
        (status = 404, description = "Writing style not found", body = super::ErrorResponse),
        (status = 429, description = "Usage limit reached", body = super::ErrorResponse),
        (status = 502, description = "Language model failed", body = super::ErrorResponse),
        (status = 503, description = "PostgreSQL or LLM not configured", body = super::ErrorResponse)
    )
)]
pub async fn generate(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(req): Json<GenerationRequest>,
) -> ApiResult<(StatusCode, Json<GenerateResponse>)> {
    req.validate().map_err(generate_error)?;
    let pool = require_pg(&state)?;
    let generator = require_generator(&state)?;

    let today = today();
    let limits = plan_limits(pool, user_id).await?;
    precheck(pool, user_id, &limits, today, req.variants).await?;

    let style = resolve_style(pool, user_id, req.style_id).await?;
    let key = GenerationCache::key(user_id, &req, style.as_ref());
    let (generated, cached) = match state.cache.get(&key) {
        Some(posts) => (posts, true),
        None => {
            let context = style.as_ref().map(StyleContext::from);
            let posts = generator
                .generate(&req, context.as_ref())
                .await
                .map_err(generate_error)?;
            state.cache.put(key, posts.clone());
            (posts, false)
        }
    };

    let mut tx = pool.begin().await.map_err(internal_error)?;
    let count = u32::try_from(generated.len()).unwrap_or(u32::MAX);
    let usage = match usage_store::record_generation(&mut tx, user_id, &limits, today, count).await {
        Ok(usage) => usage,
        Err(StoreError::Quota(e)) => {
            tx.rollback().await.map_err(internal_error)?;
            return Err(quota_rejection(pool, user_id, &limits, today, e).await);
        }
        Err(e) => return Err(store_error(e, "usage")),
    };

    let mut posts = Vec::with_capacity(generated.len());
    for g in &generated {
        let score = postforge_scoring::score(&g.content, &state.weights);
        let new = NewPost {
            user_id,
            topic: req.topic.trim(),
            tone: req.tone,
            content: &g.content,
            engagement_score: score.total,
            style_id: style.as_ref().map(|s| s.id),
        };
        let post = post_store::create_post_with_version(&mut tx, &new, VersionSource::Generated)
            .await
            .map_err(|e| store_error(e, "post"))?;
        posts.push(ScoredPost { post, score });
    }
    tx.commit().await.map_err(internal_error)?;

    info!(%user_id, count = posts.len(), cached, "generated posts");
    Ok((StatusCode::CREATED, Json(GenerateResponse { posts, usage, cached })))
}

/// Regenerate a post
///
/// Rewrites the post's current content with the model and saves the result
/// as a `regenerated` version. A `tone` override becomes the post's tone.
/// Counts as one generation; a rewrite identical to the current content is
/// rejected with 502 and not counted.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/regenerate",
    tag = "Generation",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = RegenerateRequest,
    responses(
        (status = 200, description = "Post with the rewritten content", body = RegenerateResponse),
        (status = 400, description = "Instructions too long", body = super::ErrorResponse),
        (status = 404, description = "No such post", body = super::ErrorResponse),
        (status = 429, description = "Usage limit reached", body = super::ErrorResponse),
        (status = 502, description = "Language model failed or returned the post unchanged", body = super::ErrorResponse)
    )
)]
pub async fn regenerate(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<RegenerateRequest>,
) -> ApiResult<Json<RegenerateResponse>> {
    let instructions = req.instructions.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if instructions.is_some_and(|s| s.chars().count() > MAX_INSTRUCTION_CHARS) {
        return Err(bad_request(format!(
            "instructions must be at most {MAX_INSTRUCTION_CHARS} characters"
        )));
    }
    let pool = require_pg(&state)?;
    let generator = require_generator(&state)?;

    let existing = post_store::get_post(pool, user_id, id)
        .await
        .map_err(|e| store_error(e, "post"))?
        .ok_or_else(|| not_found("post"))?;

    let today = today();
    let limits = plan_limits(pool, user_id).await?;
    precheck(pool, user_id, &limits, today, 1).await?;

    // the post's style may have been deleted since; rewrite unstyled then
    let style = match existing.style_id {
        Some(style_id) => style_store::get_style(pool, user_id, style_id)
            .await
            .map_err(internal_error)?,
        None => None,
    };
    let context = style.as_ref().map(StyleContext::from);
    let tone = req.tone.unwrap_or(existing.tone);
    let rewritten = generator
        .regenerate(&existing.content, tone, instructions, context.as_ref())
        .await
        .map_err(generate_error)?;
    if is_unchanged(&existing.content, &rewritten.content) {
        return Err(unchanged_rewrite());
    }
    let score = postforge_scoring::score(&rewritten.content, &state.weights);

    let mut tx = pool.begin().await.map_err(internal_error)?;
    let usage = match usage_store::record_generation(&mut tx, user_id, &limits, today, 1).await {
        Ok(usage) => usage,
        Err(StoreError::Quota(e)) => {
            tx.rollback().await.map_err(internal_error)?;
            return Err(quota_rejection(pool, user_id, &limits, today, e).await);
        }
        Err(e) => return Err(store_error(e, "usage")),
    };
    let appended =
        post_store::add_regenerated_version(&mut tx, user_id, id, &rewritten.content, score.total, tone)
            .await
            .map_err(|e| store_error(e, "post"))?;
    // the post may have been edited to the same text since it was read
    let Some(post) = appended else {
        tx.rollback().await.map_err(internal_error)?;
        return Err(unchanged_rewrite());
    };
    tx.commit().await.map_err(internal_error)?;

    info!(%user_id, post_id = %id, version = post.current_version, "regenerated post");
    Ok(Json(RegenerateResponse { post: ScoredPost { post, score }, usage }))
}

/// The explicitly requested style, or the user's default when none was named.
async fn resolve_style(
    pool: &PgPool,
    user_id: UserId,
    style_id: Option<Uuid>,
) -> ApiResult<Option<WritingStyle>> {
    match style_id {
        Some(id) => style_store::get_style(pool, user_id, id)
            .await
            .map_err(internal_error)?
            .map(Some)
            .ok_or_else(|| not_found("writing style")),
        None => style_store::default_style(pool, user_id).await.map_err(internal_error),
    }
}

fn is_unchanged(current: &str, rewritten: &str) -> bool {
    current.trim() == rewritten.trim()
}

fn unchanged_rewrite() -> super::ApiError {
    api_error(StatusCode::BAD_GATEWAY, "the language model returned the post unchanged")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_rewrite_is_detected() {
        assert!(is_unchanged("Hello world\n\n#rust", "  Hello world\n\n#rust\n"));
        assert!(!is_unchanged("Hello world", "Hello, world"));
    }

    #[test]
    fn unchanged_rewrite_is_bad_gateway() {
        let (status, axum::Json(body)) = unchanged_rewrite();
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.error.contains("unchanged"));
        assert!(body.usage.is_none());
    }

    #[test]
    fn regenerate_tone_is_optional() {
        let req: RegenerateRequest = serde_json::from_str(r#"{"tone":"humorous"}"#).unwrap();
        assert_eq!(req.tone, Some(Tone::Humorous));
        let req: RegenerateRequest = serde_json::from_str("{}").unwrap();
        assert!(req.tone.is_none() && req.instructions.is_none());
    }
}
