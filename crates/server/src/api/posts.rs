//! Saved posts, their status, and their version history.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use postforge_core::{validate_post_content, Post, PostStatus, PostVersion};
use postforge_scoring::{EngagementScore, ScoringWeights};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{domain_error, internal_error, not_found, require_pg, store_error, ApiResult};
use crate::auth::AuthUser;
use crate::post_store::{self, PostFilter};
use crate::state::AppState;

// ── Request/Response types ────────────────────────

/// A post with its score breakdown recomputed from the current content.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ScoredPost {
    pub post: Post,
    pub score: EngagementScore,
}

impl ScoredPost {
    pub fn new(post: Post, weights: &ScoringWeights) -> Self {
        let score = postforge_scoring::score(&post.content, weights);
        Self { post, score }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListPostsQuery {
    /// draft, published or archived
    pub status: Option<String>,
    /// Page size, 1-100 (default 20)
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostListResponse {
    pub posts: Vec<Post>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdatePostRequest {
    pub content: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct StatusRequest {
    pub status: PostStatus,
}

// ── Posts ─────────────────────────────────────────

/// List saved posts
///
/// Newest first, optionally filtered by status.
#[utoipa::path(
    get,
    path = "/api/posts",
    tag = "Posts",
    params(ListPostsQuery),
    responses(
        (status = 200, description = "One page of posts", body = PostListResponse),
        (status = 400, description = "Unknown status filter", body = super::ErrorResponse)
    )
)]
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListPostsQuery>,
) -> ApiResult<Json<PostListResponse>> {
    let pool = require_pg(&state)?;
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(str::parse::<PostStatus>)
        .transpose()
        .map_err(domain_error)?;
    let filter = PostFilter { status, limit: query.limit, offset: query.offset };

    let (posts, total) = post_store::list_posts(pool, user_id, &filter)
        .await
        .map_err(|e| store_error(e, "post"))?;
    Ok(Json(PostListResponse {
        posts,
        total,
        limit: filter.limit(),
        offset: filter.offset(),
    }))
}

/// Get a post
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "Posts",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "The post with its score breakdown", body = ScoredPost),
        (status = 404, description = "No such post", body = super::ErrorResponse)
    )
)]
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ScoredPost>> {
    let pool = require_pg(&state)?;
    let post = post_store::get_post(pool, user_id, id)
        .await
        .map_err(|e| store_error(e, "post"))?
        .ok_or_else(|| not_found("post"))?;
    Ok(Json(ScoredPost::new(post, &state.weights)))
}

/// Edit a post
///
/// Saves the new content as an `edited` version and rescores it.
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    tag = "Posts",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated post", body = ScoredPost),
        (status = 400, description = "Empty or too long", body = super::ErrorResponse),
        (status = 404, description = "No such post", body = super::ErrorResponse)
    )
)]
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePostRequest>,
) -> ApiResult<Json<ScoredPost>> {
    validate_post_content(&req.content).map_err(domain_error)?;
    let pool = require_pg(&state)?;
    let content = req.content.trim();
    let score = postforge_scoring::score(content, &state.weights);

    let mut tx = pool.begin().await.map_err(internal_error)?;
    let post = post_store::update_content(&mut tx, user_id, id, content, score.total)
        .await
        .map_err(|e| store_error(e, "post"))?;
    tx.commit().await.map_err(internal_error)?;

    Ok(Json(ScoredPost { post, score }))
}

/// Delete a post and its history
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "Posts",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such post", body = super::ErrorResponse)
    )
)]
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let pool = require_pg(&state)?;
    if post_store::delete_post(pool, user_id, id).await.map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("post"))
    }
}

/// Change a post's status
///
/// Allowed moves: draft to published or archived, published to archived,
/// archived back to draft.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/status",
    tag = "Posts",
    params(("id" = Uuid, Path, description = "Post id")),
    request_body = StatusRequest,
    responses(
        (status = 200, description = "Updated post", body = Post),
        (status = 404, description = "No such post", body = super::ErrorResponse),
        (status = 409, description = "Transition not allowed", body = super::ErrorResponse)
    )
)]
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<Post>> {
    let pool = require_pg(&state)?;
    let mut tx = pool.begin().await.map_err(internal_error)?;
    let post = post_store::set_status(&mut tx, user_id, id, req.status)
        .await
        .map_err(|e| store_error(e, "post"))?;
    tx.commit().await.map_err(internal_error)?;
    Ok(Json(post))
}

// ── Versions ──────────────────────────────────────

/// List a post's versions
#[utoipa::path(
    get,
    path = "/api/posts/{id}/versions",
    tag = "Versions",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Versions, oldest first", body = Vec<PostVersion>),
        (status = 404, description = "No such post", body = super::ErrorResponse)
    )
)]
pub async fn list_versions(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<PostVersion>>> {
    let pool = require_pg(&state)?;
    post_store::list_versions(pool, user_id, id)
        .await
        .map_err(|e| store_error(e, "post"))?
        .map(Json)
        .ok_or_else(|| not_found("post"))
}

/// Get one version
#[utoipa::path(
    get,
    path = "/api/posts/{id}/versions/{n}",
    tag = "Versions",
    params(
        ("id" = Uuid, Path, description = "Post id"),
        ("n" = i32, Path, description = "Version number")
    ),
    responses(
        (status = 200, description = "The version", body = PostVersion),
        (status = 404, description = "No such post or version", body = super::ErrorResponse)
    )
)]
pub async fn get_version(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path((id, n)): Path<(Uuid, i32)>,
) -> ApiResult<Json<PostVersion>> {
    let pool = require_pg(&state)?;
    post_store::get_version(pool, user_id, id, n)
        .await
        .map_err(|e| store_error(e, "version"))?
        .map(Json)
        .ok_or_else(|| not_found("version"))
}

/// Restore an old version
///
/// Copies version `n` into a new `restored` version; history is never rewritten.
#[utoipa::path(
    post,
    path = "/api/posts/{id}/versions/{n}/restore",
    tag = "Versions",
    params(
        ("id" = Uuid, Path, description = "Post id"),
        ("n" = i32, Path, description = "Version number to restore")
    ),
    responses(
        (status = 200, description = "Post with the restored content", body = ScoredPost),
        (status = 404, description = "No such post or version", body = super::ErrorResponse)
    )
)]
pub async fn restore_version(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path((id, n)): Path<(Uuid, i32)>,
) -> ApiResult<Json<ScoredPost>> {
    let pool = require_pg(&state)?;
    let weights = &state.weights;

    let mut tx = pool.begin().await.map_err(internal_error)?;
    let post = post_store::restore_version(&mut tx, user_id, id, n, |content| {
        postforge_scoring::score(content, weights).total
    })
    .await
    .map_err(|e| store_error(e, "version"))?;
    tx.commit().await.map_err(internal_error)?;

    Ok(Json(ScoredPost::new(post, weights)))
}
