use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use postforge_core::{WritingStyle, WritingStyleInput};
use uuid::Uuid;

use super::{domain_error, internal_error, not_found, require_pg, store_error, ApiResult};
use crate::auth::AuthUser;
use crate::state::AppState;
use crate::style_store;

/// List writing styles
#[utoipa::path(
    get,
    path = "/api/styles",
    tag = "Styles",
    responses((status = 200, description = "Styles, default first", body = Vec<WritingStyle>))
)]
pub async fn list_styles(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Json<Vec<WritingStyle>>> {
    let pool = require_pg(&state)?;
    let styles = style_store::list_styles(pool, user_id).await.map_err(internal_error)?;
    Ok(Json(styles))
}

/// Create a writing style
///
/// 1-5 sample posts in the author's voice. The first style becomes the default.
#[utoipa::path(
    post,
    path = "/api/styles",
    tag = "Styles",
    request_body = WritingStyleInput,
    responses(
        (status = 201, description = "Created", body = WritingStyle),
        (status = 400, description = "Invalid name or samples", body = super::ErrorResponse),
        (status = 409, description = "Name already used", body = super::ErrorResponse)
    )
)]
pub async fn create_style(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(input): Json<WritingStyleInput>,
) -> ApiResult<(StatusCode, Json<WritingStyle>)> {
    let input = input.normalized().map_err(domain_error)?;
    let pool = require_pg(&state)?;
    let style = style_store::create_style(pool, user_id, &input)
        .await
        .map_err(|e| store_error(e, "writing style"))?;
    Ok((StatusCode::CREATED, Json(style)))
}

/// Get a writing style
#[utoipa::path(
    get,
    path = "/api/styles/{id}",
    tag = "Styles",
    params(("id" = Uuid, Path, description = "Style id")),
    responses(
        (status = 200, description = "The style", body = WritingStyle),
        (status = 404, description = "No such style", body = super::ErrorResponse)
    )
)]
pub async fn get_style(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WritingStyle>> {
    let pool = require_pg(&state)?;
    style_store::get_style(pool, user_id, id)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("writing style"))
}

/// Replace a writing style
#[utoipa::path(
    put,
    path = "/api/styles/{id}",
    tag = "Styles",
    params(("id" = Uuid, Path, description = "Style id")),
    request_body = WritingStyleInput,
    responses(
        (status = 200, description = "Updated", body = WritingStyle),
        (status = 400, description = "Invalid name or samples", body = super::ErrorResponse),
        (status = 404, description = "No such style", body = super::ErrorResponse),
        (status = 409, description = "Name already used", body = super::ErrorResponse)
    )
)]
pub async fn update_style(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(input): Json<WritingStyleInput>,
) -> ApiResult<Json<WritingStyle>> {
    let input = input.normalized().map_err(domain_error)?;
    let pool = require_pg(&state)?;
    style_store::update_style(pool, user_id, id, &input)
        .await
        .map_err(|e| store_error(e, "writing style"))?
        .map(Json)
        .ok_or_else(|| not_found("writing style"))
}

/// Delete a writing style
///
/// Posts written with it are kept.
#[utoipa::path(
    delete,
    path = "/api/styles/{id}",
    tag = "Styles",
    params(("id" = Uuid, Path, description = "Style id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such style", body = super::ErrorResponse)
    )
)]
pub async fn delete_style(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let pool = require_pg(&state)?;
    if style_store::delete_style(pool, user_id, id).await.map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("writing style"))
    }
}

/// Make a style the default
#[utoipa::path(
    post,
    path = "/api/styles/{id}/default",
    tag = "Styles",
    params(("id" = Uuid, Path, description = "Style id")),
    responses(
        (status = 200, description = "The new default style", body = WritingStyle),
        (status = 404, description = "No such style", body = super::ErrorResponse)
    )
)]
pub async fn set_default_style(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<WritingStyle>> {
    let pool = require_pg(&state)?;
    style_store::set_default_style(pool, user_id, id)
        .await
        .map_err(internal_error)?
        .map(Json)
        .ok_or_else(|| not_found("writing style"))
}
