use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use postforge_core::MAX_POST_CHARS;
use postforge_scoring::EngagementScore;
use serde::Deserialize;

use super::{bad_request, ApiResult};
use crate::state::AppState;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ScoreRequest {
    pub content: String,
}

/// Score arbitrary post text
///
/// Runs the engagement heuristic without storing anything. No sign-in required.
#[utoipa::path(
    post,
    path = "/api/score",
    tag = "Scoring",
    request_body = ScoreRequest,
    responses(
        (status = 200, description = "Engagement score with breakdown and suggestions", body = EngagementScore),
        (status = 400, description = "Content too long", body = super::ErrorResponse)
    )
)]
pub async fn score(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScoreRequest>,
) -> ApiResult<Json<EngagementScore>> {
    let chars = req.content.chars().count();
    if chars > MAX_POST_CHARS {
        return Err(bad_request(format!(
            "content is {chars} characters, limit is {MAX_POST_CHARS}"
        )));
    }
    Ok(Json(postforge_scoring::score(&req.content, &state.weights)))
}
