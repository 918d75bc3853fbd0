//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers and `ToSchema`-derived
//! types into a single OpenAPI document, served via Scalar UI at `/docs`.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "postforge API",
        version = "0.1.0",
        description = "LinkedIn post generation with engagement scoring, writing styles, version history and plan-based usage limits.",
    ),
    modifiers(&BearerAuth),
    security(("bearer" = [])),
    tags(
        (name = "Health", description = "Server health and redacted configuration"),
        (name = "Scoring", description = "Engagement score heuristic"),
        (name = "Generation", description = "LLM post generation and regeneration (counts against quota)"),
        (name = "Posts", description = "Saved posts and status lifecycle"),
        (name = "Versions", description = "Post version history and restore"),
        (name = "Styles", description = "Writing style profiles used as few-shot examples"),
        (name = "Usage", description = "Daily and monthly generation quota"),
    ),
    paths(
        crate::api::health::health,
        crate::api::health::config,
        crate::api::score::score,
        crate::api::generate::generate,
        crate::api::generate::regenerate,
        crate::api::posts::list_posts,
        crate::api::posts::get_post,
        crate::api::posts::update_post,
        crate::api::posts::delete_post,
        crate::api::posts::set_status,
        crate::api::posts::list_versions,
        crate::api::posts::get_version,
        crate::api::posts::restore_version,
        crate::api::styles::list_styles,
        crate::api::styles::create_style,
        crate::api::styles::get_style,
        crate::api::styles::update_style,
        crate::api::styles::delete_style,
        crate::api::styles::set_default_style,
        crate::api::usage::usage,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        crate::api::score::ScoreRequest,
        crate::api::generate::GenerateResponse,
        crate::api::generate::RegenerateRequest,
        crate::api::generate::RegenerateResponse,
        crate::api::posts::ScoredPost,
        crate::api::posts::PostListResponse,
        crate::api::posts::UpdatePostRequest,
        crate::api::posts::StatusRequest,
    ))
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("bearer", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}
