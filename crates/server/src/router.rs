//! HTTP router construction.
//!
//! Assembles all Axum routes, middleware, and OpenAPI docs into a single `Router`.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Request bodies are small JSON documents; style samples are the largest.
const MAX_BODY_BYTES: usize = 256 * 1024;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(api::health::health))
        .route("/config", get(api::health::config))
        .route("/api/score", post(api::score::score))
        .route("/api/generate", post(api::generate::generate))
        .route("/api/posts", get(api::posts::list_posts))
        .route(
            "/api/posts/{id}",
            get(api::posts::get_post)
                .put(api::posts::update_post)
                .delete(api::posts::delete_post),
        )
        .route("/api/posts/{id}/status", post(api::posts::set_status))
        .route("/api/posts/{id}/regenerate", post(api::generate::regenerate))
        .route("/api/posts/{id}/versions", get(api::posts::list_versions))
        .route("/api/posts/{id}/versions/{n}", get(api::posts::get_version))
        .route(
            "/api/posts/{id}/versions/{n}/restore",
            post(api::posts::restore_version),
        )
        .route(
            "/api/styles",
            get(api::styles::list_styles).post(api::styles::create_style),
        )
        .route(
            "/api/styles/{id}",
            get(api::styles::get_style)
                .put(api::styles::update_style)
                .delete(api::styles::delete_style),
        )
        .route("/api/styles/{id}/default", post(api::styles::set_default_style))
        .route("/api/usage", get(api::usage::usage))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin.trim() == "*" {
        return CorsLayer::permissive();
    }
    match origin.trim().parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!("Invalid CORS_ORIGIN '{}': {} (allowing any origin)", origin, e);
            CorsLayer::permissive()
        }
    }
}
