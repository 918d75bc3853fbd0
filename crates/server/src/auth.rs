//! Request authentication.
//!
//! In `supabase` mode the bearer token is resolved by the hosted Supabase
//! auth API. In `header` mode an `x-user-id` header is trusted as-is, for
//! local development and tests only.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::Json;
use postforge_core::config::SupabaseConfig;
use postforge_core::UserId;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::ErrorResponse;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

pub enum Authenticator {
    Supabase {
        client: reqwest::Client,
        url: String,
        anon_key: String,
    },
    Header,
    /// Supabase mode selected but not configured: every request is rejected.
    Unavailable,
}

#[derive(Deserialize)]
struct SupabaseUser {
    id: Uuid,
}

impl Authenticator {
    pub fn from_config(config: &SupabaseConfig) -> Self {
        match config.auth_mode.as_str() {
            "header" => {
                warn!("AUTH_MODE=header trusts the {} header; do not expose this server", USER_ID_HEADER);
                Authenticator::Header
            }
            mode => {
                if mode != "supabase" {
                    warn!("Unknown AUTH_MODE '{}', falling back to supabase", mode);
                }
                match (&config.url, &config.anon_key) {
                    (Some(url), Some(anon_key)) => Authenticator::Supabase {
                        client: reqwest::Client::new(),
                        url: url.clone(),
                        anon_key: anon_key.clone(),
                    },
                    _ => {
                        warn!("SUPABASE_URL / SUPABASE_ANON_KEY not set, authenticated endpoints will answer 401");
                        Authenticator::Unavailable
                    }
                }
            }
        }
    }

    pub fn mode(&self) -> &'static str {
        match self {
            Authenticator::Supabase { .. } => "supabase",
            Authenticator::Header => "header",
            Authenticator::Unavailable => "unavailable",
        }
    }

    async fn authenticate(&self, parts: &Parts) -> Result<UserId, &'static str> {
        match self {
            Authenticator::Header => {
                let raw = parts
                    .headers
                    .get(USER_ID_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .ok_or("missing x-user-id header")?;
                Uuid::parse_str(raw.trim()).map_err(|_| "x-user-id is not a UUID")
            }
            Authenticator::Supabase { client, url, anon_key } => {
                let token = bearer_token(parts).ok_or("missing bearer token")?;
                let resp = client
                    .get(format!("{url}/auth/v1/user"))
                    .header("apikey", anon_key)
                    .bearer_auth(token)
                    .send()
                    .await
                    .map_err(|e| {
                        warn!("Supabase auth request failed: {}", e);
                        "authentication service unavailable"
                    })?;
                if !resp.status().is_success() {
                    debug!(status = %resp.status(), "Supabase rejected token");
                    return Err("invalid or expired token");
                }
                let user: SupabaseUser = resp.json().await.map_err(|e| {
                    warn!("Unreadable Supabase user response: {}", e);
                    "invalid or expired token"
                })?;
                Ok(user.id)
            }
            Authenticator::Unavailable => Err("authentication is not configured"),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// The authenticated caller. Add it to a handler's arguments to require auth.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state
            .auth
            .authenticate(parts)
            .await
            .map(AuthUser)
            .map_err(|msg| (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(msg))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/api/usage");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn parses_bearer_tokens() {
        assert_eq!(bearer_token(&parts(&[("authorization", "Bearer abc.def")])), Some("abc.def"));
        assert_eq!(bearer_token(&parts(&[("authorization", "bearer  xyz ")])), Some("xyz"));
        assert_eq!(bearer_token(&parts(&[("authorization", "Basic abc")])), None);
        assert_eq!(bearer_token(&parts(&[("authorization", "Bearer ")])), None);
        assert_eq!(bearer_token(&parts(&[])), None);
    }

    #[tokio::test]
    async fn header_mode_reads_user_id() {
        let id = Uuid::new_v4();
        let auth = Authenticator::Header;
        let got = auth.authenticate(&parts(&[(USER_ID_HEADER, &id.to_string())])).await;
        assert_eq!(got, Ok(id));
        assert!(auth.authenticate(&parts(&[(USER_ID_HEADER, "bob")])).await.is_err());
        assert!(auth.authenticate(&parts(&[])).await.is_err());
    }

    #[tokio::test]
    async fn unconfigured_supabase_rejects_everything() {
        let config = SupabaseConfig {
            url: None,
            anon_key: None,
            auth_mode: "supabase".into(),
        };
        let auth = Authenticator::from_config(&config);
        assert_eq!(auth.mode(), "unavailable");
        let err = auth
            .authenticate(&parts(&[("authorization", "Bearer t")]))
            .await
            .unwrap_err();
        assert_eq!(err, "authentication is not configured");
    }

    #[tokio::test]
    async fn supabase_mode_requires_a_token() {
        let auth = Authenticator::Supabase {
            client: reqwest::Client::new(),
            url: "http://127.0.0.1:9".into(),
            anon_key: "anon".into(),
        };
        assert_eq!(auth.authenticate(&parts(&[])).await, Err("missing bearer token"));
    }
}
