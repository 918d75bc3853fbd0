use postforge_core::Config;
use postforge_llm::PostGenerator;
use postforge_scoring::ScoringWeights;
use sqlx::PgPool;

use crate::auth::Authenticator;
use crate::cache::GenerationCache;

pub struct AppState {
    pub config: Config,
    /// `None` when Postgres is not configured; data endpoints answer 503.
    pub pg_pool: Option<PgPool>,
    /// `None` when no LLM provider is configured; generation answers 503.
    pub generator: Option<PostGenerator>,
    pub weights: ScoringWeights,
    pub cache: GenerationCache,
    pub auth: Authenticator,
}
