//! Server startup: shared state initialization.

use std::sync::Arc;
use std::time::Duration;

use postforge_core::Config;
use tracing::info;

use crate::app_config;
use crate::auth::Authenticator;
use crate::cache::GenerationCache;
use crate::db;
use crate::state::AppState;

pub async fn build_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let weights = app_config::load_weights(&config)?;
    let generator = app_config::build_generator(&config)?;
    let pg_pool = db::init_pg_pool(&config.postgres).await;
    let auth = Authenticator::from_config(&config.supabase);
    info!("Authentication mode: {}", auth.mode());

    let cache = GenerationCache::new(
        config.generation.cache_size,
        Duration::from_secs(config.generation.cache_ttl_secs),
    );

    Ok(Arc::new(AppState {
        config,
        pg_pool,
        generator,
        weights,
        cache,
        auth,
    }))
}
