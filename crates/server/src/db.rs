use postforge_core::config::PostgresConfig;
use postforge_core::PostforgeError;
use postforge_quota::QuotaError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

/// Errors surfaced by the `*_store` modules.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Domain(#[from] PostforgeError),
    #[error(transparent)]
    Quota(#[from] QuotaError),
}

/// Create a PostgreSQL connection pool and run migrations.
/// Returns None if Postgres is not configured or unreachable.
pub async fn init_pg_pool(config: &PostgresConfig) -> Option<PgPool> {
    if !config.is_configured() {
        warn!("DATABASE_URL / PG_USERNAME not set, data endpoints will answer 503");
        return None;
    }

    let pool = match connect(config).await {
        Ok(pool) => pool,
        Err(e) => {
            warn!("Failed to connect to PostgreSQL: {} (data endpoints disabled)", e);
            return None;
        }
    };
    info!("PostgreSQL connected: {}", config.host);

    match migrate(&pool).await {
        Ok(()) => Some(pool),
        Err(e) => {
            warn!("Failed to run migrations: {} (data endpoints disabled)", e);
            None
        }
    }
}

pub async fn connect(config: &PostgresConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url())
        .await
}

pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied successfully");
    Ok(())
}

/// Scores are stored as SMALLINT; anything outside 0..=100 is clamped on read.
pub(crate) fn score_from_db(value: i16) -> u8 {
    value.clamp(0, 100) as u8
}

pub(crate) fn count_from_db(value: i32) -> u32 {
    value.max(0) as u32
}

pub(crate) fn count_to_db(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}
