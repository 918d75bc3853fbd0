//! CLI argument parsing and subcommand dispatch.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use postforge_core::{Config, PlanTier};
use tracing::info;
use uuid::Uuid;

use crate::{app_config, db, profile_store, router, startup};

#[derive(Debug, Parser)]
#[command(name = "postforge-server", version, about = "LinkedIn post generator API")]
pub struct Cli {
    /// Config profile; keys resolve as {PROFILE}_{KEY} before {KEY}.
    #[arg(long, global = true, env = "POSTFORGE_PROFILE", default_value = "")]
    pub profile: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (the default).
    Serve {
        /// Override HOST.
        #[arg(long)]
        host: Option<String>,
        /// Override PORT.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply database migrations and exit.
    Migrate,
    /// Print the engagement score of a text file as JSON.
    Score {
        file: PathBuf,
        /// Scoring weights YAML; SCORING_CONFIG or the built-in weights otherwise.
        #[arg(long)]
        weights: Option<PathBuf>,
    },
    /// Set a user's plan tier (free, pro, business).
    SetPlan { user_id: Uuid, plan: PlanTier },
}

pub async fn dispatch(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    let command = cli.command.unwrap_or(Command::Serve { host: None, port: None });
    match command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
        Command::Migrate => {
            let pool = connect_pg(&config).await?;
            db::migrate(&pool).await?;
            Ok(())
        }
        Command::Score { file, weights } => {
            if weights.is_some() {
                config.generation.scoring_config = weights;
            }
            let weights = app_config::load_weights(&config)?;
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let score = postforge_scoring::score(&text, &weights);
            println!("{}", serde_json::to_string_pretty(&score)?);
            Ok(())
        }
        Command::SetPlan { user_id, plan } => {
            let pool = connect_pg(&config).await?;
            profile_store::set_plan(&pool, user_id, plan).await?;
            info!(%user_id, %plan, "plan updated");
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    config.log_summary();
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = startup::build_app_state(config).await?;
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn connect_pg(config: &Config) -> anyhow::Result<sqlx::PgPool> {
    if !config.postgres.is_configured() {
        anyhow::bail!("PostgreSQL is not configured (set DATABASE_URL or PG_USERNAME)");
    }
    db::connect(&config.postgres)
        .await
        .context("failed to connect to PostgreSQL")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["postforge-server"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_score_and_set_plan() {
        let cli = Cli::try_parse_from(["postforge-server", "score", "post.txt", "--weights", "w.yml"]).unwrap();
        match cli.command {
            Some(Command::Score { file, weights }) => {
                assert_eq!(file, PathBuf::from("post.txt"));
                assert_eq!(weights, Some(PathBuf::from("w.yml")));
            }
            other => panic!("unexpected {other:?}"),
        }

        let id = Uuid::new_v4();
        let cli = Cli::try_parse_from(["postforge-server", "set-plan", &id.to_string(), "Pro"]).unwrap();
        match cli.command {
            Some(Command::SetPlan { user_id, plan }) => {
                assert_eq!(user_id, id);
                assert_eq!(plan, PlanTier::Pro);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_plan() {
        let id = Uuid::new_v4().to_string();
        assert!(Cli::try_parse_from(["postforge-server", "set-plan", &id, "team"]).is_err());
    }
}
