mod api;
mod app_config;
mod auth;
mod cache;
mod cli;
mod db;
mod post_store;
mod profile_store;
mod router;
mod startup;
mod state;
mod style_store;
mod usage_store;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    postforge_core::config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    let cli = cli::Cli::parse();
    let config = postforge_core::Config::for_profile(&cli.profile);
    cli::dispatch(cli, config).await
}
