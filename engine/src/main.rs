// Matchday stadium assistant
// Main entry point for the matchday binary

use clap::Parser;
use matchday_engine::cli::{Cli, Command};
use matchday_engine::config::Config;
use matchday_engine::handlers::{
    handle_chat, handle_config, handle_orders, handle_secret, handle_serve, OutputFormat,
};
use matchday_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // --log beats the config level; RUST_LOG beats both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Matchday v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    match cli.command {
        Command::Serve { host, port } => {
            tracing::info!("Starting API server...");
            handle_serve(config, host, port).await
        }

        Command::Chat { query, session } => handle_chat(config, query, session, format).await,

        Command::Orders => handle_orders(&config, format).await,

        Command::Config => handle_config(&config, format),

        Command::Secret { action } => handle_secret(action, format).await,
    }
}
