// Pilot Agent
// Main entry point for the pilot binary

use clap::Parser;
use pilot_engine::cli::{Cli, Command};
use pilot_engine::config::Config;
use pilot_engine::handlers::{handle_ask, handle_chat, handle_tools, OutputFormat};
use pilot_engine::telemetry::init_telemetry_with_level;

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

    // --log wins over the config file; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::debug!("Pilot v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Handle commands
    match cli.command {
        Command::Chat { api_key } => handle_chat(&config, api_key, format).await,

        Command::Ask { message, api_key } => {
            tracing::info!("Asking: {}", message);
            handle_ask(message, &config, api_key, format).await
        }

        Command::Tools => handle_tools(format).await,
    }
}
