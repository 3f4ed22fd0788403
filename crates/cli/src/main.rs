//! Parley CLI — the main entry point.
//!
//! Commands:
//! - `chat`     — Interactive chat or single-message mode
//! - `logs`     — Print the interaction log
//! - `onboard`  — Write a default config file
//! - `status`   — Show the effective configuration
//! - `pricing`  — List known model prices

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "parley",
    about = "Parley — chat with an LLM that remembers the last few turns",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Use this config file instead of ~/.parley/config.toml
    #[arg(long, global = true, env = "PARLEY_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Print logged interactions, oldest first
    Logs {
        /// Only show the most recent N records
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Write a default configuration file
    Onboard,

    /// Show the effective configuration
    Status {
        /// Also ask the provider whether it is reachable
        #[arg(long)]
        check: bool,
    },

    /// List model pricing (per 1M tokens)
    Pricing,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    let config_path = cli
        .config
        .unwrap_or_else(parley_config::AppConfig::config_path);

    match cli.command {
        Commands::Chat { message } => commands::chat::run(&config_path, message).await?,
        Commands::Logs { limit } => commands::logs::run(&config_path, limit).await?,
        Commands::Onboard => commands::onboard::run(&config_path).await?,
        Commands::Status { check } => commands::status::run(&config_path, check).await?,
        Commands::Pricing => commands::pricing::run(&config_path).await?,
    }

    Ok(())
}
