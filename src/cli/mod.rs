//! Command-line interface.
//!
//! Parses arguments, loads configuration and dispatches to the command
//! modules.

mod commands;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use eventradar::config::Config;

#[derive(Parser)]
#[command(name = "eventradar")]
#[command(about = "Concurrent event-listing scraper with AI enrichment")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run every source (or the named ones) concurrently
    Scrape {
        /// Source names to run (default: all registered sources)
        sources: Vec<String>,
        /// Enrich the scraped events through the AI backend
        #[arg(short, long)]
        enrich: bool,
        /// Write the deduplicated events as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Cancel the run after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// List the sources that would be registered
    Sources,

    /// Run classification, summary, keywords and sentiment for one event
    Enrich {
        /// Event title
        #[arg(long)]
        title: String,
        /// Event description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Show AI backend availability
    AiStatus,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    match cli.command {
        Commands::Scrape {
            sources,
            enrich,
            output,
            timeout,
        } => commands::scrape::cmd_scrape(&config, &sources, enrich, output.as_deref(), timeout).await,
        Commands::Sources => commands::sources::cmd_sources(&config).await,
        Commands::Enrich { title, description } => {
            commands::enrich::cmd_enrich(&config, &title, &description).await
        }
        Commands::AiStatus => commands::enrich::cmd_ai_status(&config).await,
    }
}
