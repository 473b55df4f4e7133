//! aichat cli definition and entrypoint.
mod chat;
pub mod ux;

use std::path::PathBuf;

use aichat_core::config::{create_or_get_config_file, get_config};
use anyhow::{Context, Result, bail};
use clap::Parser;

use crate::log::setup_logging;

/// aichat - chat with OpenAI, Azure OpenAI and Perplexity models in the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Configuration to start with, by name or number.
    #[arg(long)]
    configuration: Option<String>,

    /// Show verbose logs.
    #[arg(short, long)]
    verbose: bool,
}

/// Runs the main CLI application.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        setup_logging().context("Failed to set up logging")?;
    }

    let (exists, config_file) =
        create_or_get_config_file(cli.config).context("Failed to locate configuration file")?;
    if !exists {
        bail!(
            "Created sample settings file {}, please enter api keys and restart.",
            config_file.display()
        );
    }

    let config = get_config(&config_file).context("Failed to load configuration")?;
    chat::execute(&config, cli.configuration.as_deref()).await
}
