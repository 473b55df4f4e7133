use crate::cli::chat::commands::default_registry;
use crate::cli::chat::repl::Dispatcher;
use aichat_core::config::Config;
use aichat_core::session::ChatSession;
use anyhow::{Context, Result};
use tracing::debug;

mod commands;
mod compl;
mod registry;
mod repl;
mod test_utils;
mod viewer;

/// Starts an interactive chat, optionally with `configuration` (name or
/// 1-based number) active instead of the first one.
pub async fn execute(config: &Config, configuration: Option<&str>) -> Result<()> {
    let mut session = ChatSession::new(config).context("Failed to initialize chat session")?;
    if let Some(name) = configuration {
        let active = session
            .set_configuration(name)
            .context("Failed to select configuration")?;
        debug!(configuration = %active.name, "Starting with configuration");
    }

    let dispatcher = Dispatcher::new(session, default_registry(), config.viewer.clone());
    repl::run(dispatcher).await
}
