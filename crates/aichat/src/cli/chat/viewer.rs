//! Hands an answer to an external viewer program.
use anyhow::{Context, Result};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Starts `program -t <title>` and writes `text` to its stdin. The viewer
/// keeps running after the text is written; it is not awaited.
pub async fn open_viewer(program: &str, title: &str, text: &str) -> Result<()> {
    let mut child = Command::new(program)
        .arg("-t")
        .arg(title)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("Failed to start viewer '{program}'"))?;

    let mut stdin = child
        .stdin
        .take()
        .context("Viewer stdin is not available")?;
    stdin
        .write_all(text.as_bytes())
        .await
        .context("Failed to write answer to viewer")?;
    stdin.shutdown().await?;
    drop(stdin);
    debug!(program, title, "Viewer started");

    // Reap the process once the user closes it
    tokio::spawn(async move {
        if let Err(e) = child.wait().await {
            warn!(error = %e, "Viewer did not exit cleanly");
        }
    });
    Ok(())
}
