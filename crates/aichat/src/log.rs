//! Logging for aichat.
use anyhow::Context;
use aichat_core::get_data_dir;
use std::io::LineWriter;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::OffsetTime;

const MAX_LOG_SIZE: u64 = 100 * 1024;

/// Sets up file logging in `<data_dir>/aichat.log`.
///
/// A log larger than 100KB is moved to `aichat.log.old` first, replacing any
/// older backup. Both crates log at DEBUG, rustyline at INFO.
pub fn setup_logging() -> anyhow::Result<()> {
    let data_dir = get_data_dir().context("Failed to get data directory")?;
    let log_path = data_dir.join("aichat.log");

    if log_path.exists() {
        let metadata = std::fs::metadata(&log_path)?;
        if metadata.len() > MAX_LOG_SIZE {
            let backup_path = data_dir.join("aichat.log.old");
            if backup_path.exists() {
                std::fs::remove_file(&backup_path)?;
            }
            std::fs::rename(&log_path, backup_path)?;
        }
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    // Flush after every line
    let writer = Mutex::new(LineWriter::new(log_file));

    tracing_subscriber::fmt()
        .with_env_filter("aichat=debug,aichat_core=debug,rustyline=info")
        .with_writer(writer)
        .with_ansi(false)
        .with_timer(OffsetTime::local_rfc_3339()?)
        .init();
    Ok(())
}
