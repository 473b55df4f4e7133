use std::time::Duration;
use thiserror::Error;

/// Failure reported by a model backend. Always carries the provider's text.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Provider returned status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("Request timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Other(String),
}

/// Errors surfaced by the chat session.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("{0}")]
    EmptyInput(String),
    #[error("Configuration \"{0}\" not found.")]
    ConfigurationNotFound(String),
    #[error("No configurations defined.")]
    NoConfigurations,
    #[error("Failed to create model for configuration \"{name}\": {reason}")]
    ModelInit { name: String, reason: String },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("{0}")]
    SystemMessage(String),
    #[error("File system error: {0}")]
    Io(#[from] std::io::Error),
}
