use std::{
    collections::HashSet,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::{
    assets::{get_config_dir, get_default_config, system_message_dirs},
    model::{ChatConfiguration, ModelProvider},
};

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Error, Debug)]
pub enum ChatConfigError {
    #[error("File system error: {0}")]
    IO(#[from] std::io::Error),
    #[error("YAML parsing error: {0}")]
    YAMLError(#[from] serde_yaml::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A configuration entry as written in the config file. One entry expands
/// into one [`ChatConfiguration`] per comma-separated model name.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawConfiguration {
    pub name: String,
    #[serde(alias = "type")]
    pub provider: ModelProvider,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: String,
    #[serde(alias = "model")]
    pub models: String,
}

impl RawConfiguration {
    fn model_names(&self) -> Vec<&str> {
        self.models
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .collect()
    }

    /// Expands the entry, naming each result "{name} {model}" when the entry
    /// lists several models and "{name}" otherwise.
    pub fn expand(&self) -> Vec<ChatConfiguration> {
        let models = self.model_names();
        let qualify = models.len() > 1;
        models
            .into_iter()
            .map(|model| ChatConfiguration {
                name: if qualify {
                    format!("{} {}", self.name, model)
                } else {
                    self.name.clone()
                },
                provider: self.provider,
                endpoint: self.endpoint.clone(),
                api_key: self.api_key.clone(),
                model: model.to_string(),
            })
            .collect()
    }
}

/// Expands raw entries in order, rejecting lists that are empty or contain
/// duplicate names (compared case-insensitively).
pub fn expand_configurations(
    raw: &[RawConfiguration],
) -> Result<Vec<ChatConfiguration>, ChatConfigError> {
    let mut seen = HashSet::new();
    let mut configurations = Vec::new();
    for entry in raw {
        let expanded = entry.expand();
        if expanded.is_empty() {
            return Err(ChatConfigError::Config(format!(
                "Configuration '{}' lists no models",
                entry.name
            )));
        }
        for configuration in expanded {
            if !seen.insert(configuration.name.to_lowercase()) {
                return Err(ChatConfigError::Config(format!(
                    "Duplicate configuration name '{}'",
                    configuration.name
                )));
            }
            configurations.push(configuration);
        }
    }

    if configurations.is_empty() {
        return Err(ChatConfigError::Config(
            "No configurations defined".to_string(),
        ));
    }
    Ok(configurations)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub configurations: Vec<ChatConfiguration>,
    pub title_configuration: Option<String>,
    pub request_timeout: Duration,
    pub viewer: Option<String>,
    pub system_message_dirs: Vec<PathBuf>,
}

#[derive(Deserialize, Debug)]
struct RawConfig {
    #[serde(default)]
    configurations: Vec<RawConfiguration>,
    title_configuration: Option<String>,
    request_timeout_secs: Option<u64>,
    viewer: Option<String>,
}

impl RawConfig {
    #[instrument(skip(self))]
    fn to_config(&self, config_dir: &Path) -> Result<Config, ChatConfigError> {
        let configurations = expand_configurations(&self.configurations)?;

        let title_configuration = self
            .title_configuration
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        if let Some(name) = title_configuration
            && !configurations.iter().any(|c| c.is_named(name))
        {
            return Err(ChatConfigError::Config(format!(
                "Title configuration '{name}' not found"
            )));
        }

        let request_timeout_secs = self
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
        if request_timeout_secs == 0 {
            return Err(ChatConfigError::Config(
                "'request_timeout_secs' must be greater than 0".to_string(),
            ));
        }

        Ok(Config {
            configurations,
            title_configuration: title_configuration.map(str::to_string),
            request_timeout: Duration::from_secs(request_timeout_secs),
            viewer: self.viewer.clone().filter(|v| !v.trim().is_empty()),
            system_message_dirs: system_message_dirs(config_dir),
        })
    }
}

/// Returns the config file path and whether it existed. A missing file is
/// created with sample content.
#[instrument(skip(config_path))]
pub fn create_or_get_config_file(
    config_path: Option<PathBuf>,
) -> Result<(bool, PathBuf), ChatConfigError> {
    let actual_path = config_path.unwrap_or_else(|| get_config_dir().join("aichat.yml"));

    let parent_dir = actual_path.parent().ok_or_else(|| {
        ChatConfigError::IO(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "Config path has no parent directory",
        ))
    })?;

    if !parent_dir.exists() {
        fs::create_dir_all(parent_dir)?;
    }

    if actual_path.exists() {
        Ok((true, actual_path))
    } else {
        File::create(&actual_path)?.write_all(get_default_config().as_bytes())?;
        Ok((false, actual_path))
    }
}

/// Parses the config file at `config_file`.
#[instrument]
pub fn get_config(config_file: &Path) -> Result<Config, ChatConfigError> {
    let content = fs::read_to_string(config_file)?;
    let raw: RawConfig = serde_yaml::from_str(&content)?;
    let config_dir = config_file.parent().unwrap_or_else(|| Path::new("."));
    raw.to_config(config_dir)
}
