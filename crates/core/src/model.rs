use serde::{Deserialize, Serialize};

/// A named backend selection: provider, endpoint, credential and model.
///
/// Configurations are expanded from the raw config file entries and are
/// read-only once constructed.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ChatConfiguration {
    pub name: String,
    pub provider: ModelProvider,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
}

impl ChatConfiguration {
    /// Case-insensitive name comparison used for lookups.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.trim().to_lowercase()
    }
}

/// Supported model provider integrations (serialized as lowercase strings).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    Openai,
    Azure,
    Perplexity,
    Test,
}

impl From<ModelProvider> for String {
    fn from(val: ModelProvider) -> Self {
        val.as_str().into()
    }
}

impl ModelProvider {
    pub fn as_str(&self) -> &'static str {
        match &self {
            ModelProvider::Openai => "openai",
            ModelProvider::Azure => "azure",
            ModelProvider::Perplexity => "perplexity",
            ModelProvider::Test => "test",
        }
    }
}
