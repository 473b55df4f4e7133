//! Test utilities for aichat-core crate
//!
//! Provides a recording mock model and helpers to build sessions against it.

use crate::completion::{ChatMessage, CompletionMetrics, CompletionModel, CompletionResponse};
use crate::config::Config;
use crate::error::BackendError;
use crate::model::{ChatConfiguration, ModelProvider};
use crate::session::ModelFactory;
use async_trait::async_trait;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::Builder;

/// Creates a temporary config file with the given content.
/// Uses tempfile::Builder to ensure unique directories for parallel tests.
pub fn create_temp_config(content: &str) -> PathBuf {
    let temp_dir = Builder::new()
        .prefix("aichat-test")
        .rand_bytes(8)
        .tempdir()
        .unwrap();
    let config_path = temp_dir.path().join("aichat.yml");
    File::create(&config_path)
        .unwrap()
        .write_all(content.as_bytes())
        .unwrap();
    // Keep the temp directory alive by leaking it (this is just for tests)
    let _ = Box::leak(Box::new(temp_dir));
    config_path
}

/// One recorded backend call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub configuration: String,
    pub messages: Vec<ChatMessage>,
}

/// Shared log of everything the mock models saw.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    pub created: Arc<Mutex<Vec<String>>>,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl CallLog {
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn calls_to(&self, configuration: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.configuration == configuration)
            .cloned()
            .collect()
    }
}

/// A mock model whose behaviour is chosen by the configuration's model name:
/// - `fail`: every call fails with a provider error.
/// - `hang`: never answers (use with a paused clock).
/// - `slow`: answers after 50ms.
/// - `blank`: answers with an empty text.
/// - anything else: answers `"{model} answer {n}"` with usage 3/5/8.
pub struct MockModel {
    configuration: ChatConfiguration,
    log: CallLog,
}

#[async_trait]
impl CompletionModel for MockModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<CompletionResponse, BackendError> {
        let call_number = {
            let mut calls = self.log.calls.lock().unwrap();
            calls.push(RecordedCall {
                configuration: self.configuration.name.clone(),
                messages: messages.to_vec(),
            });
            calls
                .iter()
                .filter(|c| c.configuration == self.configuration.name)
                .count()
        };

        let text = match self.configuration.model.as_str() {
            "fail" => {
                return Err(BackendError::Provider {
                    status: 500,
                    body: "mock failure".to_string(),
                });
            }
            "hang" => {
                tokio::time::sleep(Duration::from_secs(24 * 3600)).await;
                String::new()
            }
            "slow" => {
                tokio::time::sleep(Duration::from_millis(50)).await;
                format!("slow answer {call_number}")
            }
            "blank" => String::new(),
            model => format!("{model} answer {call_number}"),
        };

        Ok(CompletionResponse {
            text,
            citations: Vec::new(),
            finish_reason: Some("stop".to_string()),
            metrics: CompletionMetrics {
                prompt_tokens: Some(3),
                completion_tokens: Some(5),
                total_tokens: Some(8),
                elapsed_ms: Some(1),
            },
        })
    }
}

/// Builds a factory creating [`MockModel`]s that record into `log`.
pub fn mock_factory(log: &CallLog) -> ModelFactory {
    let log = log.clone();
    Arc::new(
        move |configuration: &ChatConfiguration| -> anyhow::Result<Box<dyn CompletionModel>> {
            log.created.lock().unwrap().push(configuration.name.clone());
            Ok(Box::new(MockModel {
                configuration: configuration.clone(),
                log: log.clone(),
            }))
        },
    )
}

pub fn mock_configuration(name: &str, model: &str) -> ChatConfiguration {
    ChatConfiguration {
        name: name.to_string(),
        provider: ModelProvider::Test,
        endpoint: None,
        api_key: String::new(),
        model: model.to_string(),
    }
}

/// A config with configurations `Main` (model `main`), `Other` (model
/// `other`) and `Broken` (model `fail`), no title configuration.
pub fn mock_config() -> Config {
    Config {
        configurations: vec![
            mock_configuration("Main", "main"),
            mock_configuration("Other", "other"),
            mock_configuration("Broken", "fail"),
        ],
        title_configuration: None,
        request_timeout: Duration::from_secs(10),
        viewer: None,
        system_message_dirs: Vec::new(),
    }
}

/// Same as [`mock_config`] plus a `Titles` configuration backed by `title_model`.
pub fn mock_config_with_title(title_model: &str) -> Config {
    let mut config = mock_config();
    config
        .configurations
        .push(mock_configuration("Titles", title_model));
    config.title_configuration = Some("Titles".to_string());
    config
}
