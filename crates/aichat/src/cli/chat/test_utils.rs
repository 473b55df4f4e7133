#![cfg(test)]

//! Test utilities for chat modules

use crate::cli::chat::commands::default_registry;
use crate::cli::chat::repl::Dispatcher;
use aichat_core::config::Config;
use aichat_core::model::{ChatConfiguration, ModelProvider};
use aichat_core::session::ChatSession;
use std::time::Duration;

fn test_configuration(name: &str, model: &str) -> ChatConfiguration {
    ChatConfiguration {
        name: name.to_string(),
        provider: ModelProvider::Test,
        endpoint: None,
        api_key: String::new(),
        model: model.to_string(),
    }
}

/// Configurations `Test one`, `Test two` and `Failing` on the offline test
/// provider. `Failing` errors on every request.
pub fn create_test_config() -> Config {
    Config {
        configurations: vec![
            test_configuration("Test one", "one"),
            test_configuration("Test two", "two"),
            test_configuration("Failing", "error"),
        ],
        title_configuration: None,
        request_timeout: Duration::from_secs(10),
        viewer: None,
        system_message_dirs: Vec::new(),
    }
}

/// Same as [`create_test_config`] with `Test two` deriving titles.
pub fn create_test_config_with_title() -> Config {
    Config {
        title_configuration: Some("Test two".to_string()),
        ..create_test_config()
    }
}

pub fn create_test_session() -> ChatSession {
    ChatSession::new(&create_test_config()).unwrap()
}

pub fn create_test_dispatcher(config: &Config) -> Dispatcher {
    let session = ChatSession::new(config).unwrap();
    Dispatcher::new(session, default_registry(), config.viewer.clone())
}
