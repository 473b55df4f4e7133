//! An offline provider for trying the chat without network access.
use crate::completion::{ChatMessage, CompletionMetrics, CompletionModel, CompletionResponse};
use crate::error::BackendError;
use crate::model::ChatConfiguration;
use anyhow::Result;
use async_trait::async_trait;

/// Answers every question with "Hello world".
///
/// A configuration whose model is named `error` fails every request instead,
/// which is handy to see how the chat reports backend errors.
#[derive(Debug)]
pub struct TestProviderModel {
    model: String,
}

impl TestProviderModel {
    pub fn new(configuration: &ChatConfiguration) -> Result<Self> {
        Ok(Self {
            model: configuration.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionModel for TestProviderModel {
    async fn complete(&self, _messages: &[ChatMessage]) -> Result<CompletionResponse, BackendError> {
        if self.model == "error" {
            return Err(BackendError::Other("TestProviderModel error".to_string()));
        }

        Ok(CompletionResponse {
            text: "Hello world".to_string(),
            citations: Vec::new(),
            finish_reason: Some("stop".to_string()),
            metrics: CompletionMetrics {
                prompt_tokens: Some(10),
                completion_tokens: Some(20),
                total_tokens: Some(30),
                elapsed_ms: Some(0),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::SenderType;
    use crate::model::ModelProvider;

    fn configuration(model: &str) -> ChatConfiguration {
        ChatConfiguration {
            name: "Test".to_string(),
            provider: ModelProvider::Test,
            endpoint: None,
            api_key: String::new(),
            model: model.to_string(),
        }
    }

    #[tokio::test]
    async fn test_test_provider_answers_hello_world() {
        let model = TestProviderModel::new(&configuration("any")).unwrap();
        let messages = [ChatMessage::new(SenderType::User, "Hi")];

        let response = model.complete(&messages).await.unwrap();

        assert_eq!(response.text, "Hello world");
        assert_eq!(response.metrics.total_tokens, Some(30));
    }

    #[tokio::test]
    async fn test_test_provider_error_model() {
        let model = TestProviderModel::new(&configuration("error")).unwrap();
        let messages = [ChatMessage::new(SenderType::User, "Hi")];

        let err = model.complete(&messages).await.unwrap_err();

        assert_eq!(err.to_string(), "TestProviderModel error");
    }
}
