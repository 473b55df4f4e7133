use crate::completion::{ChatMessage, CompletionModel, CompletionResponse};
use crate::error::BackendError;
use crate::model::ChatConfiguration;
use crate::provider::openai_types::{ChatCompletionRequest, send};
use crate::provider::{endpoint_url, resolve_api_key};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Chat completions against OpenAI or any server speaking the same protocol.
pub struct OpenAIBaseModel {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl OpenAIBaseModel {
    pub fn new(configuration: &ChatConfiguration) -> Result<Self> {
        let api_key = resolve_api_key(&configuration.api_key)?;
        let base_url = configuration
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL);

        Ok(Self {
            client: Client::new(),
            url: endpoint_url(base_url, "chat/completions"),
            api_key,
            model: configuration.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionModel for OpenAIBaseModel {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<CompletionResponse, BackendError> {
        let body = ChatCompletionRequest::new(Some(self.model.as_str()), messages);
        let mut request = self.client.post(&self.url).json(&body);
        if !self.api_key.is_empty() {
            request = request.bearer_auth(&self.api_key);
        }

        send(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::SenderType;
    use crate::model::ModelProvider;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    fn configuration(server_url: &str) -> ChatConfiguration {
        ChatConfiguration {
            name: "test".to_string(),
            provider: ModelProvider::Openai,
            endpoint: Some(server_url.to_string()),
            api_key: "MOCK_OPENAI_API_KEY".to_string(),
            model: "test-model".to_string(),
        }
    }

    #[test]
    fn test_openai_new_model_uses_default_endpoint() {
        let mut config = configuration("unused");
        config.endpoint = None;

        let model = OpenAIBaseModel::new(&config).unwrap();

        assert_eq!(model.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(model.model, "test-model");
    }

    #[tokio::test]
    async fn test_openai_complete_api() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer MOCK_OPENAI_API_KEY"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "messages": [{"role": "user", "content": "Hello"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-1",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "Hello world"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 20, "completion_tokens": 30, "total_tokens": 50}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = OpenAIBaseModel::new(&configuration(&server.uri())).unwrap();
        let messages = vec![ChatMessage::new(SenderType::User, "Hello")];

        let response = model.complete(&messages).await.unwrap();

        assert_eq!(response.text, "Hello world");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.metrics.prompt_tokens, Some(20));
        assert_eq!(response.metrics.completion_tokens, Some(30));
        assert_eq!(response.metrics.total_tokens, Some(50));
        assert!(response.metrics.elapsed_ms.is_some());
    }

    #[tokio::test]
    async fn test_openai_complete_returns_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let model = OpenAIBaseModel::new(&configuration(&server.uri())).unwrap();
        let messages = vec![ChatMessage::new(SenderType::User, "Hello")];

        let err = model.complete(&messages).await.unwrap_err();

        assert!(matches!(
            err,
            BackendError::Provider { status: 401, ref body } if body == "invalid api key"
        ));
    }
}
