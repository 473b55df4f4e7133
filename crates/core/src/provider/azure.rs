use crate::completion::{ChatMessage, CompletionModel, CompletionResponse};
use crate::error::BackendError;
use crate::model::ChatConfiguration;
use crate::provider::openai_types::{ChatCompletionRequest, send};
use crate::provider::{endpoint_url, resolve_api_key};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

const API_VERSION: &str = "2024-10-21";

/// Azure OpenAI deployment. The configured model is the deployment name.
pub struct AzureModel {
    client: Client,
    url: String,
    api_key: String,
    deployment: String,
}

impl AzureModel {
    pub fn new(configuration: &ChatConfiguration) -> Result<Self> {
        let endpoint = configuration
            .endpoint
            .as_deref()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "'endpoint' is required for azure configuration '{}'",
                    configuration.name
                )
            })?;
        let api_key = resolve_api_key(&configuration.api_key)?;
        let path = format!(
            "openai/deployments/{}/chat/completions?api-version={API_VERSION}",
            configuration.model
        );

        Ok(Self {
            client: Client::new(),
            url: endpoint_url(endpoint, &path),
            api_key,
            deployment: configuration.model.clone(),
        })
    }
}

#[async_trait]
impl CompletionModel for AzureModel {
    #[instrument(skip_all, fields(deployment = %self.deployment))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<CompletionResponse, BackendError> {
        // Deployment is in the url, the body carries no model
        let body = ChatCompletionRequest::new(None, messages);
        let request = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body);

        send(request).await
    }
}
