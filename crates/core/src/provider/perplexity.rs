use crate::completion::{ChatMessage, CompletionModel, CompletionResponse, citations_to_markdown};
use crate::error::BackendError;
use crate::model::ChatConfiguration;
use crate::provider::openai_types::{ChatCompletionRequest, send};
use crate::provider::{endpoint_url, resolve_api_key};
use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
const CITATION_SEPARATOR: &str = "\n\n---\n\n";

/// Perplexity online models. Returned citations are appended to the answer
/// text as numbered markdown links.
pub struct PerplexityModel {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl PerplexityModel {
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
impl CompletionModel for PerplexityModel {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<CompletionResponse, BackendError> {
        let mut body = ChatCompletionRequest::new(Some(self.model.as_str()), messages);
        body.return_citations = Some(true);
        let request = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body);

        let mut response = send(request).await?;
        if let Some(references) = citations_to_markdown(&response.citations, CITATION_SEPARATOR) {
            response.text.push_str(&references);
        }
        Ok(response)
    }
}
