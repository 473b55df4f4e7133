//! Wire types shared by the OpenAI-compatible chat completion endpoints.
use crate::completion::{ChatMessage, Citation, CompletionMetrics, CompletionResponse};
use crate::error::BackendError;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Serialize)]
pub(super) struct ChatCompletionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) model: Option<&'a str>,
    pub(super) messages: Vec<RequestMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) return_citations: Option<bool>,
}

impl<'a> ChatCompletionRequest<'a> {
    pub(super) fn new(model: Option<&'a str>, messages: &'a [ChatMessage]) -> Self {
        Self {
            model,
            messages: messages.iter().map(RequestMessage::from).collect(),
            return_citations: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct RequestMessage<'a> {
    pub(super) role: &'static str,
    pub(super) content: &'a str,
}

impl<'a> From<&'a ChatMessage> for RequestMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.sender.as_str(),
            content: &msg.text,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatCompletionResponse {
    pub(super) choices: Vec<Choice>,
    pub(super) usage: Option<Usage>,
    #[serde(default)]
    pub(super) citations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Choice {
    pub(super) message: ResponseMessage,
    pub(super) finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ResponseMessage {
    pub(super) content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Usage {
    pub(super) prompt_tokens: Option<u32>,
    pub(super) completion_tokens: Option<u32>,
    pub(super) total_tokens: Option<u32>,
}

impl ChatCompletionResponse {
    /// Takes the first choice as the answer.
    pub(super) fn into_completion(
        self,
        elapsed_ms: u64,
    ) -> Result<CompletionResponse, BackendError> {
        let choice = self.choices.into_iter().next().ok_or_else(|| {
            BackendError::InvalidResponse("Response contains no choices".to_string())
        })?;

        let metrics = match self.usage {
            Some(usage) => CompletionMetrics {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
                elapsed_ms: Some(elapsed_ms),
            },
            None => CompletionMetrics {
                elapsed_ms: Some(elapsed_ms),
                ..Default::default()
            },
        };

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            citations: self
                .citations
                .into_iter()
                .map(|url| Citation { url })
                .collect(),
            finish_reason: choice.finish_reason,
            metrics,
        })
    }
}

/// Sends a prepared request and decodes the chat completion. Non-success
/// statuses are returned as [`BackendError::Provider`] with the body text.
pub(super) async fn send(
    request: reqwest::RequestBuilder,
) -> Result<CompletionResponse, BackendError> {
    debug!("Sending request");
    let start_time = Instant::now();
    let response = request.send().await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "Provider returned an error");
        return Err(BackendError::Provider {
            status: status.as_u16(),
            body,
        });
    }

    let body: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;
    let elapsed_ms = start_time.elapsed().as_millis() as u64;
    debug!(elapsed_ms, "Request finished");

    body.into_completion(elapsed_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::SenderType;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let messages = vec![
            ChatMessage::new(SenderType::System, "Be brief."),
            ChatMessage::new(SenderType::User, "Hi"),
        ];
        let request = ChatCompletionRequest::new(Some("gpt-4o"), &messages);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "gpt-4o",
                "messages": [
                    {"role": "system", "content": "Be brief."},
                    {"role": "user", "content": "Hi"}
                ]
            })
        );
    }

    #[test]
    fn test_response_without_usage() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Hello"}, "finish_reason": "stop"}]
        }))
        .unwrap();

        let completion = response.into_completion(12).unwrap();
        assert_eq!(completion.text, "Hello");
        assert_eq!(completion.metrics.prompt_tokens, None);
        assert_eq!(completion.metrics.elapsed_ms, Some(12));
        assert!(completion.citations.is_empty());
    }

    #[test]
    fn test_response_without_choices_is_invalid() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({"choices": []})).unwrap();

        let err = response.into_completion(0).unwrap_err();
        assert!(matches!(err, BackendError::InvalidResponse(_)));
    }
}
