use crate::error::BackendError;
use async_trait::async_trait;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderType {
    System,
    Assistant,
    User,
}

impl From<SenderType> for String {
    fn from(val: SenderType) -> Self {
        val.as_str().into()
    }
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match &self {
            SenderType::System => "system",
            SenderType::User => "user",
            SenderType::Assistant => "assistant",
        }
    }
}

/// A source reference returned alongside an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub text: String,
    pub sender: SenderType,
    pub citations: Vec<Citation>,
}

impl ChatMessage {
    pub fn new(sender: SenderType, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender,
            citations: Vec::new(),
        }
    }
}

/// Usage counters as reported by the backend. Providers may omit any of them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionMetrics {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
    pub elapsed_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub text: String,
    pub citations: Vec<Citation>,
    pub finish_reason: Option<String>,
    pub metrics: CompletionMetrics,
}

impl CompletionResponse {
    /// Converts the response into an assistant message for the history.
    pub fn into_message(self) -> ChatMessage {
        ChatMessage {
            text: self.text,
            sender: SenderType::Assistant,
            citations: self.citations,
        }
    }
}

#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Completes the ordered conversation with a single answer.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<CompletionResponse, BackendError>;
}

/// Runs one completion, failing with [`BackendError::Timeout`] when the model
/// does not answer within `timeout`.
pub async fn complete_with_timeout(
    model: &dyn CompletionModel,
    messages: &[ChatMessage],
    timeout: Duration,
) -> Result<CompletionResponse, BackendError> {
    tokio::time::timeout(timeout, model.complete(messages))
        .await
        .map_err(|_| BackendError::Timeout(timeout))?
}

/// Renders citations as markdown link references, e.g. `[1]: https://...`.
pub fn citations_to_markdown(citations: &[Citation], prefix: &str) -> Option<String> {
    if citations.is_empty() {
        return None;
    }

    let mut out = String::from(prefix);
    for (i, citation) in citations.iter().enumerate() {
        out.push_str(&format!("[{}]: {}\n", i + 1, citation.url));
    }
    Some(out)
}
