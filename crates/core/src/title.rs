//! Short conversation titles derived from the first question.
use crate::completion::{ChatMessage, CompletionModel, SenderType, complete_with_timeout};
use crate::error::BackendError;
use std::time::Duration;
use tracing::debug;

/// Number of question characters sent to the title model.
pub const TITLE_QUESTION_LIMIT: usize = 100;

/// Builds the single user prompt asking for a title, using at most the first
/// [`TITLE_QUESTION_LIMIT`] characters of `question`.
pub fn title_prompt(question: &str) -> String {
    let excerpt: String = question.chars().take(TITLE_QUESTION_LIMIT).collect();
    format!(
        "Summarize the following question in max. 3 words. Use the language of the question for the answer:\n{excerpt}"
    )
}

/// Asks `model` for a title. Only the title prompt is sent, never the
/// conversation. The answer is returned as is.
pub async fn derive_title(
    model: &dyn CompletionModel,
    question: &str,
    timeout: Duration,
) -> Result<String, BackendError> {
    let messages = [ChatMessage::new(SenderType::User, title_prompt(question))];
    let response = complete_with_timeout(model, &messages, timeout).await?;
    if response.text.trim().is_empty() {
        return Err(BackendError::InvalidResponse(
            "Title model returned an empty answer".to_string(),
        ));
    }

    debug!(title = %response.text, "Derived title");
    Ok(response.text)
}
