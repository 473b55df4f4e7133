use aichat_core::session::ChatStatus;
use console::{Style, StyledObject};

/// Represents the type of a chat message, used for styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMessageType {
    /// The prompt for user input.
    Prompt,
    /// Footer information, like metrics or status.
    Footer,
    /// An error message.
    Error,
}

/// Styles a string of text according to the specified `ChatMessageType`.
pub fn style_chat_text(text: &str, style: ChatMessageType) -> StyledObject<&str> {
    let style_obj = match style {
        ChatMessageType::Prompt => Style::new().blue().bold(),
        ChatMessageType::Footer => Style::new().white().dim(),
        ChatMessageType::Error => Style::new().red().bold(),
    };
    style_obj.apply_to(text)
}

/// Prompt for the first line of an input block: `>` before the first
/// answer, `N >` afterwards, prefixed by `[title] ` once one is known.
pub fn format_prompt(status: &ChatStatus) -> String {
    let number = if status.question_number == 1 {
        ">".to_string()
    } else {
        format!("{} >", status.question_number)
    };

    match &status.title {
        Some(title) => format!("[{}] {number} ", title.trim()),
        None => format!("{number} "),
    }
}

/// Formats the session status shown by the status command.
pub fn format_status(status: &ChatStatus) -> String {
    let usage = &status.last_usage;
    let mut lines = vec![
        "Status:".to_string(),
        format!(
            "Last duration {:.2} seconds",
            status.last_duration.as_secs_f64()
        ),
        format!(
            "Prompt tokens {}, completion tokens {}, total tokens {}",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        ),
        format!("Configuration {}", status.configuration_name),
        format!("System message set {}", status.system_message_set),
    ];
    if let Some(title) = &status.title {
        lines.push(format!("Title {}", title.trim()));
    }
    lines.join("\n")
}

/// One-line summary printed below an answer.
pub fn format_footer_metrics(status: &ChatStatus) -> String {
    let mut footer = format!(
        "◼ Completed in {:.2}s.",
        status.last_duration.as_secs_f64()
    );
    let usage = &status.last_usage;
    if usage.total_tokens > 0 {
        footer.push_str(&format!(
            " {} prompt tokens. {} completion tokens. {} total tokens.",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        ));
    }

    style_chat_text(&footer, ChatMessageType::Footer).to_string()
}
