use crate::cli::chat::compl::ReplHelper;
use crate::cli::chat::registry::{CommandContext, CommandError, CommandRegistry, CommandResult};
use crate::cli::ux::{ChatMessageType, GenerationSpinner, format_prompt, style_chat_text};
use aichat_core::session::ChatSession;
use anyhow::Result;
use console::Term;
use rustyline::error::ReadlineError;
use rustyline::{CompletionType, Editor};
use tracing::{debug, error};

const COMMAND_PREFIX: char = ':';

/// What happened to a line read from the terminal.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    /// Free text, added to the pending input.
    Pending,
    Completed(CommandResult),
    Quit,
}

/// Splits a command line into token and arguments. Returns `None` for
/// free text.
pub fn parse_command_line(line: &str) -> Option<(String, Vec<String>)> {
    let rest = line.strip_prefix(COMMAND_PREFIX)?;
    let mut parts = rest.split_whitespace().map(str::to_string);
    let token = parts.next().unwrap_or_default();
    Some((token, parts.collect()))
}

/// Collects free text until a command line arrives, then runs the command
/// against the session.
pub struct Dispatcher {
    session: ChatSession,
    registry: CommandRegistry,
    viewer: Option<String>,
    pending: String,
}

impl Dispatcher {
    pub fn new(session: ChatSession, registry: CommandRegistry, viewer: Option<String>) -> Self {
        Self {
            session,
            registry,
            viewer,
            pending: String::new(),
        }
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Input typed since the last command.
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Prompt for the next line. Continuation lines get none.
    pub fn prompt(&self) -> String {
        if self.pending().is_empty() {
            format_prompt(&self.session.status())
        } else {
            String::new()
        }
    }

    pub async fn handle_line(&mut self, line: &str) -> LineOutcome {
        let Some((token, args)) = parse_command_line(line) else {
            self.pending.push_str(line);
            self.pending.push('\n');
            return LineOutcome::Pending;
        };

        let input = std::mem::take(&mut self.pending);
        let result = match self.invoke(&token, &args, &input).await {
            Ok(result) => result,
            Err(CommandError::Quit) => {
                debug!("Quit");
                return LineOutcome::Quit;
            }
            Err(e) => {
                error!(command = %token, error = %e, "Command failed");
                CommandResult::error(format!("{e:#}")).keep_input(&input)
            }
        };

        self.pending = result.new_input.clone().unwrap_or_default();
        LineOutcome::Completed(result)
    }

    async fn invoke(
        &mut self,
        token: &str,
        args: &[String],
        input: &str,
    ) -> Result<CommandResult, CommandError> {
        if token.is_empty() {
            return Ok(CommandResult::error("Invalid command.").keep_input(input));
        }

        let Some(command) = self.registry.find(token) else {
            return Ok(
                CommandResult::error(format!("Invalid command \":{token}\".")).keep_input(input),
            );
        };

        if let Some(arity) = command.arity
            && !arity.accepts(args.len())
        {
            return Ok(CommandResult::error(format!(
                "Invalid number of arguments for command \":{} {}\", expected {arity}.",
                command.token,
                command.arguments.unwrap_or_default()
            ))
            .keep_input(input));
        }

        if let Some(validator) = command.validator
            && let Some(message) = validator(args, input)
        {
            return Ok(CommandResult::error(message).keep_input(input));
        }

        debug!(command = command.token, args = ?args, "Invoking command");
        let spinner = command
            .busy
            .map(|message| GenerationSpinner::new(message.to_string()));
        let ctx = CommandContext {
            session: &mut self.session,
            registry: &self.registry,
            viewer: self.viewer.as_deref(),
        };
        let result = (command.handler)(ctx, args, input).await;
        if let Some(spinner) = spinner {
            spinner.clear();
        }
        result
    }
}

/// Runs the interactive REPL until `:q` or end of input.
pub async fn run(mut dispatcher: Dispatcher) -> Result<()> {
    println!(":h - List commands.");

    let config = rustyline::Config::builder()
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .completion_type(CompletionType::List)
        .build();

    let helper = ReplHelper::new(
        dispatcher.registry().tokens(),
        dispatcher
            .session()
            .configurations()
            .iter()
            .map(|c| c.name.clone()),
    );
    let mut rl = Editor::with_config(config)?;
    rl.set_helper(Some(helper));
    let term = Term::stdout();

    loop {
        let prompt = dispatcher.prompt();
        let readline = rl.readline(&style_chat_text(&prompt, ChatMessageType::Prompt).to_string());
        match readline {
            Ok(line) => {
                rl.add_history_entry(&line)?;
                match dispatcher.handle_line(&line).await {
                    LineOutcome::Pending => {}
                    LineOutcome::Completed(result) => present_result(&term, &result)?,
                    LineOutcome::Quit => {
                        println!("Bye!");
                        return Ok(());
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Pending input is kept
                println!("Type :q to exit.");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nBye!");
                return Ok(());
            }
            Err(err) => {
                return Err(err.into());
            }
        }
    }
}

fn present_result(term: &Term, result: &CommandResult) -> Result<()> {
    if result.clear_screen {
        term.clear_screen()?;
    }

    let Some(output) = result.output.as_deref().map(str::trim_end) else {
        return Ok(());
    };
    if output.is_empty() {
        return Ok(());
    }

    if result.is_error {
        eprintln!("{}", style_chat_text(output, ChatMessageType::Error));
    } else {
        println!("{output}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::chat::test_utils::{
        create_test_config, create_test_config_with_title, create_test_dispatcher,
    };

    async fn feed(dispatcher: &mut Dispatcher, lines: &[&str]) -> Vec<LineOutcome> {
        let mut outcomes = Vec::new();
        for line in lines {
            outcomes.push(dispatcher.handle_line(line).await);
        }
        outcomes
    }

    fn completed(outcome: LineOutcome) -> CommandResult {
        match outcome {
            LineOutcome::Completed(result) => result,
            other => panic!("expected a completed command, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_command_line() {
        assert_eq!(
            parse_command_line(":sc  OpenAI   gpt-4o "),
            Some((
                "sc".to_string(),
                vec!["OpenAI".to_string(), "gpt-4o".to_string()]
            ))
        );
        assert_eq!(parse_command_line(":q"), Some(("q".to_string(), vec![])));
        assert_eq!(parse_command_line(":"), Some((String::new(), vec![])));
        assert_eq!(parse_command_line("What is :q?"), None);
        assert_eq!(parse_command_line(" :q"), None);
    }

    #[tokio::test]
    async fn test_free_text_accumulates() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());

        let outcomes = feed(&mut dispatcher, &["first line", "", "second line"]).await;

        assert!(outcomes.iter().all(|o| *o == LineOutcome::Pending));
        assert_eq!(dispatcher.pending(), "first line\n\nsecond line\n");
        assert_eq!(dispatcher.prompt(), "");
    }

    #[tokio::test]
    async fn test_unknown_command_keeps_pending_input() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());
        feed(&mut dispatcher, &["keep me"]).await;

        let result = completed(dispatcher.handle_line(":zz").await);

        assert!(result.is_error);
        assert_eq!(result.output.as_deref(), Some("Invalid command \":zz\"."));
        assert_eq!(dispatcher.pending(), "keep me\n");
    }

    #[tokio::test]
    async fn test_empty_command_is_invalid() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());
        let result = completed(dispatcher.handle_line(":").await);
        assert!(result.is_error);
        assert_eq!(result.output.as_deref(), Some("Invalid command."));
    }

    #[tokio::test]
    async fn test_quit_ends_without_error() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());
        feed(&mut dispatcher, &["unsent text"]).await;

        assert_eq!(dispatcher.handle_line(":q").await, LineOutcome::Quit);
    }

    #[tokio::test]
    async fn test_submit_flow() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());
        assert_eq!(dispatcher.prompt(), "> ");

        feed(&mut dispatcher, &["What is Rust?", "Answer briefly."]).await;
        let result = completed(dispatcher.handle_line(":s").await);

        assert!(!result.is_error);
        assert!(result.output.unwrap().starts_with("Hello world"));
        assert_eq!(dispatcher.pending(), "");
        assert_eq!(dispatcher.prompt(), "2 > ");
        assert_eq!(
            dispatcher.session().messages()[0].text,
            "What is Rust?\nAnswer briefly.\n"
        );
    }

    #[tokio::test]
    async fn test_prompt_shows_title() {
        let mut dispatcher = create_test_dispatcher(&create_test_config_with_title());

        feed(&mut dispatcher, &["Hi", ":s"]).await;

        assert_eq!(dispatcher.prompt(), "[Hello world] 2 > ");
    }

    #[tokio::test]
    async fn test_validator_rejects_blank_question() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());
        feed(&mut dispatcher, &["   "]).await;

        let result = completed(dispatcher.handle_line(":s").await);

        assert!(result.is_error);
        assert_eq!(result.output.as_deref(), Some("No question - no answer :-)"));
        assert_eq!(dispatcher.pending(), "   \n");
        assert!(dispatcher.session().messages().is_empty());
    }

    #[tokio::test]
    async fn test_arity_error_skips_handler() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());
        feed(&mut dispatcher, &["draft"]).await;

        let result = completed(dispatcher.handle_line(":ss a.txt b.txt").await);
        assert!(result.is_error);
        assert_eq!(
            result.output.as_deref(),
            Some("Invalid number of arguments for command \":ss [<file>]\", expected at most 1.")
        );
        assert_eq!(dispatcher.pending(), "draft\n");

        let result = completed(dispatcher.handle_line(":sc").await);
        assert!(result.output.unwrap().contains("expected at least 1"));
        assert_eq!(dispatcher.session().configuration().name, "Test one");
    }

    #[tokio::test]
    async fn test_backend_error_keeps_input_and_continues() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());
        feed(&mut dispatcher, &[":sc failing", "Will this work?"]).await;

        let result = completed(dispatcher.handle_line(":s").await);

        assert!(result.is_error);
        assert_eq!(result.output.as_deref(), Some("TestProviderModel error"));
        assert_eq!(dispatcher.pending(), "Will this work?\n");
        // The question stays in the history
        assert_eq!(dispatcher.session().messages().len(), 1);

        let result = completed(dispatcher.handle_line(":sc 1").await);
        assert!(!result.is_error);
        let result = completed(dispatcher.handle_line(":s").await);
        assert!(!result.is_error);
    }

    #[tokio::test]
    async fn test_submit_and_view_without_viewer() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());
        feed(&mut dispatcher, &["Show me"]).await;

        let result = completed(dispatcher.handle_line(":sv").await);

        assert!(result.is_error);
        assert!(result.output.unwrap().contains("No viewer configured"));
        assert_eq!(dispatcher.pending(), "Show me\n");
    }

    #[tokio::test]
    async fn test_clear_screen_clears_input() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());
        feed(&mut dispatcher, &["draft"]).await;

        let result = completed(dispatcher.handle_line(":cls").await);

        assert!(result.clear_screen);
        assert_eq!(result.output, None);
        assert_eq!(dispatcher.pending(), "");
    }

    #[tokio::test]
    async fn test_tokens_ignore_case() {
        let mut dispatcher = create_test_dispatcher(&create_test_config());
        feed(&mut dispatcher, &["draft"]).await;

        let result = completed(dispatcher.handle_line(":LC").await);

        assert!(!result.is_error);
        assert!(result.output.unwrap().starts_with("Configurations:"));
        assert_eq!(dispatcher.pending(), "draft\n");
    }
}
