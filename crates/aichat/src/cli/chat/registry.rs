//! The table of REPL commands and the types handlers exchange with the
//! dispatcher.
use aichat_core::error::ChatError;
use aichat_core::session::ChatSession;
use futures::future::BoxFuture;
use std::fmt;
use thiserror::Error;

/// Everything a handler may touch while it runs.
pub struct CommandContext<'a> {
    pub session: &'a mut ChatSession,
    pub registry: &'a CommandRegistry,
    pub viewer: Option<&'a str>,
}

/// A command handler. Receives the arguments after the token and the
/// pending input typed since the last command.
pub type CommandHandler = for<'a> fn(
    CommandContext<'a>,
    &'a [String],
    &'a str,
) -> BoxFuture<'a, Result<CommandResult, CommandError>>;

/// Checks arguments and pending input before the handler runs. Returns the
/// message to show when the command must not run.
pub type CommandValidator = fn(&[String], &str) -> Option<String>;

#[derive(Error, Debug)]
pub enum CommandError {
    /// Ends the REPL. Not reported as an error.
    #[error("Quit")]
    Quit,
    #[error(transparent)]
    Chat(#[from] ChatError),
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    AtMost(usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::AtMost(n) => count <= n,
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Arity::AtMost(n) => write!(f, "at most {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
        }
    }
}

/// Outcome of a command as shown to the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub is_error: bool,
    pub output: Option<String>,
    /// Replaces the pending input. `None` clears it.
    pub new_input: Option<String>,
    pub clear_screen: bool,
}

impl CommandResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            output: Some(output.into()),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn error(output: impl Into<String>) -> Self {
        Self {
            is_error: true,
            output: Some(output.into()),
            ..Default::default()
        }
    }

    /// Keeps `input` as pending input for the next prompt.
    pub fn keep_input(mut self, input: &str) -> Self {
        self.new_input = (!input.is_empty()).then(|| input.to_string());
        self
    }

    pub fn with_clear_screen(mut self) -> Self {
        self.clear_screen = true;
        self
    }
}

pub struct CommandDefinition {
    pub token: &'static str,
    /// Argument synopsis shown in the help, e.g. `[<file>]`.
    pub arguments: Option<&'static str>,
    pub description: &'static str,
    pub arity: Option<Arity>,
    /// Spinner message shown while the handler runs.
    pub busy: Option<&'static str>,
    pub validator: Option<CommandValidator>,
    pub handler: CommandHandler,
}

impl CommandDefinition {
    pub fn new(token: &'static str, description: &'static str, handler: CommandHandler) -> Self {
        Self {
            token,
            arguments: None,
            description,
            arity: None,
            busy: None,
            validator: None,
            handler,
        }
    }

    pub fn with_arguments(mut self, arguments: &'static str, arity: Arity) -> Self {
        self.arguments = Some(arguments);
        self.arity = Some(arity);
        self
    }

    pub fn with_busy(mut self, message: &'static str) -> Self {
        self.busy = Some(message);
        self
    }

    pub fn with_validator(mut self, validator: CommandValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Help line, `:token args - description`.
    pub fn usage(&self) -> String {
        match self.arguments {
            Some(arguments) => format!(":{} {} - {}", self.token, arguments, self.description),
            None => format!(":{} - {}", self.token, self.description),
        }
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("token", &self.token)
            .field("arguments", &self.arguments)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// Immutable set of commands, built once at startup.
#[derive(Debug)]
pub struct CommandRegistry {
    commands: Vec<CommandDefinition>,
}

impl CommandRegistry {
    pub fn new(commands: Vec<CommandDefinition>) -> Self {
        Self { commands }
    }

    /// Looks up a command by token, ignoring case.
    pub fn find(&self, token: &str) -> Option<&CommandDefinition> {
        self.commands
            .iter()
            .find(|c| c.token.eq_ignore_ascii_case(token))
    }

    pub fn tokens(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.iter().map(|c| c.token)
    }

    pub fn help(&self) -> String {
        self.commands
            .iter()
            .map(CommandDefinition::usage)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
