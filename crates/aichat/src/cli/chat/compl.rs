use crate::cli::ux::{ChatMessageType, style_chat_text};
use rustyline::completion::{Candidate, Completer};
use rustyline::error::ReadlineError;
use rustyline::hint::Hinter;
use rustyline::{Helper, Highlighter, Validator};

/// Command that takes a configuration name.
const SET_CONFIGURATION: &str = "sc";

/// Completion candidate for the REPL.
#[derive(Debug)]
pub struct CompletionCandidate {
    text: String,
    display_string: String,
}

impl CompletionCandidate {
    pub fn new(text: &str) -> Self {
        let display_string = style_chat_text(text, ChatMessageType::Footer).to_string();
        Self {
            text: text.to_owned(),
            display_string,
        }
    }
}

impl Candidate for CompletionCandidate {
    fn display(&self) -> &str {
        &self.display_string
    }

    fn replacement(&self) -> &str {
        &self.text
    }
}

/// Line editing helper completing command tokens and configuration names.
#[derive(Helper, Validator, Highlighter)]
pub struct ReplHelper {
    /// Tokens with the `:` prefix.
    pub command_names: Vec<String>,
    pub configuration_names: Vec<String>,
}

impl ReplHelper {
    pub fn new<'a>(
        tokens: impl IntoIterator<Item = &'a str>,
        configuration_names: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            command_names: tokens.into_iter().map(|t| format!(":{t}")).collect(),
            configuration_names: configuration_names.into_iter().collect(),
        }
    }
}

impl Completer for ReplHelper {
    type Candidate = CompletionCandidate;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> Result<(usize, Vec<Self::Candidate>), ReadlineError> {
        let line_to_pos = &line[..pos];
        if !line_to_pos.starts_with(':') {
            return Ok((0, Vec::new()));
        }

        match line_to_pos.split_once(' ') {
            None => {
                let prefix = line_to_pos.to_lowercase();
                let candidates = self
                    .command_names
                    .iter()
                    .filter(|name| name.starts_with(&prefix))
                    .map(|name| CompletionCandidate::new(name))
                    .collect();
                Ok((0, candidates))
            }
            Some((token, rest)) if token[1..].eq_ignore_ascii_case(SET_CONFIGURATION) => {
                Ok(configuration_compl(token.len() + 1, rest, &self.configuration_names))
            }
            Some(_) => Ok((0, Vec::new())),
        }
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if line.len() < 2 || pos < line.len() || !line.starts_with(':') {
            return None;
        }
        self.command_names
            .iter()
            .find(|name| name.starts_with(line) && name.len() > line.len())
            .map(|name| name[line.len()..].into())
    }
}

// Names may contain spaces, so everything after the token is the prefix
fn configuration_compl(
    start: usize,
    prefix: &str,
    configuration_names: &[String],
) -> (usize, Vec<CompletionCandidate>) {
    let prefix = prefix.to_lowercase();
    let candidates = configuration_names
        .iter()
        .filter(|name| name.to_lowercase().starts_with(&prefix))
        .map(|name| CompletionCandidate::new(name))
        .collect();
    (start, candidates)
}
