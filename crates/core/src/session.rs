//! A session is the in-memory conversation between the user and the active
//! model, together with the derived title and usage statistics.
use crate::{
    assets::find_system_message_file,
    completion::{
        ChatMessage, CompletionMetrics, CompletionModel, SenderType, complete_with_timeout,
    },
    config::Config,
    error::{BackendError, ChatError},
    model::ChatConfiguration,
    title::derive_title,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

/// Creates the backend for a configuration.
pub type ModelFactory =
    Arc<dyn Fn(&ChatConfiguration) -> anyhow::Result<Box<dyn CompletionModel>> + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<&CompletionMetrics> for TokenUsage {
    fn from(metrics: &CompletionMetrics) -> Self {
        Self {
            prompt_tokens: metrics.prompt_tokens.unwrap_or(0),
            completion_tokens: metrics.completion_tokens.unwrap_or(0),
            total_tokens: metrics.total_tokens.unwrap_or(0),
        }
    }
}

/// Snapshot of the session state.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatStatus {
    /// Number of answered questions plus one.
    pub question_number: usize,
    pub last_duration: Duration,
    pub last_usage: TokenUsage,
    pub system_message_set: bool,
    pub configuration_name: String,
    /// Set once per session by the first successful title derivation.
    pub title: Option<String>,
}

impl ChatStatus {
    fn new(configuration_name: &str) -> Self {
        Self {
            question_number: 1,
            last_duration: Duration::ZERO,
            last_usage: TokenUsage::default(),
            system_message_set: false,
            configuration_name: configuration_name.to_string(),
            title: None,
        }
    }
}

pub struct ChatSession {
    configurations: Vec<Arc<ChatConfiguration>>,
    configuration: Arc<ChatConfiguration>,
    model: Box<dyn CompletionModel>,
    title_configuration: Option<Arc<ChatConfiguration>>,
    title_model: Option<Box<dyn CompletionModel>>,
    factory: ModelFactory,
    messages: Vec<ChatMessage>,
    status: ChatStatus,
    request_timeout: Duration,
    system_message_dirs: Vec<PathBuf>,
}

impl ChatSession {
    /// Creates a session using the built-in providers.
    pub fn new(config: &Config) -> Result<Self, ChatError> {
        let factory: ModelFactory = Arc::new(crate::get_completion_llm);
        Self::with_factory(config, factory)
    }

    /// Creates a session whose backends are built by `factory`. The first
    /// configuration becomes active; the title configuration, if any, is
    /// resolved here and never changes afterwards.
    #[instrument(skip_all)]
    pub fn with_factory(config: &Config, factory: ModelFactory) -> Result<Self, ChatError> {
        let configurations: Vec<Arc<ChatConfiguration>> = config
            .configurations
            .iter()
            .cloned()
            .map(Arc::new)
            .collect();
        let configuration = configurations
            .first()
            .cloned()
            .ok_or(ChatError::NoConfigurations)?;
        let model = create_model(&factory, &configuration)?;

        let (title_configuration, title_model) = match config.title_configuration.as_deref() {
            Some(name) => {
                let title_configuration = find_by_name(&configurations, name)
                    .ok_or_else(|| ChatError::ConfigurationNotFound(name.to_string()))?;
                let title_model = create_model(&factory, &title_configuration)?;
                (Some(title_configuration), Some(title_model))
            }
            None => (None, None),
        };

        debug!(
            configuration = %configuration.name,
            title_configuration = ?title_configuration.as_ref().map(|c| c.name.as_str()),
            "Session created"
        );

        Ok(Self {
            status: ChatStatus::new(&configuration.name),
            configurations,
            configuration,
            model,
            title_configuration,
            title_model,
            factory,
            messages: Vec::new(),
            request_timeout: config.request_timeout,
            system_message_dirs: config.system_message_dirs.clone(),
        })
    }

    /// Clears the conversation, title and statistics. The active
    /// configuration is kept.
    pub fn new_session(&mut self) {
        self.messages.clear();
        self.status = ChatStatus::new(&self.configuration.name);
    }

    /// Starts a new session that keeps the first system message, if any.
    pub fn new_session_keep_system_message(&mut self) {
        // Capture before the reset clears the history
        let system_message = self
            .messages
            .iter()
            .find(|m| m.sender == SenderType::System)
            .cloned();

        self.new_session();
        if let Some(message) = system_message {
            self.messages.push(message);
            self.status.system_message_set = true;
        }
    }

    /// Starts a new session with `text` as its system message.
    pub fn set_system_message(&mut self, text: &str) -> Result<(), ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyInput("No system message set.".to_string()));
        }

        self.new_session();
        self.messages.push(ChatMessage::new(SenderType::System, text));
        self.status.system_message_set = true;
        Ok(())
    }

    /// Reads the system message from a file, see
    /// [`find_system_message_file`] for the lookup order.
    pub fn open_system_message(&mut self, name: &str) -> Result<PathBuf, ChatError> {
        if name.trim().is_empty() {
            return Err(ChatError::EmptyInput("File name is empty.".to_string()));
        }

        let path = find_system_message_file(name, &self.system_message_dirs)
            .ok_or_else(|| ChatError::SystemMessage(format!("File {name} not found.")))?;
        let text = std::fs::read_to_string(&path)?;
        if text.trim().is_empty() {
            return Err(ChatError::SystemMessage(format!(
                "File {name} contains no system message."
            )));
        }

        self.set_system_message(&text)?;
        debug!(path = %path.display(), "System message loaded");
        Ok(path)
    }

    /// Sends `question` to the active model and returns the answer.
    ///
    /// While no title exists the title model runs concurrently with the main
    /// request and both are joined before returning. A failed main request
    /// keeps the user message in the history.
    pub async fn submit_question(&mut self, question: &str) -> Result<String, ChatError> {
        if question.trim().is_empty() {
            return Err(ChatError::EmptyInput(
                "No question - no answer :-)".to_string(),
            ));
        }

        let timeout = self.request_timeout;
        // Built from the question as submitted, before it enters the history
        let title_task = match (&self.status.title, &self.title_model) {
            (None, Some(title_model)) => Some(derive_title(title_model.as_ref(), question, timeout)),
            _ => None,
        };

        self.messages.push(ChatMessage::new(SenderType::User, question));

        // The title future is polled first, so its request goes out first
        let (title, (completion, elapsed)) = tokio::join!(
            async move {
                match title_task {
                    Some(task) => Some(task.await),
                    None => None,
                }
            },
            async {
                let started = Instant::now();
                let completion =
                    complete_with_timeout(self.model.as_ref(), &self.messages, timeout).await;
                (completion, started.elapsed())
            },
        );

        let response = match completion {
            Ok(response) => response,
            Err(e) => {
                warn!(configuration = %self.configuration.name, error = %e, "Completion failed");
                self.apply_title(title);
                return Err(e.into());
            }
        };

        self.status.last_duration = elapsed;
        self.status.last_usage = TokenUsage::from(&response.metrics);
        let answer = response.text.clone();
        self.messages.push(response.into_message());
        self.status.question_number = self.assistant_count() + 1;
        self.apply_title(title);

        debug!(
            question_number = self.status.question_number,
            elapsed_ms = elapsed.as_millis() as u64,
            "Question answered"
        );
        Ok(answer)
    }

    /// Switches to the configuration with the given name (case-insensitive)
    /// or 1-based position. Selecting the active configuration is a no-op.
    /// The conversation is kept.
    pub fn set_configuration(
        &mut self,
        name_or_index: &str,
    ) -> Result<&ChatConfiguration, ChatError> {
        let configuration = self
            .resolve_configuration(name_or_index)
            .ok_or_else(|| ChatError::ConfigurationNotFound(name_or_index.trim().to_string()))?;

        if Arc::ptr_eq(&configuration, &self.configuration) {
            return Ok(&self.configuration);
        }

        self.model = create_model(&self.factory, &configuration)?;
        self.status.configuration_name = configuration.name.clone();
        self.configuration = configuration;
        debug!(configuration = %self.configuration.name, "Configuration switched");
        Ok(&self.configuration)
    }

    /// The expanded configurations in construction order.
    pub fn configurations(&self) -> &[Arc<ChatConfiguration>] {
        &self.configurations
    }

    pub fn configuration(&self) -> &ChatConfiguration {
        &self.configuration
    }

    pub fn title_configuration(&self) -> Option<&ChatConfiguration> {
        self.title_configuration.as_deref()
    }

    pub fn status(&self) -> ChatStatus {
        self.status.clone()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    fn resolve_configuration(&self, name_or_index: &str) -> Option<Arc<ChatConfiguration>> {
        find_by_name(&self.configurations, name_or_index).or_else(|| {
            name_or_index
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|i| *i >= 1)
                .and_then(|i| self.configurations.get(i - 1).cloned())
        })
    }

    fn assistant_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.sender == SenderType::Assistant)
            .count()
    }

    fn apply_title(&mut self, title: Option<Result<String, BackendError>>) {
        match title {
            Some(Ok(title)) if self.status.title.is_none() => self.status.title = Some(title),
            Some(Err(e)) => warn!(error = %e, "Title derivation failed, retrying with next question"),
            _ => {}
        }
    }
}

fn find_by_name(
    configurations: &[Arc<ChatConfiguration>],
    name: &str,
) -> Option<Arc<ChatConfiguration>> {
    configurations.iter().find(|c| c.is_named(name)).cloned()
}

fn create_model(
    factory: &ModelFactory,
    configuration: &ChatConfiguration,
) -> Result<Box<dyn CompletionModel>, ChatError> {
    factory(configuration).map_err(|e| ChatError::ModelInit {
        name: configuration.name.clone(),
        reason: format!("{e:#}"),
    })
}
