use crate::cli::chat::registry::{
    Arity, CommandContext, CommandDefinition, CommandError, CommandRegistry, CommandResult,
};
use crate::cli::chat::viewer::open_viewer;
use crate::cli::ux::{format_footer_metrics, format_status};
use anyhow::anyhow;
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::warn;

type HandlerFuture<'a> = BoxFuture<'a, Result<CommandResult, CommandError>>;

const DEFAULT_VIEWER_TITLE: &str = "aichat";

/// Builds the command table used by the REPL.
pub fn default_registry() -> CommandRegistry {
    CommandRegistry::new(vec![
        CommandDefinition::new("h", "List commands.", list_commands),
        CommandDefinition::new("s", "Submit the question.", submit)
            .with_busy("Thinking...")
            .with_validator(require_question),
        CommandDefinition::new(
            "sv",
            "Submit the question and show the answer in the viewer.",
            submit_and_view,
        )
        .with_busy("Thinking...")
        .with_validator(require_question),
        CommandDefinition::new("n", "New chat.", new_chat),
        CommandDefinition::new("ns", "New chat, keep system message.", new_chat_keep_system),
        CommandDefinition::new(
            "ss",
            "Set system message from the input or from a file.",
            set_system_message,
        )
        .with_arguments("[<file>]", Arity::AtMost(1)),
        CommandDefinition::new("sc", "Set the configuration.", set_configuration)
            .with_arguments("<name or number>", Arity::AtLeast(1)),
        CommandDefinition::new("lc", "List configurations.", list_configurations),
        CommandDefinition::new(
            "st",
            "Display status e.g. duration, token usage etc.",
            status,
        ),
        CommandDefinition::new("cls", "Clear the screen.", clear_screen),
        CommandDefinition::new("q", "Quit.", quit),
    ])
}

fn require_question(_args: &[String], input: &str) -> Option<String> {
    input
        .trim()
        .is_empty()
        .then(|| "No question - no answer :-)".to_string())
}

fn list_commands<'a>(ctx: CommandContext<'a>, _args: &'a [String], input: &'a str) -> HandlerFuture<'a> {
    async move { Ok(CommandResult::ok(ctx.registry.help()).keep_input(input)) }.boxed()
}

fn submit<'a>(ctx: CommandContext<'a>, _args: &'a [String], input: &'a str) -> HandlerFuture<'a> {
    async move {
        let answer = ctx.session.submit_question(input).await?;
        let footer = format_footer_metrics(&ctx.session.status());
        Ok(CommandResult::ok(format!("{}\n\n{footer}", answer.trim_end())))
    }
    .boxed()
}

fn submit_and_view<'a>(
    ctx: CommandContext<'a>,
    _args: &'a [String],
    input: &'a str,
) -> HandlerFuture<'a> {
    async move {
        // Checked first so the question is not sent without a place to show it
        let viewer = ctx
            .viewer
            .ok_or_else(|| anyhow!("No viewer configured, set 'viewer' in the config file."))?;

        let answer = ctx.session.submit_question(input).await?;
        let status = ctx.session.status();
        let title = status.title.as_deref().unwrap_or(DEFAULT_VIEWER_TITLE).trim();
        let footer = format_footer_metrics(&status);

        match open_viewer(viewer, title, &answer).await {
            Ok(()) => Ok(CommandResult::ok(format!("{}\n\n{footer}", answer.trim_end()))),
            Err(e) => {
                warn!(viewer, error = %e, "Viewer failed");
                Ok(CommandResult::error(format!(
                    "{}\n\n{e:#}",
                    answer.trim_end()
                )))
            }
        }
    }
    .boxed()
}

fn new_chat<'a>(ctx: CommandContext<'a>, _args: &'a [String], _input: &'a str) -> HandlerFuture<'a> {
    async move {
        ctx.session.new_session();
        Ok(CommandResult::empty().with_clear_screen())
    }
    .boxed()
}

fn new_chat_keep_system<'a>(
    ctx: CommandContext<'a>,
    _args: &'a [String],
    _input: &'a str,
) -> HandlerFuture<'a> {
    async move {
        ctx.session.new_session_keep_system_message();
        let output = if ctx.session.status().system_message_set {
            "System message set."
        } else {
            "No system message to keep."
        };
        Ok(CommandResult::ok(output).with_clear_screen())
    }
    .boxed()
}

fn set_system_message<'a>(
    ctx: CommandContext<'a>,
    args: &'a [String],
    input: &'a str,
) -> HandlerFuture<'a> {
    async move {
        match args.first() {
            Some(name) => {
                let path = ctx.session.open_system_message(name)?;
                Ok(CommandResult::ok(format!(
                    "System message set from {}.",
                    path.display()
                )))
            }
            None => {
                ctx.session.set_system_message(input)?;
                Ok(CommandResult::ok("System message set."))
            }
        }
    }
    .boxed()
}

fn set_configuration<'a>(
    ctx: CommandContext<'a>,
    args: &'a [String],
    input: &'a str,
) -> HandlerFuture<'a> {
    async move {
        // Configuration names may contain spaces
        let name = args.join(" ");
        let configuration = ctx.session.set_configuration(&name)?;
        Ok(CommandResult::ok(format!("Configuration set to {}.", configuration.name)).keep_input(input))
    }
    .boxed()
}

fn list_configurations<'a>(
    ctx: CommandContext<'a>,
    _args: &'a [String],
    input: &'a str,
) -> HandlerFuture<'a> {
    async move {
        let active = ctx.session.configuration().name.as_str();
        let title = ctx.session.title_configuration().map(|c| c.name.as_str());

        let mut lines = vec!["Configurations:".to_string()];
        for (i, configuration) in ctx.session.configurations().iter().enumerate() {
            let mut line = format!("{}. {}", i + 1, configuration.name);
            if configuration.name == active {
                line.push_str(" *");
            }
            if Some(configuration.name.as_str()) == title {
                line.push_str(" (title)");
            }
            lines.push(line);
        }
        Ok(CommandResult::ok(lines.join("\n")).keep_input(input))
    }
    .boxed()
}

fn status<'a>(ctx: CommandContext<'a>, _args: &'a [String], input: &'a str) -> HandlerFuture<'a> {
    async move { Ok(CommandResult::ok(format_status(&ctx.session.status())).keep_input(input)) }
        .boxed()
}

fn clear_screen<'a>(
    _ctx: CommandContext<'a>,
    _args: &'a [String],
    _input: &'a str,
) -> HandlerFuture<'a> {
    async move { Ok(CommandResult::empty().with_clear_screen()) }.boxed()
}

fn quit<'a>(_ctx: CommandContext<'a>, _args: &'a [String], _input: &'a str) -> HandlerFuture<'a> {
    async move { Err(CommandError::Quit) }.boxed()
}
