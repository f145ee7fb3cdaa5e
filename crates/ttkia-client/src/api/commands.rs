//! Quick commands API.
//!
//! A quick command is a stored prompt template. Invoking one resolves the
//! name against a fresh listing (owned commands first, then public ones) and
//! sends the template through the regular query path.

use super::{endpoints, or_empty};
use crate::client::TtkiaClient;
use crate::error::{Error, Result};
use crate::types::{Prompt, QueryRequest, QueryResponse, QuickCommand, QuickCommandList, Style};

/// Label placed between a command's template and caller-supplied context.
const CONTEXT_LABEL: &str = "Contexto adicional:";

/// How many names of each list are suggested when a command is missing.
const SUGGESTION_LIMIT: usize = 5;

/// Normalize a command name: trimmed, without leading `/`, lowercase.
pub fn normalize_command_name(name: &str) -> String {
    name.trim().trim_start_matches('/').to_lowercase()
}

/// Find a command by name, preferring the caller's own commands.
pub fn resolve_command<'a>(list: &'a QuickCommandList, name: &str) -> Option<&'a QuickCommand> {
    let wanted = normalize_command_name(name);
    let matches = |cmd: &&QuickCommand| normalize_command_name(&cmd.name) == wanted;

    list.commands
        .iter()
        .find(matches)
        .or_else(|| list.public_commands.iter().find(matches))
}

/// Build the query text for a command invocation.
///
/// Non-empty context is appended after a blank line and a label.
pub fn compose_command_query(template: &str, additional_context: Option<&str>) -> String {
    match additional_context {
        Some(context) if !context.is_empty() => {
            format!("{}\n\n{}\n{}", template, CONTEXT_LABEL, context)
        }
        _ => template.to_string(),
    }
}

/// Options for [`CommandsApi::use_command`].
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    /// Workspace to run the query in.
    pub conversation_id: Option<String>,
    /// Text appended to the command's template.
    pub additional_context: Option<String>,
    /// Prompt override; `None` means the default prompt.
    pub prompt: Option<Prompt>,
    pub style: Style,
    pub teacher_mode: bool,
    pub web_search: bool,
}

impl CommandOptions {
    /// Run in a specific workspace.
    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Append context to the template.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.additional_context = Some(context.into());
        self
    }

    /// Override the prompt.
    pub fn with_prompt(mut self, prompt: impl Into<Prompt>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Select a style.
    pub fn with_style(mut self, style: impl Into<Style>) -> Self {
        self.style = style.into();
        self
    }

    /// Request a step-by-step reasoning trace.
    pub fn teacher_mode(mut self, enabled: bool) -> Self {
        self.teacher_mode = enabled;
        self
    }

    /// Allow web search.
    pub fn web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }
}

/// Quick commands API client.
pub struct CommandsApi {
    client: TtkiaClient,
}

impl CommandsApi {
    pub(crate) fn new(client: TtkiaClient) -> Self {
        Self { client }
    }

    /// List owned and public quick commands.
    pub async fn try_list(&self) -> Result<QuickCommandList> {
        let list: QuickCommandList = self.client.get(endpoints::COMMANDS).await?;
        tracing::info!(
            owned = list.commands.len(),
            public = list.public_commands.len(),
            "Fetched quick commands"
        );
        Ok(list)
    }

    /// List quick commands, or an empty listing on failure.
    pub async fn list(&self) -> QuickCommandList {
        or_empty(self.try_list().await, "quick commands")
    }

    /// Run a quick command.
    ///
    /// The listing is fetched on every call. Fails with
    /// [`Error::CommandNotFound`] when neither list has the name.
    pub async fn use_command(&self, name: &str, options: CommandOptions) -> Result<QueryResponse> {
        let normalized = normalize_command_name(name);
        let list = self.try_list().await?;

        let Some(command) = resolve_command(&list, &normalized) else {
            let names = |cmds: &[QuickCommand]| {
                cmds.iter()
                    .take(SUGGESTION_LIMIT)
                    .map(|c| c.name.clone())
                    .collect::<Vec<_>>()
            };
            let err = Error::CommandNotFound {
                name: normalized,
                owned: names(&list.commands),
                public: names(&list.public_commands),
            };
            tracing::error!(error = %err, "Unknown quick command");
            return Err(err);
        };

        tracing::info!(
            command = %normalized,
            public = command.is_public,
            author = command.author.as_deref(),
            "Running quick command"
        );

        let query = compose_command_query(&command.prompt, options.additional_context.as_deref());

        let mut request = QueryRequest::new(query)
            .with_prompt(options.prompt.unwrap_or_default())
            .with_style(options.style)
            .teacher_mode(options.teacher_mode)
            .web_search(options.web_search)
            .with_title(Some(format!("Command: /{}", normalized)));
        request.conversation_id = options.conversation_id;

        self.client.chat().query(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(name: &str, prompt: &str, is_public: bool) -> QuickCommand {
        QuickCommand {
            name: name.to_string(),
            prompt: prompt.to_string(),
            is_public,
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize_command_name("/Analizar_Logs"), "analizar_logs");
        assert_eq!(normalize_command_name("analizar_logs"), "analizar_logs");
        assert_eq!(normalize_command_name("  /CATALYST "), "catalyst");
    }

    #[test]
    fn test_owned_wins_over_public() {
        let list = QuickCommandList {
            commands: vec![cmd("Catalyst", "mine", false)],
            public_commands: vec![cmd("catalyst", "theirs", true)],
            ..Default::default()
        };
        assert_eq!(resolve_command(&list, "/catalyst").unwrap().prompt, "mine");
    }

    #[test]
    fn test_falls_back_to_public() {
        let list = QuickCommandList {
            commands: vec![cmd("other", "x", false)],
            public_commands: vec![cmd("diagnostico_red", "net", true)],
            ..Default::default()
        };
        assert_eq!(
            resolve_command(&list, "DIAGNOSTICO_RED").unwrap().prompt,
            "net"
        );
        assert!(resolve_command(&list, "missing").is_none());
    }

    #[test]
    fn test_compose_with_context() {
        assert_eq!(
            compose_command_query("Analiza los logs", Some("nginx timeout")),
            "Analiza los logs\n\nContexto adicional:\nnginx timeout"
        );
    }

    #[test]
    fn test_compose_without_context() {
        assert_eq!(compose_command_query("Analiza", None), "Analiza");
        assert_eq!(compose_command_query("Analiza", Some("")), "Analiza");
    }
}
