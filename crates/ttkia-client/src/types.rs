//! Request and response types for the TtkIA API.
//!
//! Responses are only loosely specified by the server, so every response type
//! keeps typed fields for the keys the SDK knows about and collects the rest
//! in `extra`. Missing or null keys and values of an unexpected JSON type fall
//! back to their defaults; identifiers and sizes accept numbers or strings.
//! List entries that cannot be read are skipped.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prompt or style catalog, keyed by identifier.
pub type Catalog = HashMap<String, Value>;

// ─────────────────────────────────────────────────────────────────────────────
// Enumerations
// ─────────────────────────────────────────────────────────────────────────────

/// Response style.
///
/// Unknown names received from the server or supplied by callers are kept in
/// [`Style::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Style {
    #[default]
    Concise,
    Detailed,
    Technical,
    Other(String),
}

impl Style {
    /// Wire name.
    pub fn as_str(&self) -> &str {
        match self {
            Style::Concise => "concise",
            Style::Detailed => "detailed",
            Style::Technical => "technical",
            Style::Other(name) => name,
        }
    }
}

impl From<&str> for Style {
    fn from(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "concise" => Style::Concise,
            "detailed" => Style::Detailed,
            "technical" => Style::Technical,
            _ => Style::Other(s.trim().to_string()),
        }
    }
}

impl From<String> for Style {
    fn from(s: String) -> Self {
        Style::from(s.as_str())
    }
}

impl From<Style> for String {
    fn from(style: Style) -> Self {
        style.as_str().to_string()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prompt template selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Prompt {
    /// The server's default prompt.
    #[default]
    Default,
    /// A prompt identified by name.
    Named(String),
}

impl Prompt {
    /// Wire name.
    pub fn as_str(&self) -> &str {
        match self {
            Prompt::Default => "default",
            Prompt::Named(name) => name,
        }
    }
}

impl From<&str> for Prompt {
    fn from(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("default") {
            Prompt::Default
        } else {
            Prompt::Named(s.to_string())
        }
    }
}

impl From<String> for Prompt {
    fn from(s: String) -> Self {
        Prompt::from(s.as_str())
    }
}

impl From<Prompt> for String {
    fn from(prompt: Prompt) -> Self {
        prompt.as_str().to_string()
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session / User
// ─────────────────────────────────────────────────────────────────────────────

/// Summary of the client's session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Result of a live authentication check.
    pub authenticated: bool,
    /// Base URL requests go to.
    pub base_url: String,
    /// Whether a bearer token was configured.
    pub app_token_present: bool,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Body of `/auth/users/me`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub history_chat: HistoryChat,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Conversation history embedded in the user profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryChat {
    #[serde(default, deserialize_with = "lenient::list")]
    pub conversations: Vec<ConversationSummary>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversations
// ─────────────────────────────────────────────────────────────────────────────

/// Entry in the conversation history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(default, deserialize_with = "lenient::string", alias = "id")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `/conversation-info`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationDetail {
    #[serde(default, deserialize_with = "lenient::string")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub messages: Vec<ConversationMessage>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub file_attachments: Vec<Attachment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message inside a conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationMessage {
    #[serde(default, deserialize_with = "lenient::string")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `/new-workspace`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Workspace {
    /// Server-issued conversation identifier, when the server sent one.
    #[serde(default, deserialize_with = "lenient::string", alias = "id")]
    pub conversation_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Request body identifying a conversation.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ConversationRef<'a> {
    pub conversation_id: &'a str,
}

// ─────────────────────────────────────────────────────────────────────────────
// Files
// ─────────────────────────────────────────────────────────────────────────────

/// A file attached to a conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::number")]
    pub size: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        alias = "content_type",
        alias = "type"
    )]
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `/chat-upload`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadedFile {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub size: Option<u64>,
    #[serde(
        default,
        deserialize_with = "lenient::string",
        alias = "content_type",
        alias = "type"
    )]
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────────────────

/// A knowledge-base source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Source {
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Query
// ─────────────────────────────────────────────────────────────────────────────

/// Default title for queries.
pub const DEFAULT_QUERY_TITLE: &str = "New Query";

/// A query to the assistant.
///
/// `sources: None` means "use every source the server lists"; the client
/// fetches the listing before sending. `Some(vec![])` sends no sources.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub query: String,
    pub conversation_id: Option<String>,
    pub prompt: Prompt,
    pub style: Style,
    pub teacher_mode: bool,
    pub sources: Option<Vec<String>>,
    pub attached_files: Vec<Value>,
    pub attached_urls: Vec<Value>,
    pub web_search: bool,
    pub title: Option<String>,
}

impl QueryRequest {
    /// Create a query with default settings.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            conversation_id: None,
            prompt: Prompt::Default,
            style: Style::Concise,
            teacher_mode: false,
            sources: None,
            attached_files: Vec::new(),
            attached_urls: Vec::new(),
            web_search: false,
            title: Some(DEFAULT_QUERY_TITLE.to_string()),
        }
    }

    /// Target a conversation.
    pub fn in_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    /// Select a prompt.
    pub fn with_prompt(mut self, prompt: impl Into<Prompt>) -> Self {
        self.prompt = prompt.into();
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

    /// Allow the assistant to search the web.
    pub fn web_search(mut self, enabled: bool) -> Self {
        self.web_search = enabled;
        self
    }

    /// Use exactly these sources (an empty list disables auto-fill).
    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = Some(sources.into_iter().map(Into::into).collect());
        self
    }

    /// Attach a file descriptor as returned by upload.
    pub fn attach_file(mut self, file: Value) -> Self {
        self.attached_files.push(file);
        self
    }

    /// Attach a URL descriptor.
    pub fn attach_url(mut self, url: Value) -> Self {
        self.attached_urls.push(url);
        self
    }

    /// Set the title (`None` sends null).
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }
}

/// Wire body of `/query_complete`.
#[derive(Debug, Serialize)]
pub(crate) struct QueryPayload<'a> {
    pub query: &'a str,
    pub conversation_id: Option<&'a str>,
    pub prompt: &'a str,
    pub style: &'a str,
    pub teacher_mode: bool,
    pub sources: &'a [String],
    pub attached_files: &'a [Value],
    pub attached_urls: &'a [Value],
    pub web_search: bool,
    pub title: Option<&'a str>,
}

impl<'a> QueryPayload<'a> {
    pub(crate) fn new(request: &'a QueryRequest, sources: &'a [String]) -> Self {
        Self {
            query: &request.query,
            conversation_id: request.conversation_id.as_deref(),
            prompt: request.prompt.as_str(),
            style: request.style.as_str(),
            teacher_mode: request.teacher_mode,
            sources,
            attached_files: &request.attached_files,
            attached_urls: &request.attached_urls,
            web_search: request.web_search,
            title: request.title.as_deref(),
        }
    }
}

/// Body of `/query_complete`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default, deserialize_with = "lenient::text")]
    pub response_text: String,
    /// Confidence as sent by the server (usually a number).
    #[serde(default)]
    pub confidence: Option<Value>,
    /// Knowledge-base documents used.
    #[serde(default, deserialize_with = "lenient::list")]
    pub docs: Vec<Value>,
    /// Links used.
    #[serde(default, deserialize_with = "lenient::list")]
    pub links: Vec<Value>,
    /// Web search results used.
    #[serde(default, deserialize_with = "lenient::list")]
    pub webs: Vec<Value>,
    /// Reasoning steps (teacher mode).
    #[serde(default, deserialize_with = "lenient::list")]
    pub thinking_process: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub inferred_environments: Vec<Value>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub query: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub query_extended: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub message_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub conversation_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl QueryResponse {
    /// Confidence as a number, when the server sent one.
    pub fn confidence_score(&self) -> Option<f64> {
        self.confidence.as_ref().and_then(Value::as_f64)
    }

    /// Display names of the documents used (`source`, else `title`).
    pub fn document_names(&self) -> Vec<&str> {
        self.docs
            .iter()
            .filter_map(|doc| {
                doc.get("source")
                    .or_else(|| doc.get("title"))
                    .and_then(Value::as_str)
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Quick commands
// ─────────────────────────────────────────────────────────────────────────────

/// A named prompt template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickCommand {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub prompt: String,
    #[serde(default, deserialize_with = "lenient::count")]
    pub usage_count: u64,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub is_public: bool,
    #[serde(default, deserialize_with = "lenient::string")]
    pub author: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `/commands/list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuickCommandList {
    /// Commands owned by the caller.
    #[serde(default, deserialize_with = "lenient::list")]
    pub commands: Vec<QuickCommand>,
    /// Commands shared by other users.
    #[serde(default, deserialize_with = "lenient::list")]
    pub public_commands: Vec<QuickCommand>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub total: u64,
    #[serde(default, deserialize_with = "lenient::count")]
    pub public_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_parsing() {
        assert_eq!(Style::from("Detailed"), Style::Detailed);
        assert_eq!(Style::from("technical"), Style::Technical);
        assert_eq!(Style::from("poetic"), Style::Other("poetic".to_string()));
        assert_eq!(String::from(Style::Other("poetic".into())), "poetic");
    }

    #[test]
    fn test_prompt_parsing() {
        assert_eq!(Prompt::from("default"), Prompt::Default);
        assert_eq!(Prompt::from(""), Prompt::Default);
        assert_eq!(Prompt::from("security"), Prompt::Named("security".into()));
    }

    #[test]
    fn test_query_payload_shape() {
        let request = QueryRequest::new("hola")
            .in_conversation("c1")
            .with_style("detailed")
            .teacher_mode(true);
        let sources = vec!["Manual".to_string()];
        let payload = serde_json::to_value(QueryPayload::new(&request, &sources)).unwrap();

        assert_eq!(
            payload,
            serde_json::json!({
                "query": "hola",
                "conversation_id": "c1",
                "prompt": "default",
                "style": "detailed",
                "teacher_mode": true,
                "sources": ["Manual"],
                "attached_files": [],
                "attached_urls": [],
                "web_search": false,
                "title": "New Query"
            })
        );
    }

    #[test]
    fn test_query_payload_null_conversation() {
        let request = QueryRequest::new("q");
        let payload = serde_json::to_value(QueryPayload::new(&request, &[])).unwrap();
        assert!(payload["conversation_id"].is_null());
    }

    #[test]
    fn test_query_response_keeps_unknown_fields() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({
            "response_text": "ok",
            "confidence": 0.87,
            "docs": [{"source": "guide.pdf"}, {"title": "Runbook"}],
            "latency_ms": 1200
        }))
        .unwrap();

        assert_eq!(response.confidence_score(), Some(0.87));
        assert_eq!(response.document_names(), vec!["guide.pdf", "Runbook"]);
        assert_eq!(response.extra["latency_ms"], 1200);
        assert!(response.thinking_process.is_empty());
    }

    #[test]
    fn test_attachment_aliases() {
        let attachment: Attachment = serde_json::from_value(serde_json::json!({
            "name": "report.pdf",
            "size": 2048,
            "content_type": "application/pdf"
        }))
        .unwrap();
        assert_eq!(attachment.mime_type.as_deref(), Some("application/pdf"));
    }

    #[test]
    fn test_user_profile_defaults() {
        let profile: UserProfile = serde_json::from_str(r#"{"username":"ana"}"#).unwrap();
        assert!(profile.history_chat.conversations.is_empty());
        assert_eq!(profile.extra["username"], "ana");
    }

    #[test]
    fn test_query_response_tolerates_nulls_and_numbers() {
        let response: QueryResponse = serde_json::from_value(serde_json::json!({
            "response_text": null,
            "thinking_process": null,
            "docs": "not a list",
            "links": [],
            "message_id": 42,
            "conversation_id": 7
        }))
        .unwrap();

        assert_eq!(response.response_text, "");
        assert!(response.thinking_process.is_empty());
        assert!(response.docs.is_empty());
        assert_eq!(response.message_id.as_deref(), Some("42"));
        assert_eq!(response.conversation_id.as_deref(), Some("7"));
    }

    #[test]
    fn test_workspace_id_fallbacks() {
        let workspace: Workspace = serde_json::from_value(serde_json::json!({"id": "abc"})).unwrap();
        assert_eq!(workspace.conversation_id.as_deref(), Some("abc"));

        let workspace: Workspace = serde_json::from_value(serde_json::json!({"ok": true})).unwrap();
        assert!(workspace.conversation_id.is_none());
        assert_eq!(workspace.extra["ok"], true);
    }

    #[test]
    fn test_attachment_size_as_string() {
        let detail: ConversationDetail = serde_json::from_value(serde_json::json!({
            "file_attachments": [
                {"name": "a.pdf", "size": "2048"},
                {"name": "b.txt", "size": 12.0},
                {"name": "c.bin", "size": "big"}
            ]
        }))
        .unwrap();

        let sizes: Vec<_> = detail.file_attachments.iter().map(|a| a.size).collect();
        assert_eq!(sizes, vec![Some(2048), Some(12), None]);
    }

    #[test]
    fn test_command_list_keeps_partial_entries() {
        let list: QuickCommandList = serde_json::from_value(serde_json::json!({
            "commands": [
                {"prompt": "sin nombre"},
                {"name": "catalyst", "prompt": "ok", "usage_count": "3", "is_public": null},
                "garbage"
            ],
            "public_commands": null,
            "total": "2"
        }))
        .unwrap();

        assert_eq!(list.commands.len(), 2);
        assert_eq!(list.commands[0].name, "");
        assert_eq!(list.commands[1].usage_count, 3);
        assert!(!list.commands[1].is_public);
        assert!(list.public_commands.is_empty());
        assert_eq!(list.total, 2);
    }
}

mod lenient {
    use serde::Deserialize;
    use serde::de::{DeserializeOwned, Deserializer};
    use serde_json::Value;

    /// Null or a value of the wrong shape becomes `T::default()`.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    /// Non-arrays become empty; unreadable entries are dropped.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping malformed list entry");
                    None
                }
            })
            .collect())
    }

    pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(string(deserializer)?.unwrap_or_default())
    }

    /// Non-negative integers, integral floats or numeric strings.
    pub fn number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(number(deserializer)?.unwrap_or_default())
    }
}
