//! API endpoint implementations.
//!
//! Listing operations come in two forms: `try_*` returns the error, the plain
//! form logs it and returns an empty value. Detail and mutating operations
//! always return the error.

mod auth;
mod catalog;
mod chat;
mod commands;
mod conversations;
mod files;

pub use auth::AuthApi;
pub use catalog::CatalogApi;
pub use chat::ChatApi;
pub use commands::{
    CommandOptions, CommandsApi, compose_command_query, normalize_command_name, resolve_command,
};
pub use conversations::ConversationsApi;
pub use files::{FilesApi, content_type_for};

/// Endpoint paths, relative to the base URL.
pub(crate) mod endpoints {
    pub const ENV: &str = "env";
    pub const USER_ME: &str = "auth/users/me";
    pub const CONVERSATION_INFO: &str = "conversation-info";
    pub const NEW_WORKSPACE: &str = "new-workspace";
    pub const SOURCES: &str = "get_sources";
    pub const PROMPTS: &str = "get_prompts";
    pub const STYLES: &str = "get_styles";
    pub const UPLOAD: &str = "chat-upload";
    pub const QUERY: &str = "query_complete";
    pub const FORGET: &str = "forget";
    pub const COMMANDS: &str = "commands/list";
}

/// Unwrap a listing result, logging the error and substituting the empty value.
pub(crate) fn or_empty<T: Default>(result: crate::Result<T>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to fetch {}", what);
        T::default()
    })
}
