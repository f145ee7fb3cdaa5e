//! Client error types.

use std::path::PathBuf;

use thiserror::Error;

/// Longest body excerpt carried in an API error message.
const MAX_ERROR_BODY: usize = 300;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport failed (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error detail from the body, or a body excerpt.
        message: String,
    },

    /// Local file to upload does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Quick command not present in the owned or public lists.
    #[error("{}", command_not_found_message(name, owned, public))]
    CommandNotFound {
        /// Normalized requested name.
        name: String,
        /// Up to five owned command names.
        owned: Vec<String>,
        /// Up to five public command names.
        public: Vec<String>,
    },

    /// Reading a local file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn command_not_found_message(name: &str, owned: &[String], public: &[String]) -> String {
    let list = |names: &[String]| {
        if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        }
    };
    format!(
        "Command '/{}' not found. Your commands: {}. Public commands: {}",
        name,
        list(owned),
        list(public)
    )
}

impl Error {
    /// Build an API error from a status code and raw response body.
    ///
    /// Prefers a `detail`, `message` or `error` string field when the body is
    /// JSON, otherwise keeps a truncated excerpt of the body.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                ["detail", "message", "error"]
                    .iter()
                    .find_map(|key| v.get(key).and_then(|d| d.as_str()).map(str::to_string))
            });

        let message = match detail {
            Some(detail) => detail,
            None if body.trim().is_empty() => format!("HTTP {}", status),
            None => truncate(body.trim(), MAX_ERROR_BODY),
        };

        Error::Api { status, message }
    }

    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a not-found error (remote 404 or local lookup).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound(_) | Error::CommandNotFound { .. } | Error::Api { status: 404, .. }
        )
    }

    /// Check if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Api { status: 401 | 403, .. })
    }

    /// Check if this is a rate limit error.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::Api { status: 429, .. })
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }

    /// Whether retrying the same idempotent request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            _ => self.is_server_error() || self.is_rate_limited(),
        }
    }
}

/// Truncate to at most `max` characters on a char boundary.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_prefers_detail() {
        let err = Error::from_response(422, r#"{"detail":"conversation_id required"}"#);
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 422);
                assert_eq!(message, "conversation_id required");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_from_response_plain_body() {
        let err = Error::from_response(502, "Bad Gateway");
        assert_eq!(err.to_string(), "API error (502): Bad Gateway");
        assert_eq!(err.status(), Some(502));
    }

    #[test]
    fn test_from_response_empty_body() {
        let err = Error::from_response(500, "   ");
        assert_eq!(err.to_string(), "API error (500): HTTP 500");
    }

    #[test]
    fn test_classification() {
        assert!(Error::from_response(404, "").is_not_found());
        assert!(Error::from_response(401, "").is_auth_error());
        assert!(Error::from_response(429, "").is_rate_limited());
        assert!(Error::from_response(429, "").is_transient());
        assert!(Error::from_response(503, "").is_server_error());
        assert!(Error::from_response(503, "").is_transient());
        assert!(!Error::from_response(400, "").is_transient());
        assert!(Error::FileNotFound(PathBuf::from("x")).is_not_found());
        assert!(!Error::FileNotFound(PathBuf::from("x")).is_transient());
    }

    #[test]
    fn test_command_not_found_message() {
        let err = Error::CommandNotFound {
            name: "missing".to_string(),
            owned: vec!["a".to_string(), "b".to_string()],
            public: vec![],
        };
        assert_eq!(
            err.to_string(),
            "Command '/missing' not found. Your commands: a, b. Public commands: none"
        );
    }

    #[test]
    fn test_truncate_char_boundary() {
        assert_eq!(truncate("áéíóú", 3), "áéí...");
        assert_eq!(truncate("short", 10), "short");
    }
}
