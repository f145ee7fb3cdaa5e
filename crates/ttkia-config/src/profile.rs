//! Connection profiles for TtkIA servers.
//!
//! A single YAML file holds named profiles and shared defaults:
//!
//! ```yaml
//! api-version: v1
//! kind: ClientConfig
//!
//! current-profile: local
//!
//! profiles:
//!   - name: local
//!     server: http://localhost:8000
//!     token: dev-token
//!   - name: prod
//!     server: https://ttkia.example.com/api
//!     token-file: ~/.config/ttkia/prod.token
//!     max-retries: 5
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, LogLevel, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// API version for the client config file format.
pub const API_VERSION: &str = "v1";

/// Kind identifier for client config files.
pub const KIND: &str = "ClientConfig";

/// Default config filename.
const CLIENT_CONFIG_FILE: &str = "client.yaml";

/// Overrides the config directory.
pub const ENV_CONFIG_DIR: &str = "TTKIA_CONFIG_DIR";

/// Overrides the server URL of the resolved profile.
pub const ENV_BASE_URL: &str = "TTKIA_BASE_URL";

/// Overrides the bearer token of the resolved profile.
pub const ENV_APP_TOKEN: &str = "TTKIA_APP_TOKEN";

/// Overrides the log level of the resolved profile.
pub const ENV_LOG_LEVEL: &str = "TTKIA_LOG_LEVEL";

// ─────────────────────────────────────────────────────────────────────────────
// Client Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root client configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClientConfig {
    /// API version (always "v1" currently).
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Config kind (always "ClientConfig").
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Name of the default profile.
    #[serde(default)]
    pub current_profile: Option<String>,

    /// Named connection profiles.
    #[serde(default)]
    pub profiles: Vec<Profile>,

    /// Settings applied when a profile leaves them unset.
    #[serde(default)]
    pub defaults: ClientDefaults,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_kind() -> String {
    KIND.to_string()
}

impl ClientConfig {
    /// Create an empty client config.
    pub fn new() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            ..Default::default()
        }
    }

    /// Parse from a YAML string.
    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        serde_yaml::from_str(yaml_str).map_err(|e| ConfigError::ParseYaml(e.to_string()))
    }

    /// Serialize to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::ParseYaml(e.to_string()))
    }

    /// Get the current profile, if set and valid.
    pub fn current(&self) -> Option<&Profile> {
        self.current_profile
            .as_ref()
            .and_then(|name| self.get_profile(name))
    }

    /// Get a profile by name.
    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Add or replace a profile.
    pub fn set_profile(&mut self, profile: Profile) {
        if let Some(existing) = self.profiles.iter_mut().find(|p| p.name == profile.name) {
            *existing = profile;
        } else {
            self.profiles.push(profile);
        }
    }

    /// Remove a profile by name, clearing `current-profile` if it pointed there.
    pub fn remove_profile(&mut self, name: &str) -> Option<Profile> {
        let pos = self.profiles.iter().position(|p| p.name == name)?;
        if self.current_profile.as_deref() == Some(name) {
            self.current_profile = None;
        }
        Some(self.profiles.remove(pos))
    }

    /// Set the current profile by name.
    pub fn use_profile(&mut self, name: &str) -> Result<()> {
        if self.get_profile(name).is_some() {
            self.current_profile = Some(name.to_string());
            Ok(())
        } else {
            Err(ConfigError::ProfileNotFound(name.to_string()))
        }
    }

    /// List all profile names.
    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    /// Resolve connection settings using the process environment.
    ///
    /// `name` selects a profile; `None` uses `current-profile`.
    pub fn resolve(&self, name: Option<&str>) -> Result<ResolvedProfile> {
        self.resolve_with_env(name, |key| std::env::var(key).ok())
    }

    /// Resolve connection settings with an explicit environment lookup.
    ///
    /// Precedence: environment override, then profile value, then defaults.
    /// The token comes from `token`, then `token-file`, then `token-env`.
    /// A configured `token-file` that cannot be read is an error.
    pub fn resolve_with_env<F>(&self, name: Option<&str>, env: F) -> Result<ResolvedProfile>
    where
        F: Fn(&str) -> Option<String>,
    {
        let profile = match name {
            Some(name) => Some(
                self.get_profile(name)
                    .ok_or_else(|| ConfigError::ProfileNotFound(name.to_string()))?,
            ),
            None => self.current(),
        };

        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let base_url = env(ENV_BASE_URL)
            .or_else(|| profile.map(|p| p.server.clone()))
            .ok_or_else(|| ConfigError::MissingField {
                field: "server".to_string(),
                context: format!("profile (or set {})", ENV_BASE_URL),
            })?;

        let token = match env(ENV_APP_TOKEN) {
            Some(token) => Some(token),
            None => match profile {
                Some(p) => p.resolve_token(&env)?,
                None => None,
            },
        };

        let log_level = env(ENV_LOG_LEVEL)
            .map(|v| LogLevel::parse_lossy(&v))
            .or_else(|| profile.and_then(|p| p.log_level))
            .unwrap_or(self.defaults.log_level);

        Ok(ResolvedProfile {
            name: profile.map(|p| p.name.clone()),
            base_url,
            token,
            timeout: Duration::from_secs(
                profile
                    .and_then(|p| p.timeout)
                    .unwrap_or(self.defaults.timeout),
            ),
            max_retries: profile
                .and_then(|p| p.max_retries)
                .unwrap_or(self.defaults.max_retries),
            log_level,
            logger_name: self.defaults.logger_name.clone(),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Profile
// ─────────────────────────────────────────────────────────────────────────────

/// A named connection profile (server + credential bundle).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Profile {
    /// Unique name for this profile.
    pub name: String,

    /// Base URL of the assistant API.
    pub server: String,

    /// Literal bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Path to a file containing the bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<PathBuf>,

    /// Environment variable containing the bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    /// Request timeout override (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Retry budget override for idempotent reads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    /// Log level override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Profile {
    /// Create a profile with just a name and server URL.
    pub fn new(name: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            ..Default::default()
        }
    }

    /// Set a literal token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read the token from a file.
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Read the token from an environment variable.
    pub fn with_token_env(mut self, var: impl Into<String>) -> Self {
        self.token_env = Some(var.into());
        self
    }

    /// Set the timeout in seconds.
    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    fn resolve_token<F>(&self, env: &F) -> Result<Option<String>>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_empty()) {
            return Ok(Some(token.clone()));
        }
        if let Some(path) = &self.token_file {
            let expanded = expand_path(path);
            let token = std::fs::read_to_string(&expanded).map_err(|e| {
                tracing::warn!(path = %expanded.display(), error = %e, "Cannot read token file");
                ConfigError::ReadFile {
                    path: expanded.display().to_string(),
                    source: e,
                }
            })?;
            return Ok(Some(token.trim().to_string()));
        }
        Ok(self.token_env.as_deref().and_then(env))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Defaults / Resolution
// ─────────────────────────────────────────────────────────────────────────────

/// Default settings applied to all profiles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ClientDefaults {
    /// Request timeout in seconds.
    pub timeout: u64,

    /// Retry budget for idempotent reads.
    pub max_retries: u32,

    /// Log level.
    pub log_level: LogLevel,

    /// Identity recorded on the client's tracing span.
    pub logger_name: String,
}

impl Default for ClientDefaults {
    fn default() -> Self {
        Self {
            timeout: 30,
            max_retries: 3,
            log_level: LogLevel::Info,
            logger_name: "ttkia_sdk".to_string(),
        }
    }
}

/// Fully resolved connection settings, ready to build a client from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedProfile {
    /// Profile the settings came from, if any.
    pub name: Option<String>,
    /// Server base URL.
    pub base_url: String,
    /// Bearer token.
    pub token: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry budget for idempotent reads.
    pub max_retries: u32,
    /// Log level.
    pub log_level: LogLevel,
    /// Logger identity.
    pub logger_name: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading / Saving
// ─────────────────────────────────────────────────────────────────────────────

/// Directory holding the client config (`$TTKIA_CONFIG_DIR` or `~/.config/ttkia`).
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(ENV_CONFIG_DIR)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join("ttkia"))
}

/// Get the path to the client config file.
pub fn client_config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CLIENT_CONFIG_FILE))
}

/// Load the client configuration.
///
/// Returns a default config if the file doesn't exist.
pub fn load_client_config() -> Result<ClientConfig> {
    load_client_config_from(client_config_path().as_deref())
}

/// Load client config from a specific path.
pub fn load_client_config_from(path: Option<&Path>) -> Result<ClientConfig> {
    let Some(path) = path else {
        return Ok(ClientConfig::new());
    };

    if !path.exists() {
        tracing::debug!(path = %path.display(), "No client config file, using defaults");
        return Ok(ClientConfig::new());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;

    ClientConfig::from_yaml(&contents)
}

/// Save the client configuration.
pub fn save_client_config(config: &ClientConfig) -> Result<()> {
    let path = client_config_path()
        .ok_or_else(|| ConfigError::Other("Could not determine config directory".to_string()))?;
    save_client_config_to(config, &path)
}

/// Save client config to a specific path.
pub fn save_client_config_to(config: &ClientConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.display().to_string(),
            source: e,
        })?;
    }

    let contents = config.to_yaml()?;
    std::fs::write(path, contents).map_err(|e| ConfigError::WriteFile {
        path: path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// Expand ~ to home directory in paths.
fn expand_path(path: &Path) -> PathBuf {
    if let Some(rest) = path.to_str().and_then(|s| s.strip_prefix("~/"))
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_empty_config() {
        let config = ClientConfig::new();
        assert_eq!(config.api_version, API_VERSION);
        assert_eq!(config.kind, KIND);
        assert!(config.current_profile.is_none());
        assert!(config.profiles.is_empty());
        assert_eq!(config.defaults.max_retries, 3);
        assert_eq!(config.defaults.logger_name, "ttkia_sdk");
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
current-profile: prod
profiles:
  - name: local
    server: http://localhost:8000
    token: dev
  - name: prod
    server: https://ttkia.example.com/api
    token-env: PROD_TOKEN
    timeout: 60
    max-retries: 5
    log-level: DEBUG
defaults:
  timeout: 20
  log-level: warn
"#;
        let config = ClientConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.profiles.len(), 2);
        assert_eq!(config.current().unwrap().name, "prod");

        let prod = config.get_profile("prod").unwrap();
        assert_eq!(prod.timeout, Some(60));
        assert_eq!(prod.max_retries, Some(5));
        assert_eq!(prod.log_level, Some(LogLevel::Debug));
        assert_eq!(config.defaults.timeout, 20);
        assert_eq!(config.defaults.log_level, LogLevel::Warn);
        // Unset defaults keep their built-in values
        assert_eq!(config.defaults.max_retries, 3);
    }

    #[test]
    fn test_unknown_log_level_falls_back() {
        let yaml = r#"
profiles:
  - name: a
    server: http://a
    log-level: chatty
"#;
        let config = ClientConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.profiles[0].log_level, Some(LogLevel::Info));
    }

    #[test]
    fn test_resolve_profile_over_defaults() {
        let mut config = ClientConfig::new();
        config.set_profile(
            Profile::new("prod", "https://ttkia.example.com")
                .with_token_env("PROD_TOKEN")
                .with_timeout(60),
        );
        config.use_profile("prod").unwrap();

        let resolved = config
            .resolve_with_env(None, env_from(&[("PROD_TOKEN", "abc")]))
            .unwrap();
        assert_eq!(resolved.name.as_deref(), Some("prod"));
        assert_eq!(resolved.base_url, "https://ttkia.example.com");
        assert_eq!(resolved.token.as_deref(), Some("abc"));
        assert_eq!(resolved.timeout, Duration::from_secs(60));
        assert_eq!(resolved.max_retries, 3);
        assert_eq!(resolved.log_level, LogLevel::Info);
    }

    #[test]
    fn test_resolve_env_overrides() {
        let mut config = ClientConfig::new();
        config.set_profile(Profile::new("local", "http://localhost:8000").with_token("dev"));

        let resolved = config
            .resolve_with_env(
                Some("local"),
                env_from(&[
                    (ENV_BASE_URL, "http://override:9000"),
                    (ENV_APP_TOKEN, "envtoken"),
                    (ENV_LOG_LEVEL, "debug"),
                ]),
            )
            .unwrap();
        assert_eq!(resolved.base_url, "http://override:9000");
        assert_eq!(resolved.token.as_deref(), Some("envtoken"));
        assert_eq!(resolved.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_resolve_env_only() {
        let config = ClientConfig::new();
        let resolved = config
            .resolve_with_env(None, env_from(&[(ENV_BASE_URL, "http://only-env")]))
            .unwrap();
        assert!(resolved.name.is_none());
        assert_eq!(resolved.base_url, "http://only-env");
        assert!(resolved.token.is_none());
        assert_eq!(resolved.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_without_server_fails() {
        let config = ClientConfig::new();
        let err = config.resolve_with_env(None, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
    }

    #[test]
    fn test_resolve_unknown_profile() {
        let config = ClientConfig::new();
        let err = config.resolve_with_env(Some("nope"), no_env).unwrap_err();
        assert!(matches!(err, ConfigError::ProfileNotFound(_)));
    }

    #[test]
    fn test_token_file() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = dir.path().join("token");
        std::fs::write(&token_path, "  filetoken\n").unwrap();

        let mut config = ClientConfig::new();
        config.set_profile(
            Profile::new("f", "http://f")
                .with_token_file(&token_path)
                .with_token_env("IGNORED"),
        );
        let resolved = config
            .resolve_with_env(Some("f"), env_from(&[("IGNORED", "envtoken")]))
            .unwrap();
        assert_eq!(resolved.token.as_deref(), Some("filetoken"));
    }

    #[test]
    fn test_missing_token_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.token");

        let mut config = ClientConfig::new();
        config.set_profile(
            Profile::new("f", "http://f")
                .with_token_file(&missing)
                .with_token_env("FALLBACK"),
        );
        let err = config
            .resolve_with_env(Some("f"), env_from(&[("FALLBACK", "envtoken")]))
            .unwrap_err();
        assert!(
            matches!(&err, ConfigError::ReadFile { path, .. } if path == &missing.display().to_string())
        );
    }

    #[test]
    fn test_remove_profile_clears_current() {
        let mut config = ClientConfig::new();
        config.set_profile(Profile::new("a", "http://a"));
        config.set_profile(Profile::new("b", "http://b"));
        config.use_profile("a").unwrap();

        assert_eq!(config.remove_profile("b").unwrap().name, "b");
        assert_eq!(config.current_profile.as_deref(), Some("a"));

        config.remove_profile("a");
        assert!(config.current_profile.is_none());
        assert!(config.remove_profile("a").is_none());
    }

    #[test]
    fn test_set_profile_replaces() {
        let mut config = ClientConfig::new();
        config.set_profile(Profile::new("a", "http://a"));
        config.set_profile(Profile::new("a", "http://a2"));
        assert_eq!(config.profile_names(), vec!["a"]);
        assert_eq!(config.profiles[0].server, "http://a2");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.yaml");

        let mut config = ClientConfig::new();
        config.set_profile(
            Profile::new("local", "http://localhost:8000")
                .with_max_retries(1)
                .with_log_level(LogLevel::Trace),
        );
        config.current_profile = Some("local".to_string());

        save_client_config_to(&config, &path).unwrap();
        let loaded = load_client_config_from(Some(&path)).unwrap();

        assert_eq!(loaded.current_profile.as_deref(), Some("local"));
        let local = loaded.get_profile("local").unwrap();
        assert_eq!(local.max_retries, Some(1));
        assert_eq!(local.log_level, Some(LogLevel::Trace));
    }

    #[test]
    fn test_load_missing_file_gives_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_client_config_from(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert!(config.profiles.is_empty());
    }

    #[test]
    fn test_expand_path() {
        let path = PathBuf::from("/absolute/path");
        assert_eq!(expand_path(&path), path);
        if dirs::home_dir().is_some() {
            let expanded = expand_path(Path::new("~/x/token"));
            assert!(!expanded.to_str().unwrap().starts_with("~/"));
        }
    }
}
