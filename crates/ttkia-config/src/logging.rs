//! Tracing subscriber bootstrap.
//!
//! Installs a console layer (human-readable or JSON) behind a reloadable
//! `EnvFilter`. The returned [`LogHandle`] is the only way to change the
//! level afterwards; hand it to the client builder if the client should be
//! able to adjust verbosity.

use std::fmt;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, reload};

use crate::{ConfigError, LogLevel, Result};

/// Crates whose events follow the configured level. Everything else stays at `warn`.
const SDK_TARGETS: &[&str] = &["ttkia_client", "ttkia_config"];

/// Build the filter directive string for a level.
pub fn filter_directive(level: LogLevel) -> String {
    let mut parts: Vec<String> = SDK_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect();
    parts.push("warn".to_string());
    parts.join(",")
}

/// Handle to the installed subscriber's filter.
#[derive(Clone)]
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// Swap the active filter for one at `level`.
    pub fn set_level(&self, level: LogLevel) -> Result<()> {
        self.handle
            .reload(EnvFilter::new(filter_directive(level)))
            .map_err(|e| ConfigError::Logging(e.to_string()))
    }
}

impl fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogHandle").finish_non_exhaustive()
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `level` when set. Fails if a global
/// subscriber is already installed.
pub fn init(level: LogLevel, json: bool) -> Result<LogHandle> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(level)));
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_target(true)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_target(true)))
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::debug!(%level, json, "Logging initialised");
    Ok(LogHandle { handle })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directive() {
        assert_eq!(
            filter_directive(LogLevel::Debug),
            "ttkia_client=debug,ttkia_config=debug,warn"
        );
    }

    #[test]
    fn test_filter_directive_parses() {
        for level in [LogLevel::Trace, LogLevel::Info, LogLevel::Error] {
            assert!(EnvFilter::try_new(filter_directive(level)).is_ok());
        }
    }
}
