//! Configuration for the TtkIA client SDK.
//!
//! Provides:
//! - Named connection profiles in a YAML file (`current-profile` selects the default)
//! - Environment overrides (`TTKIA_BASE_URL`, `TTKIA_APP_TOKEN`, `TTKIA_LOG_LEVEL`)
//! - A closed [`LogLevel`] set parsed leniently at the boundary
//! - A `tracing-subscriber` bootstrap whose level can be changed at runtime
//!
//! ```yaml
//! current-profile: prod
//! profiles:
//!   - name: prod
//!     server: https://ttkia.example.com/api
//!     token-env: TTKIA_PROD_TOKEN
//!     timeout: 60
//! defaults:
//!   max-retries: 3
//!   log-level: info
//! ```

pub mod error;
pub mod level;
pub mod logging;
pub mod profile;

pub use error::{ConfigError, Result};
pub use level::LogLevel;
pub use logging::LogHandle;
pub use profile::{
    ClientConfig, ClientDefaults, Profile, ResolvedProfile, client_config_path, config_dir,
    load_client_config, load_client_config_from, save_client_config, save_client_config_to,
};
