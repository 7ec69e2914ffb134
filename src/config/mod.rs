//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Configuration is loaded with the
//! `NESTQUEST` prefix and nested values use double underscores as
//! separators.
//!
//! # Example
//!
//! ```no_run
//! use nestquest::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod api;
mod auth;
mod error;
mod storage;

pub use api::ApiConfig;
pub use auth::AuthConfig;
pub use error::{ConfigError, ValidationError};
pub use storage::StorageConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Remote session service (base URL, timeout, retries).
    pub api: ApiConfig,

    /// Authentication (user id, bearer token).
    pub auth: AuthConfig,

    /// Durable local store location.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Rust log filter directive.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `NESTQUEST` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `NESTQUEST__API__BASE_URL=...` -> `api.base_url = ...`
    /// - `NESTQUEST__AUTH__TOKEN=...` -> `auth.token = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("NESTQUEST")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` naming the first invalid value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.api.validate()?;
        self.auth.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            api: ApiConfig {
                base_url: "https://api.nestquest.example/questionnaire".to_string(),
                timeout_secs: 30,
                max_retries: 2,
            },
            auth: AuthConfig::for_tests("user-123", "token-abc"),
            storage: StorageConfig::default(),
            log_level: default_log_level(),
        }
    }

    #[test]
    fn valid_configuration_passes_validation() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn default_log_level_is_info() {
        assert_eq!(valid_config().log_level, "info");
    }
}
