//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `ARCHITECT_ADVISOR`
//! prefix and `__` between nested keys.
//!
//! # Example
//!
//! ```no_run
//! use architect_advisor::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod error;
mod logging;
mod reasoning;
mod storage;
mod workflow;

pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use reasoning::{ReasoningConfig, MAX_RETRIES_LIMIT};
pub use storage::StorageConfig;
pub use workflow::WorkflowConfig;

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Reasoning service (Anthropic) settings
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Workflow limits and thresholds
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Session snapshot storage
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` file if present
    /// 2. Reads environment variables with the `ARCHITECT_ADVISOR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// - `ARCHITECT_ADVISOR__REASONING__API_KEY=...` -> `reasoning.api_key`
    /// - `ARCHITECT_ADVISOR__WORKFLOW__ACCEPT_THRESHOLD=0.8` -> `workflow.accept_threshold`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ARCHITECT_ADVISOR")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.reasoning.validate()?;
        self.workflow.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
