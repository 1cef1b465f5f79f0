//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid reasoning timeout")]
    InvalidTimeout,

    #[error("max_retries must be at most {max}, got {actual}")]
    TooManyRetries { max: u32, actual: u32 },

    #[error("{field} must be between 0 and 1, got {value}")]
    ThresholdOutOfRange { field: &'static str, value: f64 },

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),

    #[error("Unknown log format: {0}")]
    UnknownLogFormat(String),
}
