//! Reasoning Provider Port - Interface to the external reasoning service.
//!
//! The workflow calls the reasoning service in two modes:
//!
//! - `generate` - free text (rendering questions, diagrams)
//! - `generate_structured` - JSON validated against a schema (extraction,
//!   selection, critique)
//!
//! Both are stateless. Callers treat every error the same way: log it and
//! fall back to a deterministic default.
//!
//! # Example
//!
//! ```ignore
//! let critique: Critique = generate_typed(provider.as_ref(), &prompt, &schema, None).await?;
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::domain::structured::{
    extract_json, validate_against_schema, ExtractionError, SchemaValidationError,
};

/// Temperature used for structured calls.
pub const STRUCTURED_TEMPERATURE: f32 = 0.3;

/// Port for the reasoning service.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    /// Generates free text for a prompt.
    async fn generate(&self, request: GenerateRequest) -> Result<String, ReasoningError>;

    /// Generates a JSON value that conforms to `schema`.
    ///
    /// The default implementation embeds the schema in the prompt, asks for
    /// JSON only, extracts the payload from the response and validates it.
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
        system_prompt: Option<&str>,
    ) -> Result<Value, ReasoningError> {
        let mut request = GenerateRequest::new(structured_prompt(prompt, schema))
            .with_temperature(STRUCTURED_TEMPERATURE);
        if let Some(system) = system_prompt {
            request = request.with_system_prompt(system);
        }
        let text = self.generate(request).await?;
        parse_structured(&text, schema)
    }

    /// Provider name and model, for logs.
    fn provider_info(&self) -> ProviderInfo;
}

/// Calls `generate_structured` and deserializes the result into `T`.
///
/// Deserialization is the final boundary check: enum-typed fields reject
/// unknown values here.
pub async fn generate_typed<T, P>(
    provider: &P,
    prompt: &str,
    schema: &Value,
    system_prompt: Option<&str>,
) -> Result<T, ReasoningError>
where
    T: DeserializeOwned,
    P: ReasoningProvider + ?Sized,
{
    let value = provider
        .generate_structured(prompt, schema, system_prompt)
        .await?;
    serde_json::from_value(value).map_err(|e| ReasoningError::SchemaViolation(e.to_string()))
}

/// Appends the schema and the JSON-only instruction to a prompt.
pub fn structured_prompt(prompt: &str, schema: &Value) -> String {
    let schema_text = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "{prompt}\n\nRespond ONLY with a JSON object matching this schema:\n```json\n{schema_text}\n```\nDo not include any text outside the JSON."
    )
}

/// Extracts, parses and validates a structured response.
pub fn parse_structured(text: &str, schema: &Value) -> Result<Value, ReasoningError> {
    let json = extract_json(text)?;
    let value: Value =
        serde_json::from_str(&json).map_err(|e| ReasoningError::parse(e.to_string()))?;
    validate_against_schema(&value, schema)?;
    Ok(value)
}

/// Request for a free-text generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Provider metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    /// Provider name (e.g., "anthropic", "mock").
    pub name: String,
    /// Model identifier.
    pub model: String,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// Errors from the reasoning service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReasoningError {
    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Response could not be parsed.
    #[error("parse error: {0}")]
    Parse(String),

    /// Structured response did not match the expected schema.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Invalid request configuration.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl ReasoningError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReasoningError::RateLimited { .. }
                | ReasoningError::Unavailable { .. }
                | ReasoningError::Network(_)
                | ReasoningError::Timeout { .. }
        )
    }
}

impl From<ExtractionError> for ReasoningError {
    fn from(err: ExtractionError) -> Self {
        ReasoningError::Parse(err.to_string())
    }
}

impl From<SchemaValidationError> for ReasoningError {
    fn from(err: SchemaValidationError) -> Self {
        ReasoningError::SchemaViolation(err.to_string())
    }
}
