//! Mock Reasoning Provider for testing.
//!
//! Provides a configurable mock implementation of the ReasoningProvider port,
//! allowing workflow tests to run without calling a real reasoning service.
//!
//! # Features
//!
//! - Queued responses, consumed in order
//! - Prompt rules: a response returned whenever the prompt contains a marker
//! - Error injection for fallback testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let provider = MockReasoningProvider::new()
//!     .when_prompt_contains_json("Task: architecture critique", json!({
//!         "confidence_score": 0.85,
//!         "verdict": "accept"
//!     }))
//!     .with_response("Plain text answer");
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{GenerateRequest, ProviderInfo, ReasoningError, ReasoningProvider};

/// Response returned when nothing else matches.
pub const DEFAULT_MOCK_RESPONSE: &str = "Mock response";

/// Mock reasoning provider for testing.
#[derive(Debug, Clone)]
pub struct MockReasoningProvider {
    /// Responses returned when the prompt contains a marker. Never consumed.
    rules: Arc<Mutex<Vec<(String, MockResponse)>>>,
    /// Pre-configured responses (consumed in order).
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Returned once rules and queue are exhausted.
    fallback: MockResponse,
    info: ProviderInfo,
    /// Simulated latency per request.
    delay: Duration,
    /// Call history for verification.
    calls: Arc<Mutex<Vec<GenerateRequest>>>,
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    Error(MockError),
}

/// Mock error types for testing error handling.
#[derive(Debug, Clone)]
pub enum MockError {
    RateLimited { retry_after_secs: u32 },
    Unavailable { message: String },
    AuthenticationFailed,
    Network { message: String },
    Timeout { timeout_secs: u32 },
}

impl From<MockError> for ReasoningError {
    fn from(err: MockError) -> Self {
        match err {
            MockError::RateLimited { retry_after_secs } => {
                ReasoningError::rate_limited(retry_after_secs)
            }
            MockError::Unavailable { message } => ReasoningError::unavailable(message),
            MockError::AuthenticationFailed => ReasoningError::AuthenticationFailed,
            MockError::Network { message } => ReasoningError::network(message),
            MockError::Timeout { timeout_secs } => ReasoningError::Timeout { timeout_secs },
        }
    }
}

impl Default for MockReasoningProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockReasoningProvider {
    /// Creates a new mock provider with default settings.
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(VecDeque::new())),
            fallback: MockResponse::Text(DEFAULT_MOCK_RESPONSE.to_string()),
            info: ProviderInfo::new("mock", "mock-model-1"),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider whose every call fails, forcing all deterministic fallbacks.
    pub fn unavailable() -> Self {
        let mut provider = Self::new();
        provider.fallback = MockResponse::Error(MockError::Unavailable {
            message: "mock provider offline".to_string(),
        });
        provider
    }

    /// Adds a text response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        lock(&self.responses).push_back(MockResponse::Text(content.into()));
        self
    }

    /// Adds a JSON response to the queue.
    pub fn with_json(self, value: Value) -> Self {
        self.with_response(value.to_string())
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: MockError) -> Self {
        lock(&self.responses).push_back(MockResponse::Error(error));
        self
    }

    /// Returns `content` for every prompt containing `marker`.
    pub fn when_prompt_contains(self, marker: impl Into<String>, content: impl Into<String>) -> Self {
        lock(&self.rules).push((marker.into(), MockResponse::Text(content.into())));
        self
    }

    /// Returns `value` as JSON for every prompt containing `marker`.
    pub fn when_prompt_contains_json(self, marker: impl Into<String>, value: Value) -> Self {
        self.when_prompt_contains(marker, value.to_string())
    }

    /// Fails every prompt containing `marker`.
    pub fn when_prompt_contains_error(self, marker: impl Into<String>, error: MockError) -> Self {
        lock(&self.rules).push((marker.into(), MockResponse::Error(error)));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Returns the number of calls made to this provider.
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn get_calls(&self) -> Vec<GenerateRequest> {
        lock(&self.calls).clone()
    }

    /// Number of recorded calls whose prompt contains `marker`.
    pub fn calls_containing(&self, marker: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|call| call.prompt.contains(marker))
            .count()
    }

    fn next_response(&self, prompt: &str) -> MockResponse {
        if let Some((_, response)) = lock(&self.rules)
            .iter()
            .find(|(marker, _)| prompt.contains(marker.as_str()))
        {
            return response.clone();
        }
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl ReasoningProvider for MockReasoningProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<String, ReasoningError> {
        let response = self.next_response(&request.prompt);
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match response {
            MockResponse::Text(content) => Ok(content),
            MockResponse::Error(err) => Err(err.into()),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}
