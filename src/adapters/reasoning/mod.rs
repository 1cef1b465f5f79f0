//! Reasoning service adapters.

mod anthropic_reasoning_provider;
mod mock_reasoning_provider;

pub use anthropic_reasoning_provider::{AnthropicConfig, AnthropicReasoningProvider};
pub use mock_reasoning_provider::{
    MockError, MockReasoningProvider, MockResponse, DEFAULT_MOCK_RESPONSE,
};
