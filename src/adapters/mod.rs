//! Adapters - Implementations of port interfaces.
//!
//! - `reasoning` - Reasoning service providers (Anthropic HTTP, mock)
//! - `storage` - Session snapshot stores (YAML files, in-memory)

pub mod reasoning;
pub mod storage;

pub use reasoning::{AnthropicConfig, AnthropicReasoningProvider, MockError, MockReasoningProvider};
pub use storage::{FileSessionStore, InMemorySessionStore};
