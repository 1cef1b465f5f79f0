//! Ports - the external seams of the advisory engine.
//!
//! - `ReasoningProvider` - free-text and schema-validated structured generation
//! - `SessionStore` - whole-snapshot persistence of session state

mod reasoning_provider;
mod session_store;

pub use reasoning_provider::{
    generate_typed, parse_structured, structured_prompt, GenerateRequest, ProviderInfo,
    ReasoningError, ReasoningProvider, STRUCTURED_TEMPERATURE,
};
pub use session_store::{SessionStore, SessionStoreError};
