//! Storage Adapters
//!
//! Implementations of the SessionStore port for persisting session snapshots.
//!
//! ## Available Adapters
//!
//! - **FileSessionStore** - Stores snapshots as YAML files on disk
//! - **InMemorySessionStore** - Stores snapshots in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileSessionStore, InMemorySessionStore};
//!
//! let store = FileSessionStore::new("./sessions");
//! let store = InMemorySessionStore::new();
//! ```

mod file_session_store;
mod in_memory_session_store;

pub use file_session_store::FileSessionStore;
pub use in_memory_session_store::InMemorySessionStore;
