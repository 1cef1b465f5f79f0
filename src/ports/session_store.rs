//! Session Store Port - Interface for persisting session snapshots.
//!
//! The workflow core only owns the in-memory context for the duration of a
//! turn. Stores save and load whole snapshots; there is no partial update.

use async_trait::async_trait;

use crate::domain::advisory::ProjectContext;
use crate::domain::foundation::SessionId;

/// Errors that can occur during session storage operations
#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Failed to serialize session: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize session: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Port for persisting and loading session snapshots
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Save a snapshot, replacing any previous one for the same session
    ///
    /// # Errors
    /// Returns `SessionStoreError` if save fails
    async fn save(&self, snapshot: &ProjectContext) -> Result<(), SessionStoreError>;

    /// Load the latest snapshot
    ///
    /// # Errors
    /// Returns `SessionStoreError::NotFound` if no snapshot exists
    async fn load(&self, session_id: &SessionId) -> Result<ProjectContext, SessionStoreError>;

    /// Check whether a snapshot exists
    async fn exists(&self, session_id: &SessionId) -> Result<bool, SessionStoreError>;

    /// Delete a snapshot. Deleting a missing session is not an error.
    async fn delete(&self, session_id: &SessionId) -> Result<(), SessionStoreError>;
}
