//! In-Memory Session Store Adapter
//!
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::advisory::ProjectContext;
use crate::domain::foundation::SessionId;
use crate::ports::{SessionStore, SessionStoreError};

/// In-memory storage for session snapshots
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, ProjectContext>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Clear all stored data
    pub async fn clear(&self) {
        self.sessions.write().await.clear();
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, snapshot: &ProjectContext) -> Result<(), SessionStoreError> {
        self.sessions
            .write()
            .await
            .insert(snapshot.session_id, snapshot.clone());
        Ok(())
    }

    async fn load(&self, session_id: &SessionId) -> Result<ProjectContext, SessionStoreError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or(SessionStoreError::NotFound(*session_id))
    }

    async fn exists(&self, session_id: &SessionId) -> Result<bool, SessionStoreError> {
        Ok(self.sessions.read().await.contains_key(session_id))
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), SessionStoreError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_load_delete() {
        let store = InMemorySessionStore::new();
        let ctx = ProjectContext::new(SessionId::new(), "A booking site");

        store.save(&ctx).await.unwrap();
        assert_eq!(store.session_count().await, 1);
        assert!(store.exists(&ctx.session_id).await.unwrap());

        let loaded = store.load(&ctx.session_id).await.unwrap();
        assert_eq!(loaded.initial_summary, "A booking site");

        store.delete(&ctx.session_id).await.unwrap();
        assert!(matches!(
            store.load(&ctx.session_id).await,
            Err(SessionStoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn clones_share_storage() {
        let store = InMemorySessionStore::new();
        let other = store.clone();
        let ctx = ProjectContext::new(SessionId::new(), "x");

        store.save(&ctx).await.unwrap();
        assert!(other.exists(&ctx.session_id).await.unwrap());

        other.clear().await;
        assert_eq!(store.session_count().await, 0);
    }
}
