//! File-based Session Store Adapter
//!
//! Stores each session snapshot as `<base>/<session_id>/session.yaml`.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::advisory::ProjectContext;
use crate::domain::foundation::SessionId;
use crate::ports::{SessionStore, SessionStoreError};

/// File-based storage for session snapshots
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    base_path: PathBuf,
}

impl FileSessionStore {
    /// Create a new file store rooted at `base_path`
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn session_dir(&self, session_id: &SessionId) -> PathBuf {
        self.base_path.join(session_id.to_string())
    }

    fn snapshot_path(&self, session_id: &SessionId) -> PathBuf {
        self.session_dir(session_id).join("session.yaml")
    }

    async fn ensure_dir(&self, path: &Path) -> Result<(), SessionStoreError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn save(&self, snapshot: &ProjectContext) -> Result<(), SessionStoreError> {
        self.ensure_dir(&self.session_dir(&snapshot.session_id)).await?;

        let yaml = serde_yaml::to_string(snapshot)
            .map_err(|e| SessionStoreError::SerializationFailed(e.to_string()))?;

        // Write then rename so a crash never leaves a truncated snapshot
        let path = self.snapshot_path(&snapshot.session_id);
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;

        Ok(())
    }

    async fn load(&self, session_id: &SessionId) -> Result<ProjectContext, SessionStoreError> {
        let path = self.snapshot_path(session_id);
        if !path.exists() {
            return Err(SessionStoreError::NotFound(*session_id));
        }

        let yaml = fs::read_to_string(&path)
            .await
            .map_err(|e| SessionStoreError::IoError(e.to_string()))?;

        serde_yaml::from_str(&yaml)
            .map_err(|e| SessionStoreError::DeserializationFailed(e.to_string()))
    }

    async fn exists(&self, session_id: &SessionId) -> Result<bool, SessionStoreError> {
        Ok(self.snapshot_path(session_id).exists())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), SessionStoreError> {
        let dir = self.session_dir(session_id);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .await
                .map_err(|e| SessionStoreError::IoError(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::advisory::{
        Constraint, ConstraintKind, DecisionProfile, Priority, Requirement,
    };
    use crate::domain::workflow::NodeId;
    use tempfile::TempDir;

    fn snapshot() -> ProjectContext {
        let mut ctx = ProjectContext::new(SessionId::new(), "Inventory tool for 3 warehouses");
        ctx.add_user_message("We need an inventory tool");
        ctx.add_requirement(Requirement::functional("Track stock levels", Priority::High));
        ctx.add_constraint(Constraint::new(ConstraintKind::Budget, "Tight budget", Priority::High));
        ctx.decision_profile = Some(DecisionProfile::CostFirst);
        ctx.current_node = Some(NodeId::Priority);
        ctx.waiting_for_user = true;
        ctx
    }

    #[tokio::test]
    async fn save_and_load_round_trip_preserves_state() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        let ctx = snapshot();

        store.save(&ctx).await.unwrap();
        let loaded = store.load(&ctx.session_id).await.unwrap();

        assert_eq!(loaded.session_id, ctx.session_id);
        assert_eq!(loaded.requirements(), ctx.requirements());
        assert_eq!(loaded.constraints(), ctx.constraints());
        assert_eq!(loaded.info_version(), ctx.info_version());
        assert_eq!(loaded.decision_profile, Some(DecisionProfile::CostFirst));
        assert_eq!(loaded.current_node, Some(NodeId::Priority));
        assert!(loaded.waiting_for_user);
        assert_eq!(loaded.conversation_history.len(), 1);
    }

    #[tokio::test]
    async fn load_missing_session_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());

        let result = store.load(&SessionId::new()).await;
        assert!(matches!(result, Err(SessionStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_a_deserialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        let id = SessionId::new();

        std::fs::create_dir_all(store.session_dir(&id)).unwrap();
        std::fs::write(store.snapshot_path(&id), "session_id: [not, a, uuid]").unwrap();

        let result = store.load(&id).await;
        assert!(matches!(result, Err(SessionStoreError::DeserializationFailed(_))));
    }

    #[tokio::test]
    async fn save_overwrites_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        let mut ctx = snapshot();

        store.save(&ctx).await.unwrap();
        ctx.waiting_for_user = false;
        ctx.add_assistant_message("Thanks");
        store.save(&ctx).await.unwrap();

        let loaded = store.load(&ctx.session_id).await.unwrap();
        assert!(!loaded.waiting_for_user);
        assert_eq!(loaded.conversation_history.len(), 2);
        assert!(!store.snapshot_path(&ctx.session_id).with_extension("yaml.tmp").exists());
    }

    #[tokio::test]
    async fn exists_and_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path());
        let ctx = snapshot();

        assert!(!store.exists(&ctx.session_id).await.unwrap());
        store.save(&ctx).await.unwrap();
        assert!(store.exists(&ctx.session_id).await.unwrap());

        store.delete(&ctx.session_id).await.unwrap();
        assert!(!store.exists(&ctx.session_id).await.unwrap());
        // deleting again is fine
        store.delete(&ctx.session_id).await.unwrap();
    }
}
