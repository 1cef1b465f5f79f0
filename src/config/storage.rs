//! Session storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one subdirectory per session
    #[serde(default = "default_sessions_dir")]
    pub sessions_dir: PathBuf,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sessions_dir.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("storage.sessions_dir"));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sessions_dir: default_sessions_dir(),
        }
    }
}

fn default_sessions_dir() -> PathBuf {
    PathBuf::from("./sessions")
}
