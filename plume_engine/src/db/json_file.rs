use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::*;

use crate::{db_types::UserTable, plume_api::errors::UserStoreError, UserSink};

/// Stores the user table as one JSON object in a file. The file is rewritten in full on every `persist`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl UserSink for JsonFileSink {
    async fn load(&self) -> Result<UserTable, UserStoreError> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("📁️ No user file at {}. Starting with an empty user table.", self.path.display());
                return Ok(UserTable::new());
            },
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(UserStoreError::NotAFile(self.path.clone()));
        }
        let contents = tokio::fs::read_to_string(&self.path).await?;
        if contents.trim().is_empty() {
            return Ok(UserTable::new());
        }
        let users = serde_json::from_str::<UserTable>(&contents).map_err(|e| {
            error!("📁️ Failed to load users file {}: {e}", self.path.display());
            UserStoreError::Deserialization(e.to_string())
        })?;
        debug!("📁️ Loaded {} users from {}", users.len(), self.path.display());
        Ok(users)
    }

    async fn persist(&self, users: &UserTable) -> Result<(), UserStoreError> {
        let json = serde_json::to_string(users).map_err(|e| UserStoreError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        // The user file is only ever replaced whole
        let staging = self.staging_path();
        tokio::fs::write(&staging, json).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        trace!("📁️ Wrote {} users to {}", users.len(), self.path.display());
        Ok(())
    }
}
