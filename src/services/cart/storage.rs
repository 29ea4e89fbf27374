use anyhow::Context;
use async_trait::async_trait;
use dashmap::DashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::ServiceError;

/// Durable key/value side channel holding serialised carts.
#[async_trait]
pub trait CartStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError>;

    async fn set(&self, key: &str, payload: String) -> Result<(), ServiceError>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), ServiceError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryCartStorage {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CartStorage for MemoryCartStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, payload: String) -> Result<(), ServiceError> {
        self.entries.insert(key.to_string(), payload);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ServiceError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per cart under a directory.
#[derive(Clone, Debug)]
pub struct FileCartStorage {
    dir: PathBuf,
}

impl FileCartStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ServiceError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ServiceError::InvalidInput(format!(
                "Cart key '{}' may only contain letters, digits, '-' and '_'",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl CartStorage for FileCartStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, ServiceError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("reading cart file {}", path.display()))
                .into()),
        }
    }

    async fn set(&self, key: &str, payload: String) -> Result<(), ServiceError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating cart directory {}", self.dir.display()))?;

        // Staged write, then rename over the previous payload.
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, payload)
            .await
            .with_context(|| format!("writing cart file {}", staging.display()))?;
        tokio::fs::rename(&staging, &path)
            .await
            .with_context(|| format!("replacing cart file {}", path.display()))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), ServiceError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("removing cart file {}", path.display()))
                .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn memory_storage_round_trips_and_removes() {
        let storage = MemoryCartStorage::new();
        storage.set("cart-1", "{}".to_string()).await.unwrap();
        assert_eq!(storage.get("cart-1").await.unwrap().as_deref(), Some("{}"));

        storage.remove("cart-1").await.unwrap();
        storage.remove("cart-1").await.unwrap();
        assert!(storage.get("cart-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCartStorage::new(dir.path());
        assert_matches!(
            storage.set("../escape", "{}".to_string()).await,
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[tokio::test]
    async fn file_storage_missing_key_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileCartStorage::new(dir.path().join("carts"));
        assert!(storage.get("guest").await.unwrap().is_none());
        storage.remove("guest").await.unwrap();
    }
}
