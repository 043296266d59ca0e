//! # Blob Storage
//!
//! The persistence medium behind the store: a flat key → string map, the same
//! shape as browser local storage. Values are always replaced whole.
//!
//! - [`MemoryBlobStore`]: process-local, used by tests and throwaway runs.
//! - [`FileBlobStore`]: one file per key in a directory. Writes go to a
//!   temporary file that is renamed over the target, so a reader never sees a
//!   half-written value.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Key-value blob persistence.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Reads the value under `key`, `None` if it was never written.
    async fn get(&self, key: &str) -> io::Result<Option<String>>;

    /// Replaces the value under `key`.
    async fn set(&self, key: &str, value: &str) -> io::Result<()>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> io::Result<()>;
}

/// In-process blob store.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts with `key` already holding `value`.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        store
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value.into());
        store
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Directory-backed blob store: `key` lives in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Opens (and creates if needed) the storage directory.
    pub async fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Blob directory ready");
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> io::Result<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set(&self, key: &str, value: &str) -> io::Result<()> {
        let target = self.path_for(key);
        let staging = self.dir.join(format!("{key}.json.tmp"));
        tokio::fs::write(&staging, value).await?;
        tokio::fs::rename(&staging, &target).await?;
        debug!(key, bytes = value.len(), "Blob written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> io::Result<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_replaces_whole_values() {
        let store = MemoryBlobStore::new();
        assert_eq!(store.get("k").await.unwrap(), None);

        store.set("k", "first").await.unwrap();
        store.set("k", "second").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("second"));

        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::open(dir.path().join("data")).await.unwrap();

        assert_eq!(store.get("inventoryAppData").await.unwrap(), None);
        store.set("inventoryAppData", r#"{"products":[]}"#).await.unwrap();

        let reopened = FileBlobStore::open(dir.path().join("data")).await.unwrap();
        assert_eq!(
            reopened.get("inventoryAppData").await.unwrap().as_deref(),
            Some(r#"{"products":[]}"#)
        );
        assert!(!dir.path().join("data/inventoryAppData.json.tmp").exists());

        reopened.remove("inventoryAppData").await.unwrap();
        reopened.remove("inventoryAppData").await.unwrap();
        assert_eq!(reopened.get("inventoryAppData").await.unwrap(), None);
    }
}
