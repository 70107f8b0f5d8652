//! String-keyed durable storage backends
//!
//! The cache store keeps each resource as two string values (payload and fetch
//! timestamp). This module provides the storage those values live in: files in
//! an XDG cache directory, or a plain in-memory map when nothing should outlive
//! the session.

use directories::ProjectDirs;
use futures::future::{self, BoxFuture, FutureExt};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Errors raised by a storage backend
///
/// None of these are fatal: the sync engine logs them and carries on with
/// session-only caching.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Reading or writing the backing file failed
    #[error("Cache I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The payload could not be serialized
    #[error("Failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A stored fetch timestamp could not be parsed
    #[error("Invalid fetch timestamp: {0:?}")]
    Timestamp(String),
}

/// Asynchronous string key/value storage
pub trait KeyValueStore: Send + Sync {
    /// Reads a value, returning `None` when the key has never been written
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, PersistenceError>>;

    /// Writes (or overwrites) a value
    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), PersistenceError>>;

    /// Removes a value; removing a missing key succeeds
    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), PersistenceError>>;
}

/// Stores each key as a file in a cache directory
///
/// Uses `~/.cache/pulseboard/` on Linux, or the equivalent platform cache
/// directory elsewhere. Writes go to a temporary file that is renamed into
/// place.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// Directory where values are stored
    dir: PathBuf,
}

impl FileStore {
    /// Creates a FileStore in the platform cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "pulseboard")?;
        Some(Self::with_dir(project_dirs.cache_dir().to_path_buf()))
    }

    /// Creates a FileStore rooted at a custom directory
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory the store writes into
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Returns the file path for a key, replacing characters that are unsafe in file names
    fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(file_name)
    }
}

fn io_error(path: &std::path::Path, source: io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl KeyValueStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, PersistenceError>> {
        async move {
            let path = self.path_for(key);
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(io_error(&path, e)),
            }
        }
        .boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), PersistenceError>> {
        async move {
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| io_error(&self.dir, e))?;

            let path = self.path_for(key);
            let mut tmp_name = path.clone().into_os_string();
            tmp_name.push(".tmp");
            let tmp_path = PathBuf::from(tmp_name);
            tokio::fs::write(&tmp_path, value)
                .await
                .map_err(|e| io_error(&tmp_path, e))?;
            tokio::fs::rename(&tmp_path, &path)
                .await
                .map_err(|e| io_error(&path, e))
        }
        .boxed()
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), PersistenceError>> {
        async move {
            let path = self.path_for(key);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(e) => Err(io_error(&path, e)),
            }
        }
        .boxed()
    }
}

/// Session-only storage backed by a map
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<String>, PersistenceError>> {
        let value = self
            .values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();
        future::ready(Ok(value)).boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> BoxFuture<'a, Result<(), PersistenceError>> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        future::ready(Ok(())).boxed()
    }

    fn remove<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), PersistenceError>> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        future::ready(Ok(())).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::with_dir(temp_dir.path().to_path_buf());
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_file_store_get_returns_none_for_missing_key() {
        let (store, _temp_dir) = create_test_store();

        let value = store.get("missing").await.expect("Read should succeed");

        assert!(value.is_none());
    }

    #[tokio::test]
    async fn test_file_store_set_then_get() {
        let (store, temp_dir) = create_test_store();

        store
            .set("market", "{\"a\":1}".to_string())
            .await
            .expect("Write should succeed");

        assert!(temp_dir.path().join("market").exists());
        assert!(!temp_dir.path().join("market.tmp").exists());
        let value = store.get("market").await.expect("Read should succeed");
        assert_eq!(value.as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn test_file_store_creates_nested_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("nested").join("cache");
        let store = FileStore::with_dir(nested.clone());

        store
            .set("quotes", "[]".to_string())
            .await
            .expect("Write should succeed");

        assert!(nested.join("quotes").exists());
    }

    #[tokio::test]
    async fn test_file_store_remove_is_idempotent() {
        let (store, _temp_dir) = create_test_store();
        store.set("k", "v".to_string()).await.expect("Write should succeed");

        store.remove("k").await.expect("First remove should succeed");
        store.remove("k").await.expect("Second remove should succeed");

        assert!(store.get("k").await.expect("Read should succeed").is_none());
    }

    #[tokio::test]
    async fn test_file_store_sanitizes_keys() {
        let (store, temp_dir) = create_test_store();

        store
            .set("../escape/attempt", "v".to_string())
            .await
            .expect("Write should succeed");

        assert!(temp_dir.path().join(".._escape_attempt").exists());
        let value = store
            .get("../escape/attempt")
            .await
            .expect("Read should succeed");
        assert_eq!(value.as_deref(), Some("v"));
    }

    #[test]
    fn test_new_creates_xdg_compliant_path() {
        if let Some(store) = FileStore::new() {
            let path_str = store.dir().to_string_lossy();
            assert!(
                path_str.contains("pulseboard"),
                "Cache path should contain project name"
            );
        }
        // Passes if new() returns None (e.g., no home directory in CI)
    }

    #[tokio::test]
    async fn test_memory_store_overwrite_and_remove() {
        let store = MemoryStore::new();

        store.set("k", "first".to_string()).await.expect("set");
        store.set("k", "second".to_string()).await.expect("set");
        assert_eq!(store.get("k").await.expect("get").as_deref(), Some("second"));

        store.remove("k").await.expect("remove");
        assert!(store.get("k").await.expect("get").is_none());
    }
}
