//! Cache store for fetched resources
//!
//! Persists a serialized payload together with its fetch timestamp, under two
//! related keys per resource, on top of any [`KeyValueStore`].

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::store::{KeyValueStore, MemoryStore, PersistenceError};

/// A cached resource read back from storage
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResource<T> {
    /// Resource key the payload was stored under
    pub key: String,
    /// The decoded payload
    pub payload: T,
    /// When the payload was fetched from the network
    pub fetched_at: DateTime<Utc>,
}

/// Reads and writes cached resources
///
/// A payload is only visible through [`CacheStore::get`] when both halves of
/// the entry (payload and timestamp) are present and parse. Anything else is a
/// cache miss.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

impl CacheStore {
    /// Creates a cache store on top of a storage backend
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Creates a cache store that only lives for the current session
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Storage key holding a resource's fetch timestamp
    fn timestamp_key(key: &str) -> String {
        format!("{}.fetched_at", key)
    }

    /// Reads a cached resource
    ///
    /// Storage failures and unparseable entries are logged and reported as a
    /// miss, so callers fall back to the network.
    ///
    /// # Returns
    /// * `Some(CachedResource<T>)` if both payload and timestamp are stored and valid
    /// * `None` otherwise
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<CachedResource<T>> {
        match self.try_get(key).await {
            Ok(entry) => entry,
            Err(error) => {
                warn!(resource = key, %error, "Cache read failed, treating as a miss");
                None
            }
        }
    }

    async fn try_get<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<CachedResource<T>>, PersistenceError> {
        let Some(fetched_at) = self.read_timestamp(key).await? else {
            return Ok(None);
        };
        let Some(raw) = self.backend.get(key).await? else {
            debug!(resource = key, "Cache timestamp present without payload");
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(payload) => Ok(Some(CachedResource {
                key: key.to_string(),
                payload,
                fetched_at,
            })),
            Err(error) => {
                warn!(resource = key, %error, "Cached payload no longer matches its shape");
                Ok(None)
            }
        }
    }

    async fn read_timestamp(&self, key: &str) -> Result<Option<DateTime<Utc>>, PersistenceError> {
        let Some(raw) = self.backend.get(&Self::timestamp_key(key)).await? else {
            return Ok(None);
        };
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|ts| Some(ts.with_timezone(&Utc)))
            .map_err(|_| PersistenceError::Timestamp(raw))
    }

    /// Writes a payload and its fetch timestamp
    ///
    /// Overwrites any previous entry. The stored timestamp never moves
    /// backwards: if `fetched_at` is older than what is already stored (a clock
    /// that stepped back), the stored timestamp is kept.
    ///
    /// # Returns
    /// * `Ok(DateTime<Utc>)` - the timestamp that is now stored
    /// * `Err(PersistenceError)` if serialization or storage fails
    pub async fn put<T: Serialize + Sync>(
        &self,
        key: &str,
        payload: &T,
        fetched_at: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, PersistenceError> {
        let json = serde_json::to_string(payload)?;

        let previous = self.read_timestamp(key).await.unwrap_or(None);
        let stored_at = match previous {
            Some(previous) if previous > fetched_at => previous,
            _ => fetched_at,
        };

        // Payload before timestamp; an entry without a timestamp reads as a miss
        self.backend.set(key, json).await?;
        self.backend
            .set(&Self::timestamp_key(key), stored_at.to_rfc3339())
            .await?;

        debug!(resource = key, fetched_at = %stored_at, "Cached resource");
        Ok(stored_at)
    }

    /// Removes a cached resource
    pub async fn clear(&self, key: &str) -> Result<(), PersistenceError> {
        self.backend.remove(&Self::timestamp_key(key)).await?;
        self.backend.remove(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::FileStore;
    use chrono::{Duration, TimeZone};
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    fn sample(value: i32) -> TestData {
        TestData {
            name: "sample".to_string(),
            value,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_none_for_missing_key() {
        let cache = CacheStore::in_memory();

        let result: Option<CachedResource<TestData>> = cache.get("nonexistent").await;

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_put_then_get_returns_payload_and_timestamp() {
        let cache = CacheStore::in_memory();

        let stored_at = cache.put("market", &sample(42), t0()).await.expect("put");
        let entry: CachedResource<TestData> = cache.get("market").await.expect("entry");

        assert_eq!(stored_at, t0());
        assert_eq!(entry.key, "market");
        assert_eq!(entry.payload, sample(42));
        assert_eq!(entry.fetched_at, t0());
    }

    #[tokio::test]
    async fn test_put_overwrites_previous_payload() {
        let cache = CacheStore::in_memory();

        cache.put("k", &sample(1), t0()).await.expect("put");
        cache
            .put("k", &sample(2), t0() + Duration::seconds(10))
            .await
            .expect("put");

        let entry: CachedResource<TestData> = cache.get("k").await.expect("entry");
        assert_eq!(entry.payload, sample(2));
        assert_eq!(entry.fetched_at, t0() + Duration::seconds(10));
    }

    #[tokio::test]
    async fn test_fetched_at_never_moves_backwards() {
        let cache = CacheStore::in_memory();

        cache.put("k", &sample(1), t0()).await.expect("put");
        let stored_at = cache
            .put("k", &sample(2), t0() - Duration::seconds(30))
            .await
            .expect("put");

        let entry: CachedResource<TestData> = cache.get("k").await.expect("entry");
        assert_eq!(stored_at, t0());
        assert_eq!(entry.fetched_at, t0());
        assert_eq!(entry.payload, sample(2), "payload still overwritten");
    }

    #[tokio::test]
    async fn test_clear_removes_entry() {
        let cache = CacheStore::in_memory();
        cache.put("k", &sample(1), t0()).await.expect("put");

        cache.clear("k").await.expect("clear");

        assert!(cache.get::<TestData>("k").await.is_none());
    }

    #[tokio::test]
    async fn test_payload_with_wrong_shape_is_a_miss() {
        let backend = Arc::new(MemoryStore::new());
        let cache = CacheStore::new(backend.clone());
        backend
            .set("k", "{\"unexpected\":true}".to_string())
            .await
            .expect("set");
        backend
            .set("k.fetched_at", t0().to_rfc3339())
            .await
            .expect("set");

        assert!(cache.get::<TestData>("k").await.is_none());
    }

    #[tokio::test]
    async fn test_garbled_timestamp_is_a_miss() {
        let backend = Arc::new(MemoryStore::new());
        let cache = CacheStore::new(backend.clone());
        cache.put("k", &sample(1), t0()).await.expect("put");
        backend
            .set("k.fetched_at", "yesterday-ish".to_string())
            .await
            .expect("set");

        assert!(cache.get::<TestData>("k").await.is_none());
    }

    #[tokio::test]
    async fn test_payload_without_timestamp_is_a_miss() {
        let backend = Arc::new(MemoryStore::new());
        let cache = CacheStore::new(backend.clone());
        backend
            .set("k", serde_json::to_string(&sample(1)).expect("json"))
            .await
            .expect("set");

        assert!(cache.get::<TestData>("k").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_survives_a_new_store_instance_on_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let first = CacheStore::new(Arc::new(FileStore::with_dir(temp_dir.path().to_path_buf())));
        first.put("quotes", &sample(7), t0()).await.expect("put");

        let second = CacheStore::new(Arc::new(FileStore::with_dir(temp_dir.path().to_path_buf())));
        let entry: CachedResource<TestData> = second.get("quotes").await.expect("entry");

        assert_eq!(entry.payload, sample(7));
        assert_eq!(entry.fetched_at, t0());
    }
}
