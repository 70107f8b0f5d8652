//! Cache module for persisting fetched resources
//!
//! Each resource is stored as a serialized payload plus the time it was
//! fetched, so freshness can be judged across process restarts. Storage
//! failures never propagate past this layer as fatal errors: reads degrade to a
//! cache miss, and writes report an error that callers log and ignore.

mod manager;
mod store;

pub use manager::{CacheStore, CachedResource};
pub use store::{FileStore, KeyValueStore, MemoryStore, PersistenceError};
