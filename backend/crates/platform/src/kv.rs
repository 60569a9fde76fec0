//! Key-Value Persistence
//!
//! A flat, namespaced key-value abstraction for small JSON documents stamped
//! with their creation time. Backends are swappable: in-memory for tests and
//! short-lived processes, a single JSON file for persistence across runs.
//! Database-backed implementations live with the crates that own the schema.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

pub type KvResult<T> = Result<T, KvError>;

/// Key-value store errors
#[derive(Debug, Error)]
pub enum KvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// A stored document and the time (Unix ms) it was written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredValue {
    pub created_at: i64,
    pub data: Value,
}

impl StoredValue {
    pub fn new(created_at: i64, data: Value) -> Self {
        Self { created_at, data }
    }

    /// Age in milliseconds relative to `now_ms`; negative under clock skew
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms - self.created_at
    }
}

/// Key-value store trait
#[trait_variant::make(KvStore: Send)]
pub trait LocalKvStore {
    /// Read a value
    async fn get(&self, key: &str) -> KvResult<Option<StoredValue>>;

    /// Insert or replace a value wholesale
    async fn put(&self, key: &str, value: StoredValue) -> KvResult<()>;

    /// Delete a value (no-op if absent)
    async fn remove(&self, key: &str) -> KvResult<()>;

    /// Delete every value created before `cutoff_ms`, returning how many
    async fn evict_older_than(&self, cutoff_ms: i64) -> KvResult<u64>;
}

// ============================================================================
// In-memory store
// ============================================================================

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> KvResult<Option<StoredValue>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: StoredValue) -> KvResult<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> KvResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn evict_older_than(&self, cutoff_ms: i64) -> KvResult<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, value| value.created_at >= cutoff_ms);
        Ok((before - entries.len()) as u64)
    }
}

// ============================================================================
// File-backed store
// ============================================================================

/// Store persisted as one JSON object on disk
///
/// The whole map is held in memory and rewritten on every mutation through a
/// temporary file and a rename, so a crash never leaves a half-written file.
/// An unreadable file is treated as an empty store.
#[derive(Debug)]
pub struct FileKvStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, StoredValue>>,
}

impl FileKvStore {
    /// Open (or lazily create) the store at `path`
    pub async fn open(path: impl Into<PathBuf>) -> KvResult<Self> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Store file unreadable, starting empty"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened file store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, entries: &BTreeMap<String, StoredValue>) -> KvResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_vec(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl KvStore for FileKvStore {
    async fn get(&self, key: &str) -> KvResult<Option<StoredValue>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: StoredValue) -> KvResult<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value);
        self.persist(&entries).await
    }

    async fn remove(&self, key: &str) -> KvResult<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.persist(&entries).await?;
        }
        Ok(())
    }

    async fn evict_older_than(&self, cutoff_ms: i64) -> KvResult<u64> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, value| value.created_at >= cutoff_ms);
        let evicted = (before - entries.len()) as u64;
        if evicted > 0 {
            self.persist(&entries).await?;
        }
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::{FileKvStore, KvStore, MemoryKvStore, StoredValue};
    use serde_json::json;
    use std::path::PathBuf;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("kv-test-{}.json", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_memory_put_get_remove() {
        let store = MemoryKvStore::new();
        let value = StoredValue::new(1_000, json!({"play": 10}));

        store.put("snap:1:30", value.clone()).await.unwrap();
        assert_eq!(store.get("snap:1:30").await.unwrap(), Some(value));

        store.remove("snap:1:30").await.unwrap();
        assert_eq!(store.get("snap:1:30").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_evict_older_than() {
        let store = MemoryKvStore::new();
        store.put("old", StoredValue::new(100, json!(1))).await.unwrap();
        store.put("new", StoredValue::new(500, json!(2))).await.unwrap();

        assert_eq!(store.evict_older_than(200).await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let path = temp_path();
        {
            let store = FileKvStore::open(&path).await.unwrap();
            store
                .put("snap:7:30", StoredValue::new(42, json!({"xan": 2})))
                .await
                .unwrap();
        }

        let reopened = FileKvStore::open(&path).await.unwrap();
        let value = reopened.get("snap:7:30").await.unwrap().unwrap();
        assert_eq!(value.created_at, 42);
        assert_eq!(value.data, json!({"xan": 2}));

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.contains(r#""createdAt":42"#));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_starts_empty() {
        let path = temp_path();
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = FileKvStore::open(&path).await.unwrap();
        assert_eq!(store.get("anything").await.unwrap(), None);

        store.put("k", StoredValue::new(1, json!(null))).await.unwrap();
        let reopened = FileKvStore::open(&path).await.unwrap();
        assert!(reopened.get("k").await.unwrap().is_some());

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_file_store_evicts_and_persists() {
        let path = temp_path();
        let store = FileKvStore::open(&path).await.unwrap();
        store.put("a", StoredValue::new(10, json!(1))).await.unwrap();
        store.put("b", StoredValue::new(20, json!(2))).await.unwrap();

        assert_eq!(store.evict_older_than(15).await.unwrap(), 1);

        let reopened = FileKvStore::open(&path).await.unwrap();
        assert!(reopened.get("a").await.unwrap().is_none());
        assert!(reopened.get("b").await.unwrap().is_some());

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[test]
    fn test_age_ms() {
        let value = StoredValue::new(1_000, json!(null));
        assert_eq!(value.age_ms(1_500), 500);
        assert_eq!(value.age_ms(900), -100);
    }
}
