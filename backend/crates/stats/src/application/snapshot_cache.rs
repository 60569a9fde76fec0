//! Snapshot Cache
//!
//! Time-boxed read-through/write-through cache of computed deltas, stored in
//! an injected [`KvStore`] under `snap:<entityId>:<windowDays>`.
//!
//! The cache is best-effort: store failures are logged and behave as misses,
//! never as errors of the delta computation itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use kernel::id::EntityId;
use platform::kv::{KvStore, StoredValue};

use crate::domain::entities::{CacheEntry, CachedDelta, DeltaResult};
use crate::domain::value_objects::{CacheKey, WindowDays};
use crate::error::StatsResult;

pub struct SnapshotCache<K> {
    store: Arc<K>,
    ttl: Duration,
}

impl<K> SnapshotCache<K>
where
    K: KvStore + Sync,
{
    pub fn new(store: Arc<K>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn ttl_ms(&self) -> i64 {
        self.ttl.as_millis() as i64
    }

    /// Fresh cached delta, if any; stale or corrupt entries are evicted
    pub async fn get(&self, entity_id: EntityId, window: WindowDays) -> Option<DeltaResult> {
        self.get_dated(entity_id, window).await.map(|cached| cached.delta)
    }

    /// Like [`get`](Self::get), keeping the substituted snapshot date
    pub async fn get_dated(&self, entity_id: EntityId, window: WindowDays) -> Option<CachedDelta> {
        let key = CacheKey::new(entity_id, window);
        let key_str = key.to_string();

        let stored = match self.store.get(&key_str).await {
            Ok(Some(stored)) => stored,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(cache_key = %key_str, error = %e, "Cache read failed");
                return None;
            }
        };

        let cached = match serde_json::from_value::<CachedDelta>(stored.data) {
            Ok(cached) => cached,
            Err(e) => {
                tracing::warn!(cache_key = %key_str, error = %e, "Corrupt cache entry, evicting");
                self.evict(&key_str).await;
                return None;
            }
        };
        let entry = CacheEntry {
            key,
            value: cached.delta,
            created_at_ms: stored.created_at,
        };

        if entry.is_fresh(Utc::now().timestamp_millis(), self.ttl_ms()) {
            Some(cached)
        } else {
            tracing::debug!(cache_key = %key_str, "Cache entry expired");
            self.evict(&key_str).await;
            None
        }
    }

    /// Store (or replace) a delta stamped with the current time
    pub async fn put(&self, entity_id: EntityId, window: WindowDays, delta: &DeltaResult) {
        self.put_dated(entity_id, window, &CachedDelta::new(*delta, None)).await;
    }

    pub async fn put_dated(&self, entity_id: EntityId, window: WindowDays, cached: &CachedDelta) {
        let key = CacheKey::new(entity_id, window).to_string();
        let data = match serde_json::to_value(cached) {
            Ok(data) => data,
            Err(e) => {
                tracing::warn!(cache_key = %key, error = %e, "Cache entry not serializable");
                return;
            }
        };

        let stored = StoredValue::new(Utc::now().timestamp_millis(), data);
        if let Err(e) = self.store.put(&key, stored).await {
            tracing::warn!(cache_key = %key, error = %e, "Cache write failed");
        }
    }

    /// Evict every entry older than the TTL
    pub async fn purge_expired(&self) -> StatsResult<u64> {
        let cutoff = Utc::now().timestamp_millis() - self.ttl_ms();
        let evicted = self.store.evict_older_than(cutoff).await?;
        tracing::info!(evicted, "Purged expired snapshots");
        Ok(evicted)
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            tracing::warn!(cache_key = %key, error = %e, "Cache eviction failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::kv::MemoryKvStore;

    fn cache() -> (Arc<MemoryKvStore>, SnapshotCache<MemoryKvStore>) {
        let store = Arc::new(MemoryKvStore::new());
        let cache = SnapshotCache::new(store.clone(), Duration::from_secs(60));
        (store, cache)
    }

    #[test]
    fn test_put_then_get() {
        tokio_test::block_on(async {
            let (_, cache) = cache();
            let id = EntityId::new(42).unwrap();
            let delta = DeltaResult {
                play: 10,
                xan: 1,
                streak: 2,
            };

            assert!(cache.get(id, WindowDays::DEFAULT).await.is_none());
            cache.put(id, WindowDays::DEFAULT, &delta).await;
            assert_eq!(cache.get(id, WindowDays::DEFAULT).await, Some(delta));
        });
    }

    #[test]
    fn test_overwrite_replaces_value() {
        tokio_test::block_on(async {
            let (store, cache) = cache();
            let id = EntityId::new(7).unwrap();
            let window = WindowDays::new(7).unwrap();

            cache.put(id, window, &DeltaResult::default()).await;
            let newer = DeltaResult {
                play: 99,
                xan: 0,
                streak: 0,
            };
            cache.put(id, window, &newer).await;

            assert_eq!(cache.get(id, window).await, Some(newer));
            assert_eq!(store.len().await, 1);
        });
    }

    #[test]
    fn test_snapshot_date_survives_round_trip() {
        tokio_test::block_on(async {
            let (store, cache) = cache();
            let id = EntityId::new(42).unwrap();
            let window = WindowDays::new(1).unwrap();
            let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1);
            let dated = CachedDelta::new(DeltaResult::default(), date);

            cache.put_dated(id, window, &dated).await;

            assert_eq!(cache.get_dated(id, window).await, Some(dated));
            assert_eq!(cache.get(id, window).await, Some(DeltaResult::default()));

            let stored = store.get("snap:42:1").await.unwrap().unwrap();
            assert_eq!(stored.data["snapshotDate"], "2024-01-01");
        });
    }
}
