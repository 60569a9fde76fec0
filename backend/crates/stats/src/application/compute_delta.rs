//! Compute Delta Use Case
//!
//! Diffs a current snapshot against one taken `window` days ago.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::EntityId;
use platform::http::{FetchError, FetchStrategy};
use platform::kv::KvStore;
use serde_json::Value;

use crate::application::snapshot_cache::SnapshotCache;
use crate::domain::entities::{DeltaResult, StatSnapshot};
use crate::domain::repository::StatsApi;
use crate::domain::value_objects::{StatField, WindowDays};
use crate::error::StatsResult;

/// Compute Delta Use Case
pub struct DeltaComputer<A, K> {
    api: Arc<A>,
    cache: Arc<SnapshotCache<K>>,
}

impl<A, K> DeltaComputer<A, K>
where
    A: StatsApi + Sync,
    K: KvStore + Sync,
{
    pub fn new(api: Arc<A>, cache: Arc<SnapshotCache<K>>) -> Self {
        Self { api, cache }
    }

    pub fn cache(&self) -> &SnapshotCache<K> {
        &self.cache
    }

    /// Delta for `entity_id` over `window`, served from cache when fresh
    ///
    /// The current and historical snapshots are fetched concurrently. A
    /// failed historical fetch counts as "no change observed"; a failed
    /// current fetch fails the whole computation.
    pub async fn compute(
        &self,
        entity_id: EntityId,
        window: WindowDays,
        strategy: FetchStrategy,
    ) -> StatsResult<DeltaResult> {
        if let Some(cached) = self.cache.get(entity_id, window).await {
            tracing::debug!(entity_id = %entity_id, window_days = window.days(), "Cache hit");
            return Ok(cached);
        }

        let since = window.since(Utc::now().timestamp());
        let (now, past) = tokio::join!(
            self.fetch_snapshot(entity_id, &StatField::ALL, None, strategy),
            self.fetch_snapshot(entity_id, &StatField::DELTA, Some(since), strategy),
        );

        let now = now?;
        let past = past.unwrap_or_else(|e| {
            tracing::warn!(
                entity_id = %entity_id,
                window_days = window.days(),
                error = %e,
                "No history for window, assuming no change"
            );
            now
        });

        let delta = DeltaResult::between(&now, &past);
        self.cache.put(entity_id, window, &delta).await;

        tracing::info!(
            entity_id = %entity_id,
            window_days = window.days(),
            play = delta.play,
            xan = delta.xan,
            streak = delta.streak,
            %strategy,
            "Computed delta"
        );

        Ok(delta)
    }

    /// Fetch `fields` as of `at` (or now) and extract them into a snapshot
    pub async fn fetch_snapshot(
        &self,
        entity_id: EntityId,
        fields: &[StatField],
        at: Option<i64>,
        strategy: FetchStrategy,
    ) -> StatsResult<StatSnapshot> {
        let payload = self.fetch_payload(entity_id, fields, at, strategy).await?;
        Ok(StatSnapshot::from_payload(&payload))
    }

    /// Fetch a single field as of `at` (or now)
    pub async fn fetch_stat(
        &self,
        entity_id: EntityId,
        field: StatField,
        at: Option<i64>,
        strategy: FetchStrategy,
    ) -> StatsResult<u64> {
        let payload = self.fetch_payload(entity_id, &[field], at, strategy).await?;
        Ok(field.extract(&payload))
    }

    /// An empty payload carries no counters and must not read as zeros
    async fn fetch_payload(
        &self,
        entity_id: EntityId,
        fields: &[StatField],
        at: Option<i64>,
        strategy: FetchStrategy,
    ) -> StatsResult<Value> {
        let payload = self
            .api
            .personal_stats(entity_id, fields, at, strategy)
            .await?;
        if payload.is_null() {
            return Err(FetchError::Malformed("empty statistics payload".to_string()).into());
        }
        Ok(payload)
    }
}
