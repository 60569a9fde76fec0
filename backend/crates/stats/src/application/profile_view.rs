//! Profile View Use Case
//!
//! Single explicit lookup: one entity, fetched directly without queueing,
//! with the short-window fallback applied where configured.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use kernel::id::EntityId;
use platform::http::FetchStrategy;
use platform::kv::KvStore;

use crate::application::compute_delta::DeltaComputer;
use crate::application::short_window::{ShortWindowFallback, snapshot_date};
use crate::domain::entities::{CachedDelta, DeltaResult, StatSnapshot};
use crate::domain::repository::StatsApi;
use crate::domain::value_objects::{StatField, WindowDays};
use crate::error::StatsResult;

/// What a profile lookup shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub entity_id: EntityId,
    pub window: WindowDays,
    pub delta: DeltaResult,
    /// Set when the historical snapshot came from the fallback date
    pub snapshot_date: Option<NaiveDate>,
}

/// Profile View Use Case
pub struct ProfileViewUseCase<A, K> {
    computer: Arc<DeltaComputer<A, K>>,
    fallback: ShortWindowFallback,
}

impl<A, K> ProfileViewUseCase<A, K>
where
    A: StatsApi + Sync,
    K: KvStore + Sync,
{
    pub fn new(computer: Arc<DeltaComputer<A, K>>, fallback: ShortWindowFallback) -> Self {
        Self { computer, fallback }
    }

    pub async fn execute(
        &self,
        entity_id: EntityId,
        window: WindowDays,
    ) -> StatsResult<ProfileView> {
        if !self.fallback.applies(window) {
            let delta = self
                .computer
                .compute(entity_id, window, FetchStrategy::Direct)
                .await?;
            return Ok(ProfileView {
                entity_id,
                window,
                delta,
                snapshot_date: None,
            });
        }

        if let Some(cached) = self.computer.cache().get_dated(entity_id, window).await {
            return Ok(ProfileView {
                entity_id,
                window,
                delta: cached.delta,
                snapshot_date: cached.snapshot_date,
            });
        }

        let since = window.since(Utc::now().timestamp());
        let (live, past) = tokio::join!(self.live(entity_id), self.past(entity_id, since));
        let live = live?;
        let mut past = past.unwrap_or(live);
        let mut date = None;

        if self.fallback.is_stale(&live, &past) {
            let alternate = self.fallback.alternate_timestamp(since);
            tracing::debug!(
                entity_id = %entity_id,
                window_days = window.days(),
                "Historical snapshot matches live, retrying one day earlier"
            );
            if let Ok(earlier) = self.past(entity_id, alternate).await {
                past = earlier;
                date = snapshot_date(alternate);
            }
        }

        let delta = DeltaResult::between(&live, &past);
        self.computer
            .cache()
            .put_dated(entity_id, window, &CachedDelta::new(delta, date))
            .await;

        tracing::info!(
            entity_id = %entity_id,
            window_days = window.days(),
            play = delta.play,
            xan = delta.xan,
            fallback_date = ?date,
            "Computed profile delta"
        );

        Ok(ProfileView {
            entity_id,
            window,
            delta,
            snapshot_date: date,
        })
    }

    async fn live(&self, entity_id: EntityId) -> StatsResult<StatSnapshot> {
        let c = &self.computer;
        let (play, xan, streak) = tokio::try_join!(
            c.fetch_stat(entity_id, StatField::TimePlayed, None, FetchStrategy::Direct),
            c.fetch_stat(entity_id, StatField::XanTaken, None, FetchStrategy::Direct),
            c.fetch_stat(entity_id, StatField::ActiveStreak, None, FetchStrategy::Direct),
        )?;
        Ok(StatSnapshot::new(play, xan, streak))
    }

    async fn past(&self, entity_id: EntityId, at: i64) -> StatsResult<StatSnapshot> {
        let c = &self.computer;
        let (play, xan) = tokio::try_join!(
            c.fetch_stat(entity_id, StatField::TimePlayed, Some(at), FetchStrategy::Direct),
            c.fetch_stat(entity_id, StatField::XanTaken, Some(at), FetchStrategy::Direct),
        )?;
        Ok(StatSnapshot::new(play, xan, 0))
    }
}
