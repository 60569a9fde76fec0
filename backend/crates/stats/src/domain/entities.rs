//! Domain Entities
//!
//! Core business entities for the stats domain.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::value_objects::{CacheKey, StatField};

/// Cumulative counters as of one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatSnapshot {
    /// Seconds played
    pub play: u64,
    /// Xanax taken
    pub xan: u64,
    /// Current streak; zero in historical snapshots
    pub streak: u64,
}

impl StatSnapshot {
    pub fn new(play: u64, xan: u64, streak: u64) -> Self {
        Self { play, xan, streak }
    }

    /// Read every field out of a raw payload of either shape
    pub fn from_payload(payload: &Value) -> Self {
        Self {
            play: StatField::TimePlayed.extract(payload),
            xan: StatField::XanTaken.extract(payload),
            streak: StatField::ActiveStreak.extract(payload),
        }
    }

    pub fn get(&self, field: StatField) -> u64 {
        match field {
            StatField::TimePlayed => self.play,
            StatField::XanTaken => self.xan,
            StatField::ActiveStreak => self.streak,
        }
    }
}

/// Activity over a window
///
/// `play` and `xan` are clamped differences and never negative; `streak` is
/// the current value carried over verbatim.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaResult {
    pub play: u64,
    pub xan: u64,
    pub streak: u64,
}

impl DeltaResult {
    /// `max(0, now - past)` per counter, streak from `now`
    pub fn between(now: &StatSnapshot, past: &StatSnapshot) -> Self {
        Self {
            play: now.play.saturating_sub(past.play),
            xan: now.xan.saturating_sub(past.xan),
            streak: now.streak,
        }
    }
}

/// Stored form of a delta, with the historical snapshot date when one was substituted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedDelta {
    #[serde(flatten)]
    pub delta: DeltaResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_date: Option<NaiveDate>,
}

impl CachedDelta {
    pub fn new(delta: DeltaResult, snapshot_date: Option<NaiveDate>) -> Self {
        Self {
            delta,
            snapshot_date,
        }
    }
}

/// A cached delta and when it was computed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub value: DeltaResult,
    pub created_at_ms: i64,
}

impl CacheEntry {
    /// Still fresh at `now_ms` under `ttl_ms`
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.created_at_ms < ttl_ms
    }
}
