//! Domain Value Objects
//!
//! Immutable value types for the stats domain.

use std::fmt;

use kernel::id::EntityId;
use serde_json::Value;

use crate::domain::services::extract;

/// Seconds in one day
pub const SECONDS_PER_DAY: i64 = 86_400;

/// The three statistics consumed from the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatField {
    /// Cumulative seconds played
    TimePlayed,
    /// Cumulative xanax taken
    XanTaken,
    /// Current activity streak in days (not cumulative)
    ActiveStreak,
}

impl StatField {
    /// Every field, for a current snapshot
    pub const ALL: [StatField; 3] = [
        StatField::TimePlayed,
        StatField::XanTaken,
        StatField::ActiveStreak,
    ];

    /// Fields with historical meaning, for a past snapshot
    pub const DELTA: [StatField; 2] = [StatField::TimePlayed, StatField::XanTaken];

    /// Name used in the `stat` query parameter and in record-array payloads
    pub const fn api_name(&self) -> &'static str {
        match self {
            StatField::TimePlayed => "timeplayed",
            StatField::XanTaken => "xantaken",
            StatField::ActiveStreak => "activestreak",
        }
    }

    /// Location of the value in nested-object payloads
    pub const fn object_path(&self) -> &'static [&'static str] {
        match self {
            StatField::TimePlayed => &["other", "activity", "time"],
            StatField::XanTaken => &["drugs", "xanax"],
            StatField::ActiveStreak => &["other", "activity", "streak", "current"],
        }
    }

    /// Extract this field from a raw payload of either shape
    pub fn extract(&self, payload: &Value) -> u64 {
        extract(payload, self.object_path(), self.api_name())
    }

    /// Comma-separated `stat` parameter for a set of fields
    pub fn query_list(fields: &[StatField]) -> String {
        fields
            .iter()
            .map(StatField::api_name)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Number of days spanned by a delta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowDays(u32);

impl WindowDays {
    pub const DEFAULT: WindowDays = WindowDays(30);
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 365;

    pub fn new(days: u32) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&days) {
            Some(Self(days))
        } else {
            None
        }
    }

    pub fn days(&self) -> u32 {
        self.0
    }

    pub fn seconds(&self) -> i64 {
        i64::from(self.0) * SECONDS_PER_DAY
    }

    /// Unix timestamp `self` days before `now_secs`
    pub fn since(&self, now_secs: i64) -> i64 {
        now_secs - self.seconds()
    }
}

impl Default for WindowDays {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for WindowDays {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d", self.0)
    }
}

/// Cache key for one (entity, window) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub entity_id: EntityId,
    pub window: WindowDays,
}

impl CacheKey {
    pub fn new(entity_id: EntityId, window: WindowDays) -> Self {
        Self { entity_id, window }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "snap:{}:{}", self.entity_id, self.window.days())
    }
}

/// API credential; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Rejects empty or whitespace-only keys
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}
