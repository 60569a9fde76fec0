//! Short-Window Fallback Policy
//!
//! For very short windows the API occasionally answers a historical query
//! with a snapshot identical to the live one. When the historical play time
//! equals the live play time, the lookup is repeated one day further back and
//! the date actually used is reported.
//!
//! Kept separate from the delta algorithm; it only applies to the windows it
//! is configured for (by default, one day).

use chrono::{DateTime, NaiveDate};

use crate::domain::entities::StatSnapshot;
use crate::domain::value_objects::{SECONDS_PER_DAY, WindowDays};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortWindowFallback {
    windows: Vec<u32>,
}

impl Default for ShortWindowFallback {
    fn default() -> Self {
        Self::new([1])
    }
}

impl ShortWindowFallback {
    pub fn new(windows: impl IntoIterator<Item = u32>) -> Self {
        Self {
            windows: windows.into_iter().collect(),
        }
    }

    /// Policy disabled for every window
    pub fn disabled() -> Self {
        Self::new([])
    }

    pub fn applies(&self, window: WindowDays) -> bool {
        self.windows.contains(&window.days())
    }

    /// The historical snapshot looks like a copy of the live one
    pub fn is_stale(&self, live: &StatSnapshot, past: &StatSnapshot) -> bool {
        live.play == past.play
    }

    /// Timestamp to retry at: one day before `since`
    pub fn alternate_timestamp(&self, since: i64) -> i64 {
        since - SECONDS_PER_DAY
    }
}

/// UTC calendar date of a Unix timestamp
pub fn snapshot_date(timestamp: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.date_naive())
}
