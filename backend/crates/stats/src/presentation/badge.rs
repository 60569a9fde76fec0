//! Badge Formatting
//!
//! Text and colour tier for a delta, as shown next to an entity's listing.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::entities::DeltaResult;
use crate::domain::value_objects::SECONDS_PER_DAY;

const SECONDS_PER_HOUR: u64 = 3_600;
const ACTIVE_THRESHOLD_SECS: u64 = SECONDS_PER_DAY as u64;
const MODERATE_THRESHOLD_SECS: u64 = 3 * SECONDS_PER_HOUR;

/// Play time split into whole days, hours and minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayTime {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
}

impl PlayTime {
    pub fn from_secs(secs: u64) -> Self {
        let day = ACTIVE_THRESHOLD_SECS;
        Self {
            days: secs / day,
            hours: secs % day / SECONDS_PER_HOUR,
            minutes: secs % SECONDS_PER_HOUR / 60,
        }
    }
}

impl fmt::Display for PlayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
    }
}

/// Colour tier by play time over the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeTier {
    /// At least one day
    Active,
    /// At least three hours
    Moderate,
    Low,
}

impl BadgeTier {
    pub fn for_play(secs: u64) -> Self {
        if secs >= ACTIVE_THRESHOLD_SECS {
            BadgeTier::Active
        } else if secs >= MODERATE_THRESHOLD_SECS {
            BadgeTier::Moderate
        } else {
            BadgeTier::Low
        }
    }

    /// CSS colour name
    pub const fn color(&self) -> &'static str {
        match self {
            BadgeTier::Active => "limegreen",
            BadgeTier::Moderate => "orange",
            BadgeTier::Low => "red",
        }
    }
}

/// `⏱️ 2d 7h 5m  💊12 🔥40`
pub fn badge_text(delta: &DeltaResult) -> String {
    format!(
        "⏱️ {}  💊{} 🔥{}",
        PlayTime::from_secs(delta.play),
        delta.xan,
        delta.streak
    )
}

/// Note shown when the historical snapshot came from the fallback date
pub fn snapshot_note(date: NaiveDate) -> String {
    format!("📅 Snapshot: {}", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_time_split() {
        let t = PlayTime::from_secs(2 * 86_400 + 7 * 3_600 + 5 * 60 + 59);
        assert_eq!(t, PlayTime { days: 2, hours: 7, minutes: 5 });
        assert_eq!(t.to_string(), "2d 7h 5m");
        assert_eq!(PlayTime::from_secs(0).to_string(), "0d 0h 0m");
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(BadgeTier::for_play(86_400), BadgeTier::Active);
        assert_eq!(BadgeTier::for_play(86_399), BadgeTier::Moderate);
        assert_eq!(BadgeTier::for_play(10_800), BadgeTier::Moderate);
        assert_eq!(BadgeTier::for_play(10_799), BadgeTier::Low);
        assert_eq!(BadgeTier::Low.color(), "red");
    }

    #[test]
    fn test_badge_text() {
        let delta = DeltaResult {
            play: 200_000,
            xan: 2,
            streak: 40,
        };
        assert_eq!(badge_text(&delta), "⏱️ 2d 7h 33m  💊2 🔥40");
    }

    #[test]
    fn test_snapshot_note() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(snapshot_note(date), "📅 Snapshot: 2024-03-09");
    }
}
