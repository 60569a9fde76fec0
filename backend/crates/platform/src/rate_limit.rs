//! Rate Limiting Infrastructure
//!
//! A single scheduler owns the "next allowed start" instant for every caller
//! routed through it. Callers never touch that state directly; they reserve a
//! slot and sleep until it comes up.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Minimum gap between request start times
pub const DEFAULT_GAP: Duration = Duration::from_millis(600);

/// Serializes request starts behind a fixed minimum gap
///
/// Reservation happens under a short, non-async lock, so callers arriving
/// before an earlier reservation has fired still line up behind it. Start
/// instants handed out are non-decreasing and at least `gap` apart.
#[derive(Debug)]
pub struct GapScheduler {
    gap: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl Default for GapScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_GAP)
    }
}

impl GapScheduler {
    pub fn new(gap: Duration) -> Self {
        Self {
            gap,
            last_start: Mutex::new(None),
        }
    }

    pub fn gap(&self) -> Duration {
        self.gap
    }

    /// Claim the next start slot: `max(now, last_start + gap)`
    pub fn reserve(&self) -> Instant {
        let now = Instant::now();
        let mut last_start = self.last_start.lock().unwrap_or_else(PoisonError::into_inner);

        let start = match *last_start {
            Some(previous) => (previous + self.gap).max(now),
            None => now,
        };
        *last_start = Some(start);
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_reservation_is_immediate() {
        let scheduler = GapScheduler::new(Duration::from_millis(600));
        let now = Instant::now();
        assert_eq!(scheduler.reserve(), now);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_reservations_are_spaced() {
        let scheduler = GapScheduler::new(Duration::from_millis(600));
        let first = scheduler.reserve();
        let second = scheduler.reserve();
        let third = scheduler.reserve();

        assert_eq!(second - first, Duration::from_millis(600));
        assert_eq!(third - second, Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_scheduler_does_not_accumulate_credit() {
        let scheduler = GapScheduler::new(Duration::from_millis(600));
        scheduler.reserve();

        tokio::time::advance(Duration::from_secs(5)).await;

        let now = Instant::now();
        assert_eq!(scheduler.reserve(), now);
        assert_eq!(scheduler.reserve() - now, Duration::from_millis(600));
    }
}
