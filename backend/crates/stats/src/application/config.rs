//! Application Configuration
//!
//! Configuration for the stats application layer.

use std::time::Duration;

use platform::rate_limit::DEFAULT_GAP;

use crate::application::annotate::RetryPolicy;
use crate::application::short_window::ShortWindowFallback;
use crate::domain::value_objects::WindowDays;
use crate::error::{StatsError, StatsResult};

/// Stats application configuration
#[derive(Debug, Clone)]
pub struct StatsConfig {
    /// Base URL of the statistics API
    pub api_base_url: String,
    /// Minimum gap between queued request starts
    pub request_gap: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Snapshot cache TTL
    pub cache_ttl: Duration,
    /// Attempts per entity during annotation
    pub retry_attempts: u32,
    /// Backoff unit; attempt `n` is followed by `n * retry_base_delay`
    pub retry_base_delay: Duration,
    /// Window used when a caller does not choose one
    pub default_window_days: u32,
    /// Windows the stale-snapshot fallback applies to
    pub short_window_fallback_days: Vec<u32>,
    /// Concurrent annotations in flight; `None` is unbounded
    pub max_concurrent_annotations: Option<usize>,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.torn.com/v2".to_string(),
            request_gap: DEFAULT_GAP,
            request_timeout: Duration::from_secs(15),
            cache_ttl: Duration::from_secs(2 * 3600), // 2 hours
            retry_attempts: 3,
            retry_base_delay: Duration::from_millis(300),
            default_window_days: 30,
            short_window_fallback_days: vec![1],
            max_concurrent_annotations: None,
        }
    }
}

impl StatsConfig {
    pub fn cache_ttl_ms(&self) -> i64 {
        self.cache_ttl.as_millis() as i64
    }

    pub fn request_gap_ms(&self) -> i64 {
        self.request_gap.as_millis() as i64
    }

    pub fn default_window(&self) -> StatsResult<WindowDays> {
        WindowDays::new(self.default_window_days)
            .ok_or(StatsError::InvalidWindow(self.default_window_days))
    }

    /// Resolve a caller-supplied window, falling back to the default
    pub fn window_or_default(&self, days: Option<u32>) -> StatsResult<WindowDays> {
        match days {
            Some(days) => WindowDays::new(days).ok_or(StatsError::InvalidWindow(days)),
            None => self.default_window(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_base_delay)
    }

    pub fn short_window_fallback(&self) -> ShortWindowFallback {
        ShortWindowFallback::new(self.short_window_fallback_days.iter().copied())
    }
}
