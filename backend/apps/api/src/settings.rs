//! Environment Settings

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use stats::StatsConfig;

pub const API_KEY_VAR: &str = "TORN_API_KEY";

const DEFAULT_CACHE_PATH: &str = ".stats-cache.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_FRONTEND_ORIGINS: &str = "https://www.torn.com,https://torn.com";

/// Everything the binaries read from the environment, except the API key
#[derive(Debug, Clone)]
pub struct Settings {
    pub stats: StatsConfig,
    pub cache_path: PathBuf,
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub frontend_origins: Vec<String>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = StatsConfig::default();

        let stats = StatsConfig {
            api_base_url: env::var("TORN_API_BASE_URL").unwrap_or(defaults.api_base_url),
            request_gap: parse_var("STATS_REQUEST_GAP_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_gap),
            cache_ttl: parse_var("STATS_CACHE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            retry_attempts: parse_var("STATS_RETRY_ATTEMPTS")?.unwrap_or(defaults.retry_attempts),
            retry_base_delay: parse_var("STATS_RETRY_BASE_DELAY_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_base_delay),
            default_window_days: parse_var("STATS_DEFAULT_WINDOW_DAYS")?
                .unwrap_or(defaults.default_window_days),
            ..defaults
        };

        // Reject a bad default window at startup rather than on every request
        stats
            .default_window()
            .context("STATS_DEFAULT_WINDOW_DAYS out of range")?;

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR is not a socket address")?;

        let frontend_origins = env::var("FRONTEND_ORIGINS")
            .unwrap_or_else(|_| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            stats,
            cache_path: env::var("STATS_CACHE_PATH")
                .unwrap_or_else(|_| DEFAULT_CACHE_PATH.to_string())
                .into(),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            bind_addr,
            frontend_origins,
        })
    }
}

fn parse_var<T>(name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{name} has an invalid value")),
        _ => Ok(None),
    }
}
