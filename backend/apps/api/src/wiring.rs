//! Stack Construction

use std::sync::Arc;

use anyhow::Context;
use platform::http::{RateLimitedFetcher, ReqwestTransport};
use platform::kv::KvStore;
use stats::domain::repository::CredentialProvider;
use stats::infra::StaticCredential;
use stats::{DeltaComputer, SnapshotCache, StatsConfig, TornStatsApi};

use crate::settings::API_KEY_VAR;

pub type LiveApi = TornStatsApi<ReqwestTransport, StaticCredential>;

/// Credential from the environment; absence is a startup error
pub fn load_credential() -> anyhow::Result<StaticCredential> {
    let credential = StaticCredential::from_env(API_KEY_VAR);
    if credential.api_key().is_none() {
        anyhow::bail!("{API_KEY_VAR} must be set in environment");
    }
    Ok(credential)
}

/// API adapter over a single process-wide rate-limited fetcher
pub fn build_api(config: &StatsConfig, credential: StaticCredential) -> anyhow::Result<LiveApi> {
    let transport =
        ReqwestTransport::new(config.request_timeout).context("Failed to build HTTP client")?;
    let fetcher = Arc::new(RateLimitedFetcher::new(transport, config.request_gap));

    tracing::info!(
        base_url = %config.api_base_url,
        request_gap_ms = config.request_gap_ms(),
        "Statistics API client ready"
    );

    Ok(TornStatsApi::new(fetcher, credential, config.api_base_url.clone()))
}

/// Delta computer over `store`, after purging expired entries
///
/// Purge failures are logged and do not prevent startup.
pub async fn build_computer<K>(
    api: LiveApi,
    store: K,
    config: &StatsConfig,
) -> Arc<DeltaComputer<LiveApi, K>>
where
    K: KvStore + Sync,
{
    let cache = Arc::new(SnapshotCache::new(Arc::new(store), config.cache_ttl));

    if let Err(e) = cache.purge_expired().await {
        tracing::warn!(error = %e, "Snapshot purge failed, continuing anyway");
    }

    Arc::new(DeltaComputer::new(Arc::new(api), cache))
}
