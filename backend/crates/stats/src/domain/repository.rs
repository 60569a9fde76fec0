//! Repository Traits
//!
//! Ports to the outside world. Implementations are in the infrastructure layer.

use crate::domain::value_objects::{ApiKey, StatField};
use crate::error::StatsResult;
use kernel::id::EntityId;
use platform::http::FetchStrategy;
use serde_json::Value;

/// Statistics API port
#[trait_variant::make(StatsApi: Send)]
pub trait LocalStatsApi {
    /// Fetch the raw statistics payload for `fields`
    ///
    /// `at` selects a historical cumulative snapshot (Unix seconds);
    /// `None` means now.
    async fn personal_stats(
        &self,
        entity_id: EntityId,
        fields: &[StatField],
        at: Option<i64>,
        strategy: FetchStrategy,
    ) -> StatsResult<Value>;
}

/// Supplies the API key, if one is configured
pub trait CredentialProvider: Send + Sync {
    fn api_key(&self) -> Option<ApiKey>;
}
