//! Stats Router

use crate::domain::repository::StatsApi;
use crate::presentation::handlers::{self, StatsAppState};
use axum::{
    Router,
    routing::{get, post},
};
use platform::kv::KvStore;

/// Create the stats router for any API and store implementation
///
/// Mounted under `/api/stats` by the binary.
pub fn stats_router<A, K>(state: StatsAppState<A, K>) -> Router
where
    A: StatsApi + Sync + 'static,
    K: KvStore + Sync + 'static,
{
    Router::new()
        .route("/health", get(handlers::health::<A, K>))
        .route("/annotate", post(handlers::annotate::<A, K>))
        .route("/{entity_id}", get(handlers::get_delta::<A, K>))
        .with_state(state)
}
