//! Stats Backend Module
//!
//! Rolling-window activity deltas for players of the statistics API.
//!
//! Clean Architecture structure:
//! - `domain/` - Snapshots, deltas, field extraction, port traits
//! - `application/` - Cache, delta computation, short-window fallback, annotation
//! - `infra/` - API adapter, credentials, PostgreSQL snapshot store
//! - `presentation/` - Badge formatting, HTTP handlers and router
//!
//! ## Request Model
//! - Batch work (list annotation) goes through the shared minimum-gap scheduler
//! - Single explicit lookups (profile view) fetch directly
//! - Results are cached per (entity, window) for a bounded TTL
//! - Missing history degrades to a zero delta; a missing "now" snapshot fails

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::annotate::{
    AnnotateOutcome, AnnotateSummary, BadgeRenderer, Discovered, RetryPolicy, RetryingAnnotator,
};
pub use application::compute_delta::DeltaComputer;
pub use application::config::StatsConfig;
pub use application::profile_view::{ProfileView, ProfileViewUseCase};
pub use application::snapshot_cache::SnapshotCache;
pub use error::{StatsError, StatsResult};
pub use infra::postgres::PgSnapshotStore;
pub use infra::torn_api::TornStatsApi;
pub use presentation::router::stats_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
pub use kernel::id::EntityId;

pub mod models {
    pub use crate::domain::entities::*;
    pub use crate::domain::value_objects::*;
    pub use crate::presentation::dto::*;
}
