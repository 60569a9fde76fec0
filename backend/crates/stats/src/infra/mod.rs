//! Infrastructure Layer
//!
//! Upstream API adapter, credential sources and database-backed storage.

pub mod credential;
pub mod postgres;
pub mod torn_api;

pub use credential::StaticCredential;
pub use postgres::PgSnapshotStore;
pub use torn_api::TornStatsApi;
