//! PostgreSQL Snapshot Store

use platform::kv::{KvError, KvResult, KvStore, StoredValue};
use serde_json::Value;
use sqlx::PgPool;

/// PostgreSQL-backed key-value store for cached deltas
///
/// Table: `stat_snapshots(cache_key, created_at_ms, data)`.
#[derive(Clone)]
pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct SnapshotRow {
    created_at_ms: i64,
    data: Value,
}

fn backend_error(err: sqlx::Error) -> KvError {
    KvError::Backend(err.to_string())
}

impl KvStore for PgSnapshotStore {
    async fn get(&self, key: &str) -> KvResult<Option<StoredValue>> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT created_at_ms, data
            FROM stat_snapshots
            WHERE cache_key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(row.map(|r| StoredValue::new(r.created_at_ms, r.data)))
    }

    async fn put(&self, key: &str, value: StoredValue) -> KvResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stat_snapshots (cache_key, created_at_ms, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (cache_key)
            DO UPDATE SET created_at_ms = EXCLUDED.created_at_ms, data = EXCLUDED.data
            "#,
        )
        .bind(key)
        .bind(value.created_at)
        .bind(&value.data)
        .execute(&self.pool)
        .await
        .map_err(backend_error)?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> KvResult<()> {
        sqlx::query("DELETE FROM stat_snapshots WHERE cache_key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?;

        Ok(())
    }

    async fn evict_older_than(&self, cutoff_ms: i64) -> KvResult<u64> {
        let deleted = sqlx::query("DELETE FROM stat_snapshots WHERE created_at_ms < $1")
            .bind(cutoff_ms)
            .execute(&self.pool)
            .await
            .map_err(backend_error)?
            .rows_affected();

        tracing::info!(snapshots_deleted = deleted, "Evicted expired stat snapshots");

        Ok(deleted)
    }
}
