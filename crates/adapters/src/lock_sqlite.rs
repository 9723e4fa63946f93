//! SQLite advisory lock store
//!
//! Leases live in a `locks` table keyed by scope. Acquisition is one
//! conditional upsert, so it is atomic across processes sharing the database.
//! Each acquisition writes a fresh token; release only deletes its own.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;
use x_autopost_domain::{LockError, LockLease, LockScope, LockStore};

/// SQLite-backed lock store
#[derive(Clone)]
pub struct SqliteLockStore {
    pool: SqlitePool,
}

impl SqliteLockStore {
    /// Create a lock store on an existing pool, creating the table if needed
    pub async fn new(pool: SqlitePool) -> Result<Self, LockError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS locks (
                scope TEXT PRIMARY KEY,
                token TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| LockError::Backend(e.to_string()))?;

        Ok(Self { pool })
    }
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[async_trait]
impl LockStore for SqliteLockStore {
    async fn try_acquire(
        &self,
        scope: LockScope,
        ttl: Duration,
    ) -> Result<Option<LockLease>, LockError> {
        let now = now_millis();
        let expires_at = now.saturating_add(ttl.as_millis() as i64);
        let token = Uuid::new_v4().simple().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO locks (scope, token, expires_at) VALUES (?, ?, ?)
            ON CONFLICT(scope) DO UPDATE SET
                token = excluded.token,
                expires_at = excluded.expires_at
            WHERE locks.expires_at <= ?
            "#,
        )
        .bind(scope.key())
        .bind(&token)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| LockError::Backend(e.to_string()))?;

        Ok((result.rows_affected() == 1).then_some(LockLease { scope, token }))
    }

    async fn is_held(&self, scope: LockScope) -> Result<bool, LockError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT expires_at FROM locks WHERE scope = ?")
            .bind(scope.key())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?;

        Ok(row.is_some_and(|(expires_at,)| expires_at > now_millis()))
    }

    async fn release(&self, lease: &LockLease) -> Result<(), LockError> {
        sqlx::query("DELETE FROM locks WHERE scope = ? AND token = ?")
            .bind(lease.scope.key())
            .bind(&lease.token)
            .execute(&self.pool)
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state_sqlite::SqliteStateStore;

    async fn lock_store() -> SqliteLockStore {
        let state = SqliteStateStore::in_memory().await.unwrap();
        SqliteLockStore::new(state.pool()).await.unwrap()
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let locks = lock_store().await;
        let ttl = Duration::from_secs(60);

        let lease = locks.try_acquire(LockScope::Item(1), ttl).await.unwrap().unwrap();
        assert_eq!(lease.scope, LockScope::Item(1));
        assert!(locks.try_acquire(LockScope::Item(1), ttl).await.unwrap().is_none());
        assert!(locks.is_held(LockScope::Item(1)).await.unwrap());
        assert!(!locks.is_held(LockScope::Global).await.unwrap());

        locks.release(&lease).await.unwrap();

        assert!(!locks.is_held(LockScope::Item(1)).await.unwrap());
        assert!(locks.try_acquire(LockScope::Item(1), ttl).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_scopes_are_independent() {
        let locks = lock_store().await;
        let ttl = Duration::from_secs(60);

        assert!(locks.try_acquire(LockScope::Item(1), ttl).await.unwrap().is_some());
        assert!(locks.try_acquire(LockScope::Item(2), ttl).await.unwrap().is_some());
        assert!(locks.try_acquire(LockScope::Global, ttl).await.unwrap().is_some());
        assert!(locks.try_acquire(LockScope::Global, ttl).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_lease_can_be_taken_over() {
        let locks = lock_store().await;

        let stale = locks
            .try_acquire(LockScope::Global, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        assert!(!locks.is_held(LockScope::Global).await.unwrap());

        let current = locks
            .try_acquire(LockScope::Global, Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stale.token, current.token);
        assert!(locks.is_held(LockScope::Global).await.unwrap());
    }

    #[tokio::test]
    async fn test_stale_release_keeps_new_holder() {
        let locks = lock_store().await;

        let stale = locks
            .try_acquire(LockScope::Item(5), Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        let current = locks
            .try_acquire(LockScope::Item(5), Duration::from_secs(60))
            .await
            .unwrap()
            .unwrap();

        locks.release(&stale).await.unwrap();
        assert!(locks.is_held(LockScope::Item(5)).await.unwrap());

        locks.release(&current).await.unwrap();
        assert!(!locks.is_held(LockScope::Item(5)).await.unwrap());
    }
}
