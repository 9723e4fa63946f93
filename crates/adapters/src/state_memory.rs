//! In-memory state and lock stores for testing and ephemeral runs

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;
use tokio::time::Instant;
use uuid::Uuid;
use x_autopost_domain::{
    LockError, LockLease, LockScope, LockStore, PostRecord, StateError, StateStore,
};

/// In-memory state store implementation
pub struct InMemoryStateStore {
    records: RwLock<HashMap<u64, PostRecord>>,
    notice: RwLock<Option<String>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            notice: RwLock::new(None),
        }
    }
}

impl Default for InMemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get_post_record(&self, item_id: u64) -> Result<PostRecord, StateError> {
        let records = self
            .records
            .read()
            .map_err(|e| StateError::Database(e.to_string()))?;
        Ok(records.get(&item_id).cloned().unwrap_or_default())
    }

    async fn save_post_record(
        &self,
        item_id: u64,
        record: &PostRecord,
    ) -> Result<(), StateError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StateError::Database(e.to_string()))?;
        records.insert(item_id, record.clone());
        Ok(())
    }

    async fn set_rate_limit_notice(&self, message: &str) -> Result<(), StateError> {
        let mut notice = self
            .notice
            .write()
            .map_err(|e| StateError::Database(e.to_string()))?;
        *notice = Some(message.to_string());
        Ok(())
    }

    async fn rate_limit_notice(&self) -> Result<Option<String>, StateError> {
        let notice = self
            .notice
            .read()
            .map_err(|e| StateError::Database(e.to_string()))?;
        Ok(notice.clone())
    }

    async fn take_rate_limit_notice(&self) -> Result<Option<String>, StateError> {
        let mut notice = self
            .notice
            .write()
            .map_err(|e| StateError::Database(e.to_string()))?;
        Ok(notice.take())
    }
}

struct Lease {
    token: String,
    expires_at: Instant,
}

/// In-process lock store with TTL-based leases
pub struct InMemoryLockStore {
    leases: Mutex<HashMap<LockScope, Lease>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self {
            leases: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryLockStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn try_acquire(
        &self,
        scope: LockScope,
        ttl: Duration,
    ) -> Result<Option<LockLease>, LockError> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|e| LockError::Backend(e.to_string()))?;
        let now = Instant::now();

        if leases.get(&scope).is_some_and(|lease| lease.expires_at > now) {
            return Ok(None);
        }

        let token = Uuid::new_v4().simple().to_string();
        leases.insert(
            scope,
            Lease {
                token: token.clone(),
                expires_at: now + ttl,
            },
        );
        Ok(Some(LockLease { scope, token }))
    }

    async fn is_held(&self, scope: LockScope) -> Result<bool, LockError> {
        let leases = self
            .leases
            .lock()
            .map_err(|e| LockError::Backend(e.to_string()))?;
        Ok(leases
            .get(&scope)
            .is_some_and(|lease| lease.expires_at > Instant::now()))
    }

    async fn release(&self, lease: &LockLease) -> Result<(), LockError> {
        let mut leases = self
            .leases
            .lock()
            .map_err(|e| LockError::Backend(e.to_string()))?;
        if leases
            .get(&lease.scope)
            .is_some_and(|held| held.token == lease.token)
        {
            leases.remove(&lease.scope);
        }
        Ok(())
    }
}
