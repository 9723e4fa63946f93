//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{Credentials, PostOutcome, PostRecord};

/// Port for the remote microblogging API
///
/// Implementations never fail: every problem is folded into
/// [`PostOutcome::Failed`] or [`PostOutcome::RateLimited`].
#[async_trait]
pub trait RemotePoster: Send + Sync {
    /// Publish `text` as a new post on the account identified by `credentials`
    async fn post(&self, text: &str, credentials: &Credentials) -> PostOutcome;

    /// Get the platform name (e.g., "x")
    fn platform(&self) -> &'static str;
}

/// Error type for state store operations
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for per-item metadata and the admin notice channel
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get the posting record for an item (default record if none stored)
    async fn get_post_record(&self, item_id: u64) -> Result<PostRecord, StateError>;

    /// Replace the posting record for an item
    async fn save_post_record(&self, item_id: u64, record: &PostRecord)
    -> Result<(), StateError>;

    /// Persist the user-visible rate limit notice
    async fn set_rate_limit_notice(&self, message: &str) -> Result<(), StateError>;

    /// Read the rate limit notice without clearing it
    async fn rate_limit_notice(&self) -> Result<Option<String>, StateError>;

    /// Read and clear the rate limit notice
    async fn take_rate_limit_notice(&self) -> Result<Option<String>, StateError>;

    /// Whether a write is visible to the very next read
    fn read_after_write_consistent(&self) -> bool {
        true
    }
}

/// Scope of a processing lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockScope {
    Item(u64),
    Global,
}

impl LockScope {
    /// Storage key for this scope
    pub fn key(&self) -> String {
        match self {
            LockScope::Item(id) => format!("item:{}", id),
            LockScope::Global => "global".to_string(),
        }
    }
}

impl fmt::Display for LockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Proof of one successful acquisition
///
/// The token is unique per acquisition, so releasing a stale lease never
/// frees a lock someone else took over after expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockLease {
    pub scope: LockScope,
    pub token: String,
}

/// Error type for lock store operations
#[derive(Debug, Error)]
pub enum LockError {
    #[error("Lock backend error: {0}")]
    Backend(String),
}

/// Port for short-lived processing locks
///
/// Leases expire after their TTL so a crashed holder cannot wedge posting.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Take the lock if it is free or its lease expired; `None` if held
    async fn try_acquire(
        &self,
        scope: LockScope,
        ttl: Duration,
    ) -> Result<Option<LockLease>, LockError>;

    /// Whether an unexpired lease exists for the scope
    async fn is_held(&self, scope: LockScope) -> Result<bool, LockError>;

    /// Drop the lease (no-op if it expired and was taken over, or is gone)
    async fn release(&self, lease: &LockLease) -> Result<(), LockError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Clock pinned to a settable instant, for tests
#[derive(Debug)]
pub struct FixedClock {
    now: std::sync::Mutex<OffsetDateTime>,
}

impl FixedClock {
    pub fn new(now: OffsetDateTime) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, by: time::Duration) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += by;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.now
            .lock()
            .map(|guard| *guard)
            .unwrap_or_else(|poisoned| *poisoned.into_inner())
    }
}
