//! x-autopost adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `state`: SQLite and in-memory post record / notice stores
//! - `locks`: SQLite and in-memory processing lock stores
//! - `x`: X (Twitter) API poster and a stub poster

mod lock_sqlite;
mod state_memory;
mod state_sqlite;

pub mod x_api;

/// Re-exports for state adapters
pub mod state {
    pub use crate::state_memory::InMemoryStateStore;
    pub use crate::state_sqlite::SqliteStateStore;
}

/// Re-exports for lock adapters
pub mod locks {
    pub use crate::lock_sqlite::SqliteLockStore;
    pub use crate::state_memory::InMemoryLockStore;
}

/// Re-exports for X API adapters
pub mod x {
    pub use crate::x_api::{
        ApiVersion, DEFAULT_BASE_URL, StubPoster, XPoster, XPosterConfig, credentials_valid,
    };
}
