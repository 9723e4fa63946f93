//! x-autopost domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Domain entities and value objects
//! - `ports`: Trait definitions for external dependencies (adapters)
//! - `settings`: Immutable settings snapshot
//! - `usecases`: Transition guard, hashtag composition and message rendering

pub mod model;
pub mod ports;
pub mod settings;
pub mod usecases;

pub use model::*;
pub use ports::*;
pub use settings::{AutoPostSettings, HashtagSettings, SettingsError};
