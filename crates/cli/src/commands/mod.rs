//! CLI command implementations

pub mod config;
pub mod doctor;
pub mod handle;
pub mod hashtags;
pub mod listen;
pub mod notice;
pub mod test_post;
