//! Application use cases / business logic

pub mod hashtags;
pub mod render;
pub mod transition;

pub use hashtags::{HashtagComposer, sanitize_hashtag_field};
pub use render::Renderer;
pub use transition::{GuardError, RATE_LIMIT_NOTICE, TransitionGuard};
