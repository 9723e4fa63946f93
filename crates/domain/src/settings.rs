//! Immutable settings snapshot handed to the transition guard

use std::time::Duration;
use thiserror::Error;

use crate::model::Credentials;

/// Update intervals the settings surface offers (seconds)
pub const ALLOWED_UPDATE_INTERVALS: [u64; 5] = [1800, 3600, 7200, 21600, 86400];

/// Upper bound for the hashtag count setting
pub const MAX_HASHTAGS_LIMIT: usize = 5;

pub const DEFAULT_UPDATE_TEMPLATE: &str = "Updated: {title} {url}";

/// Hashtag composition settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagSettings {
    /// Comma-separated tags appended to every post
    pub default_hashtags: String,
    /// Whether taxonomy terms become hashtags
    pub use_taxonomy: bool,
    /// Maximum number of hashtags per post
    pub max_hashtags: usize,
}

impl Default for HashtagSettings {
    fn default() -> Self {
        Self {
            default_hashtags: String::new(),
            use_taxonomy: true,
            max_hashtags: 3,
        }
    }
}

/// Everything the guard needs to decide and compose, read once per run
#[derive(Debug, Clone)]
pub struct AutoPostSettings {
    /// Only items of this content type are mirrored
    pub tracked_content_type: String,
    pub credentials: Credentials,
    pub update_posting_enabled: bool,
    /// Minimum time between two update posts for one item
    pub update_interval: Duration,
    /// Update message with `{title}` and `{url}` placeholders
    pub update_template: String,
    pub hashtags: HashtagSettings,
    /// Safety-net expiry for processing locks
    pub lock_ttl: Duration,
    /// Pause after persisting submitted hashtags on eventually consistent stores
    pub settle_delay: Duration,
    /// Update events this soon after publishing are ignored
    pub recent_publish_window: Duration,
    /// Compose and log, but never post or record
    pub dry_run: bool,
}

impl Default for AutoPostSettings {
    fn default() -> Self {
        Self {
            tracked_content_type: "post".to_string(),
            credentials: Credentials::empty(),
            update_posting_enabled: true,
            update_interval: Duration::from_secs(3600),
            update_template: DEFAULT_UPDATE_TEMPLATE.to_string(),
            hashtags: HashtagSettings::default(),
            lock_ttl: Duration::from_secs(60),
            settle_delay: Duration::from_millis(500),
            recent_publish_window: Duration::from_secs(60),
            dry_run: false,
        }
    }
}

/// Settings validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Update interval {0}s is not one of 1800, 3600, 7200, 21600, 86400")]
    InvalidUpdateInterval(u64),
    #[error("Maximum hashtags {0} exceeds the limit of 5")]
    TooManyHashtags(usize),
    #[error("Content type must not be empty")]
    EmptyContentType,
}

impl AutoPostSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        let interval = self.update_interval.as_secs();
        if !ALLOWED_UPDATE_INTERVALS.contains(&interval) {
            return Err(SettingsError::InvalidUpdateInterval(interval));
        }
        if self.hashtags.max_hashtags > MAX_HASHTAGS_LIMIT {
            return Err(SettingsError::TooManyHashtags(self.hashtags.max_hashtags));
        }
        if self.tracked_content_type.trim().is_empty() {
            return Err(SettingsError::EmptyContentType);
        }
        Ok(())
    }
}
