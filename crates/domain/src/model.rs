//! Domain models and value objects

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Status value the content platform uses for live content
pub const PUBLISH_STATUS: &str = "publish";

/// A content item as delivered by the content platform (read-only here)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    /// Platform-specific item ID
    pub id: u64,
    /// Item title
    pub title: String,
    /// Permalink to the published item
    pub url: String,
    /// When the item was (first) published
    #[serde(with = "time::serde::rfc3339")]
    pub published_at: OffsetDateTime,
    /// Taxonomy term names (categories), in platform order
    #[serde(default)]
    pub taxonomy_terms: Vec<String>,
    /// Content type, e.g. "post" or "page"
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_content_type() -> String {
    "post".to_string()
}

/// A single status transition delivered by the event source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionEvent {
    pub item: ContentItem,
    pub previous_status: String,
    pub new_status: String,
    /// Hashtag field submitted together with the save, if any
    #[serde(default)]
    pub submitted_hashtags: Option<String>,
}

/// Classification of a status transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    /// Item goes live for the first time (or again after being unpublished)
    NewPublish,
    /// Item was live and is saved while still live
    InPlaceUpdate,
    /// Anything else (drafts, trashing, scheduling...)
    Ignored,
}

impl Transition {
    pub fn classify(previous_status: &str, new_status: &str) -> Self {
        match (previous_status == PUBLISH_STATUS, new_status == PUBLISH_STATUS) {
            (false, true) => Transition::NewPublish,
            (true, true) => Transition::InPlaceUpdate,
            _ => Transition::Ignored,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::NewPublish => "new_publish",
            Transition::InPlaceUpdate => "in_place_update",
            Transition::Ignored => "ignored",
        }
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-item posting state, persisted by the state store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Whether the initial publish has been mirrored
    #[serde(default)]
    pub posted: bool,
    /// When an update post was last sent (unix seconds on the wire)
    #[serde(default, with = "time::serde::timestamp::option")]
    pub last_update_at: Option<OffsetDateTime>,
    /// Comma-separated hashtags entered for this item
    #[serde(default)]
    pub custom_hashtags: Option<String>,
}

/// API credentials for the remote account
#[derive(Clone)]
pub struct Credentials {
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub access_token: SecretString,
    pub access_token_secret: SecretString,
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        access_token: impl Into<String>,
        access_token_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_key: SecretString::from(api_key.into()),
            api_secret: SecretString::from(api_secret.into()),
            access_token: SecretString::from(access_token.into()),
            access_token_secret: SecretString::from(access_token_secret.into()),
        }
    }

    /// Credentials with every field empty (always rejected by posters)
    pub fn empty() -> Self {
        Self::new("", "", "", "")
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").finish_non_exhaustive()
    }
}

/// Why a remote post did not go through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFailure {
    /// Credentials missing or malformed; no request was made
    InvalidCredentials,
    /// The request could not be sent or the response not read
    Transport(String),
    /// The API answered, but not with a created post
    Protocol(String),
}

impl fmt::Display for PostFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostFailure::InvalidCredentials => f.write_str("invalid credentials"),
            PostFailure::Transport(msg) => write!(f, "transport error: {}", msg),
            PostFailure::Protocol(msg) => write!(f, "unexpected response: {}", msg),
        }
    }
}

/// Normalized result of a single remote post attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostOutcome {
    Success { id: String },
    RateLimited,
    Failed(PostFailure),
}

/// Reason a transition was skipped without contacting the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    UntrackedType,
    ItemLocked,
    GlobalLocked,
    AlreadyPosted,
    RecentlyPublished,
    UpdatesDisabled,
    Throttled,
    Ignored,
    DryRun,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::UntrackedType => "untracked content type",
            SkipReason::ItemLocked => "item is being processed",
            SkipReason::GlobalLocked => "another item is being processed",
            SkipReason::AlreadyPosted => "already posted",
            SkipReason::RecentlyPublished => "published less than a minute ago",
            SkipReason::UpdatesDisabled => "update posting disabled",
            SkipReason::Throttled => "update interval not elapsed",
            SkipReason::Ignored => "transition not mirrored",
            SkipReason::DryRun => "dry run",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What handling a transition event ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// A remote post was created
    Posted { remote_id: String },
    /// Nothing was sent
    Skipped(SkipReason),
    /// The remote API refused the post due to rate limiting
    RateLimited,
    /// The post or the surrounding bookkeeping failed
    Failed { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_transitions() {
        assert_eq!(
            Transition::classify("draft", "publish"),
            Transition::NewPublish
        );
        assert_eq!(
            Transition::classify("future", "publish"),
            Transition::NewPublish
        );
        assert_eq!(
            Transition::classify("publish", "publish"),
            Transition::InPlaceUpdate
        );
        assert_eq!(Transition::classify("publish", "trash"), Transition::Ignored);
        assert_eq!(Transition::classify("draft", "draft"), Transition::Ignored);
    }

    #[test]
    fn test_post_record_serializes_unix_timestamp() {
        let record = PostRecord {
            posted: true,
            last_update_at: Some(OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap()),
            custom_hashtags: Some("rust,tokio".to_string()),
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["last_update_at"], 1_700_000_000);

        let back: PostRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_event_defaults() {
        let event: TransitionEvent = serde_json::from_value(serde_json::json!({
            "item": {
                "id": 7,
                "title": "Hello",
                "url": "https://example.com/?p=7",
                "published_at": "2026-01-01T00:00:00Z"
            },
            "previous_status": "draft",
            "new_status": "publish"
        }))
        .unwrap();

        assert_eq!(event.item.content_type, "post");
        assert!(event.item.taxonomy_terms.is_empty());
        assert!(event.submitted_hashtags.is_none());
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let creds = Credentials::new("key", "secret", "1-token", "token-secret");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("secret"));
        assert!(!debug.contains("token"));
    }
}
