//! Transition guard - decides whether a status change becomes a remote post
//!
//! Every event runs under two processing locks (one for the item, one global)
//! that are released on every path once handling is over. Within the locks the
//! transition is classified and dispatched:
//! - new publish: post once per item, guarded by the `posted` flag
//! - in-place update: post from the update template, throttled per item
//! - anything else: ignored
//!
//! A submitted hashtag field is stored for every tracked event before the
//! locks are released, whatever the transition did.

use std::sync::Arc;

use crate::{
    model::{
        ContentItem, PostOutcome, PostRecord, SkipReason, Transition, TransitionEvent,
        TransitionOutcome,
    },
    ports::{
        Clock, LockError, LockLease, LockScope, LockStore, RemotePoster, StateError, StateStore,
    },
    settings::AutoPostSettings,
    usecases::{
        hashtags::{HashtagComposer, sanitize_hashtag_field},
        render::Renderer,
    },
};
use time::macros::format_description;
use tokio::time::sleep;

/// Notice persisted for the admin when the remote API rate limits a new post
pub const RATE_LIMIT_NOTICE: &str = "Rate limit reached. The X API free tier allows 1,500 posts per month (17 requests / 24 hours). See https://developer.x.com/en/portal/products for details.";

/// Errors raised while handling a transition; never surfaced to the event source
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("State error: {0}")]
    State(#[from] StateError),
    #[error("Lock error: {0}")]
    Lock(#[from] LockError),
}

/// Both processing locks, held for the duration of one event
struct Leases {
    item: LockLease,
    global: LockLease,
}

enum Acquisition {
    Granted(Leases),
    Busy(SkipReason),
}

/// Transition guard orchestrator
pub struct TransitionGuard<St, L, P, Cl>
where
    St: StateStore + ?Sized,
    L: LockStore + ?Sized,
    P: RemotePoster + ?Sized,
    Cl: Clock + ?Sized,
{
    state_store: Arc<St>,
    lock_store: Arc<L>,
    poster: Arc<P>,
    clock: Arc<Cl>,
    settings: AutoPostSettings,
    composer: HashtagComposer,
    renderer: Renderer,
}

impl<St, L, P, Cl> TransitionGuard<St, L, P, Cl>
where
    St: StateStore + ?Sized,
    L: LockStore + ?Sized,
    P: RemotePoster + ?Sized,
    Cl: Clock + ?Sized,
{
    pub fn new(
        state_store: Arc<St>,
        lock_store: Arc<L>,
        poster: Arc<P>,
        clock: Arc<Cl>,
        settings: AutoPostSettings,
    ) -> Self {
        let composer = HashtagComposer::new(settings.hashtags.clone());
        let renderer = Renderer::new(settings.update_template.clone());
        Self {
            state_store,
            lock_store,
            poster,
            clock,
            settings,
            composer,
            renderer,
        }
    }

    pub fn settings(&self) -> &AutoPostSettings {
        &self.settings
    }

    /// Handle one status transition
    ///
    /// Never fails: the returned outcome is informational and every problem
    /// has already been logged (or, for rate limits, persisted as a notice).
    pub async fn handle(&self, event: &TransitionEvent) -> TransitionOutcome {
        let item = &event.item;

        if item.content_type != self.settings.tracked_content_type {
            tracing::debug!(
                item_id = item.id,
                content_type = %item.content_type,
                "Ignoring untracked content type"
            );
            return TransitionOutcome::Skipped(SkipReason::UntrackedType);
        }

        let leases = match self.acquire_locks(item.id).await {
            Ok(Acquisition::Granted(leases)) => leases,
            Ok(Acquisition::Busy(reason)) => {
                tracing::warn!(item_id = item.id, reason = %reason, "Skipping transition");
                return TransitionOutcome::Skipped(reason);
            }
            Err(e) => {
                tracing::error!(item_id = item.id, error = %e, "Failed to acquire processing locks");
                return TransitionOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        let mut outcome = match self.process(event).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(item_id = item.id, error = %e, "Transition handling failed");
                TransitionOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        if let Some(raw) = event.submitted_hashtags.as_deref() {
            if let Err(e) = self.store_submitted_hashtags(item.id, raw).await {
                tracing::error!(item_id = item.id, error = %e, "Failed to store submitted hashtags");
                if !matches!(outcome, TransitionOutcome::Posted { .. }) {
                    outcome = TransitionOutcome::Failed {
                        error: e.to_string(),
                    };
                }
            }
        }

        self.release_locks(&leases).await;

        tracing::debug!(item_id = item.id, outcome = ?outcome, "Transition handled");
        outcome
    }

    /// Take the item and global locks, or report which one is busy
    async fn acquire_locks(&self, item_id: u64) -> Result<Acquisition, GuardError> {
        let item_scope = LockScope::Item(item_id);
        let ttl = self.settings.lock_ttl;

        if self.lock_store.is_held(item_scope).await? {
            return Ok(Acquisition::Busy(SkipReason::ItemLocked));
        }
        if self.lock_store.is_held(LockScope::Global).await? {
            return Ok(Acquisition::Busy(SkipReason::GlobalLocked));
        }

        let Some(item) = self.lock_store.try_acquire(item_scope, ttl).await? else {
            return Ok(Acquisition::Busy(SkipReason::ItemLocked));
        };

        match self.lock_store.try_acquire(LockScope::Global, ttl).await {
            Ok(Some(global)) => Ok(Acquisition::Granted(Leases { item, global })),
            Ok(None) => {
                self.release_lock(&item).await;
                Ok(Acquisition::Busy(SkipReason::GlobalLocked))
            }
            Err(e) => {
                self.release_lock(&item).await;
                Err(e.into())
            }
        }
    }

    async fn release_locks(&self, leases: &Leases) {
        self.release_lock(&leases.item).await;
        self.release_lock(&leases.global).await;
    }

    async fn release_lock(&self, lease: &LockLease) {
        if let Err(e) = self.lock_store.release(lease).await {
            // The lease TTL reclaims it eventually
            tracing::error!(scope = %lease.scope, error = %e, "Failed to release processing lock");
        }
    }

    /// Keep the editor's hashtag field on every tracked save, whatever the transition did
    async fn store_submitted_hashtags(&self, item_id: u64, raw: &str) -> Result<(), GuardError> {
        if self.settings.dry_run {
            return Ok(());
        }

        let hashtags = sanitize_hashtag_field(raw);
        let mut record = self.state_store.get_post_record(item_id).await?;
        if record.custom_hashtags.as_deref() == Some(hashtags.as_str()) {
            return Ok(());
        }

        record.custom_hashtags = Some(hashtags);
        self.state_store.save_post_record(item_id, &record).await?;
        tracing::info!(item_id, hashtags = ?record.custom_hashtags, "Stored submitted hashtags");
        Ok(())
    }

    async fn process(&self, event: &TransitionEvent) -> Result<TransitionOutcome, GuardError> {
        let transition = Transition::classify(&event.previous_status, &event.new_status);

        tracing::info!(
            item_id = event.item.id,
            previous_status = %event.previous_status,
            new_status = %event.new_status,
            transition = %transition,
            "Status transition"
        );

        match transition {
            Transition::NewPublish => {
                self.handle_new_publish(&event.item, event.submitted_hashtags.as_deref())
                    .await
            }
            Transition::InPlaceUpdate => self.handle_update(&event.item).await,
            Transition::Ignored => Ok(TransitionOutcome::Skipped(SkipReason::Ignored)),
        }
    }

    async fn handle_new_publish(
        &self,
        item: &ContentItem,
        submitted_hashtags: Option<&str>,
    ) -> Result<TransitionOutcome, GuardError> {
        let mut record = self.state_store.get_post_record(item.id).await?;

        if record.posted {
            tracing::info!(item_id = item.id, "Item already posted");
            return Ok(TransitionOutcome::Skipped(SkipReason::AlreadyPosted));
        }

        // Submitted hashtags must be stored before composing
        if let Some(raw) = submitted_hashtags {
            record.custom_hashtags = Some(sanitize_hashtag_field(raw));
            if !self.settings.dry_run {
                record = self.persist_submitted_hashtags(item.id, &record).await?;
            }
        }

        let hashtags = self.composer.compose(item, &record);
        let text = self.renderer.render_new_post(item, &hashtags);

        if self.settings.dry_run {
            tracing::info!(item_id = item.id, text = %text, "[DRY RUN] Would post");
            return Ok(TransitionOutcome::Skipped(SkipReason::DryRun));
        }

        tracing::info!(item_id = item.id, text = %text, "Posting new item");

        match self.poster.post(&text, &self.settings.credentials).await {
            PostOutcome::Success { id } => {
                record.posted = true;
                self.state_store.save_post_record(item.id, &record).await?;
                tracing::info!(item_id = item.id, remote_id = %id, "Posted new item");
                Ok(TransitionOutcome::Posted { remote_id: id })
            }
            PostOutcome::RateLimited => {
                tracing::warn!(item_id = item.id, "Rate limited while posting new item");
                self.state_store
                    .set_rate_limit_notice(RATE_LIMIT_NOTICE)
                    .await?;
                Ok(TransitionOutcome::RateLimited)
            }
            PostOutcome::Failed(failure) => {
                tracing::error!(item_id = item.id, error = %failure, "Failed to post new item");
                Ok(TransitionOutcome::Failed {
                    error: failure.to_string(),
                })
            }
        }
    }

    async fn persist_submitted_hashtags(
        &self,
        item_id: u64,
        record: &PostRecord,
    ) -> Result<PostRecord, GuardError> {
        self.state_store.save_post_record(item_id, record).await?;
        tracing::info!(
            item_id,
            hashtags = ?record.custom_hashtags,
            "Stored submitted hashtags"
        );

        if self.state_store.read_after_write_consistent() {
            return Ok(record.clone());
        }

        sleep(self.settings.settle_delay).await;
        Ok(self.state_store.get_post_record(item_id).await?)
    }

    async fn handle_update(&self, item: &ContentItem) -> Result<TransitionOutcome, GuardError> {
        let now = self.clock.now();

        if now - item.published_at < self.settings.recent_publish_window {
            tracing::debug!(item_id = item.id, "Update right after publish, skipping");
            return Ok(TransitionOutcome::Skipped(SkipReason::RecentlyPublished));
        }

        if !self.settings.update_posting_enabled {
            tracing::debug!(item_id = item.id, "Update posting disabled");
            return Ok(TransitionOutcome::Skipped(SkipReason::UpdatesDisabled));
        }

        let mut record = self.state_store.get_post_record(item.id).await?;

        if let Some(last_update_at) = record.last_update_at {
            if now - last_update_at < self.settings.update_interval {
                tracing::debug!(
                    item_id = item.id,
                    last_update_at = %last_update_at,
                    "Update interval not elapsed"
                );
                return Ok(TransitionOutcome::Skipped(SkipReason::Throttled));
            }
        }

        let hashtags = self.composer.compose(item, &record);
        let text = self.renderer.render_update(item, &hashtags);

        if self.settings.dry_run {
            tracing::info!(item_id = item.id, text = %text, "[DRY RUN] Would post update");
            return Ok(TransitionOutcome::Skipped(SkipReason::DryRun));
        }

        tracing::info!(item_id = item.id, text = %text, "Posting update");

        let outcome = match self.poster.post(&text, &self.settings.credentials).await {
            PostOutcome::Success { id } => TransitionOutcome::Posted { remote_id: id },
            PostOutcome::RateLimited => {
                tracing::warn!(item_id = item.id, "Rate limited while posting update");
                TransitionOutcome::RateLimited
            }
            PostOutcome::Failed(failure) => {
                tracing::error!(item_id = item.id, error = %failure, "Failed to post update");
                return Ok(TransitionOutcome::Failed {
                    error: failure.to_string(),
                });
            }
        };

        // A rate-limited attempt also starts a new interval
        record.last_update_at = Some(now);
        self.state_store.save_post_record(item.id, &record).await?;

        Ok(outcome)
    }

    /// Store hashtags typed into the editor for an item
    ///
    /// Returns `false` without writing while the item is mid-transition.
    pub async fn save_custom_hashtags(&self, item_id: u64, raw: &str) -> Result<bool, GuardError> {
        if self.lock_store.is_held(LockScope::Item(item_id)).await? {
            tracing::warn!(item_id, "Item is being processed, not saving hashtags");
            return Ok(false);
        }

        let mut record = self.state_store.get_post_record(item_id).await?;
        record.custom_hashtags = Some(sanitize_hashtag_field(raw));
        self.state_store.save_post_record(item_id, &record).await?;

        tracing::info!(item_id, hashtags = ?record.custom_hashtags, "Saved custom hashtags");
        Ok(true)
    }

    /// Send a timestamped test post with the configured credentials
    pub async fn send_test_post(&self) -> PostOutcome {
        let stamp = self
            .clock
            .now()
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .unwrap_or_default();
        let text = format!("This is a test post from x-autopost. {}", stamp);

        let outcome = self.poster.post(&text, &self.settings.credentials).await;
        tracing::info!(outcome = ?outcome, "Test post finished");
        outcome
    }
}
