//! Handle command - process one status transition event

use anyhow::Result;
use serde_json::{Value, json};
use std::path::PathBuf;
use x_autopost_domain::{TransitionEvent, TransitionOutcome};

use crate::args::HandleArgs;
use crate::config::AppConfig;
use crate::wiring::{build_guard, read_event};

pub async fn execute(args: HandleArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let event = read_event(args.file.as_deref())?;
    let guard = build_guard(&config, args.dry_run).await?;

    let outcome = guard.handle(&event).await;
    println!("{}", outcome_json(&event, &outcome));

    Ok(())
}

/// One-line machine-readable summary of a handled event
pub(crate) fn outcome_json(event: &TransitionEvent, outcome: &TransitionOutcome) -> Value {
    let mut value = json!({
        "item_id": event.item.id,
        "transition": x_autopost_domain::Transition::classify(
            &event.previous_status,
            &event.new_status,
        )
        .as_str(),
    });

    match outcome {
        TransitionOutcome::Posted { remote_id } => {
            value["outcome"] = json!("posted");
            value["remote_id"] = json!(remote_id);
        }
        TransitionOutcome::Skipped(reason) => {
            value["outcome"] = json!("skipped");
            value["reason"] = json!(reason.as_str());
        }
        TransitionOutcome::RateLimited => {
            value["outcome"] = json!("rate_limited");
        }
        TransitionOutcome::Failed { error } => {
            value["outcome"] = json!("failed");
            value["error"] = json!(error);
        }
    }

    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use x_autopost_domain::{ContentItem, SkipReason};

    fn event() -> TransitionEvent {
        TransitionEvent {
            item: ContentItem {
                id: 12,
                title: "Title".to_string(),
                url: "https://example.com/t".to_string(),
                published_at: datetime!(2026-01-01 0:00 UTC),
                taxonomy_terms: vec![],
                content_type: "post".to_string(),
            },
            previous_status: "publish".to_string(),
            new_status: "publish".to_string(),
            submitted_hashtags: None,
        }
    }

    #[test]
    fn test_posted_summary() {
        let value = outcome_json(
            &event(),
            &TransitionOutcome::Posted {
                remote_id: "99".to_string(),
            },
        );

        assert_eq!(value["item_id"], 12);
        assert_eq!(value["outcome"], "posted");
        assert_eq!(value["remote_id"], "99");
    }

    #[test]
    fn test_skipped_summary_carries_reason() {
        let value = outcome_json(&event(), &TransitionOutcome::Skipped(SkipReason::Throttled));

        assert_eq!(value["outcome"], "skipped");
        assert_eq!(value["reason"], SkipReason::Throttled.as_str());
    }
}
