//! X (Twitter) API adapters

mod oauth;
mod write;

pub use write::{ApiVersion, DEFAULT_BASE_URL, XPoster, XPosterConfig, credentials_valid};

use async_trait::async_trait;
use std::sync::Mutex;
use x_autopost_domain::{Credentials, PostOutcome, RemotePoster};

/// Stub poster for testing and offline runs
///
/// Records every text it is asked to post and answers with a fixed outcome
/// (a numbered success by default).
pub struct StubPoster {
    outcome: Option<PostOutcome>,
    posted: Mutex<Vec<String>>,
}

impl StubPoster {
    /// Stub that accepts every post
    pub fn new() -> Self {
        Self {
            outcome: None,
            posted: Mutex::new(vec![]),
        }
    }

    /// Stub that always answers with `outcome`
    pub fn returning(outcome: PostOutcome) -> Self {
        Self {
            outcome: Some(outcome),
            posted: Mutex::new(vec![]),
        }
    }

    /// Get all texts that were posted
    pub fn get_posted(&self) -> Vec<String> {
        self.posted
            .lock()
            .map(|posted| posted.clone())
            .unwrap_or_default()
    }
}

impl Default for StubPoster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemotePoster for StubPoster {
    async fn post(&self, text: &str, _credentials: &Credentials) -> PostOutcome {
        let count = match self.posted.lock() {
            Ok(mut posted) => {
                posted.push(text.to_string());
                posted.len()
            }
            Err(_) => 0,
        };

        tracing::info!(text = %text, "[STUB] Post accepted");

        self.outcome.clone().unwrap_or_else(|| PostOutcome::Success {
            id: format!("stub_{}", count),
        })
    }

    fn platform(&self) -> &'static str {
        "x"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use x_autopost_domain::PostFailure;

    #[tokio::test]
    async fn test_stub_numbers_successes() {
        let stub = StubPoster::new();
        let creds = Credentials::empty();

        assert_eq!(
            stub.post("one", &creds).await,
            PostOutcome::Success {
                id: "stub_1".to_string()
            }
        );
        assert_eq!(
            stub.post("two", &creds).await,
            PostOutcome::Success {
                id: "stub_2".to_string()
            }
        );
        assert_eq!(stub.get_posted(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_stub_scripted_outcome() {
        let stub = StubPoster::returning(PostOutcome::Failed(PostFailure::InvalidCredentials));

        let outcome = stub.post("text", &Credentials::empty()).await;

        assert_eq!(outcome, PostOutcome::Failed(PostFailure::InvalidCredentials));
    }
}
