//! X API write adapter for publishing posts

use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::sync::LazyLock;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;
use x_autopost_domain::{Credentials, PostFailure, PostOutcome, RemotePoster};

use super::oauth::{OAuthNonce, authorization_header};

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// Which create-post endpoint to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiVersion {
    /// `POST /2/tweets` with a JSON `text` body
    #[default]
    V2,
    /// `POST /1.1/statuses/update.json` with a form `status` body
    Legacy,
}

impl ApiVersion {
    fn path(&self) -> &'static str {
        match self {
            ApiVersion::V2 => "/2/tweets",
            ApiVersion::Legacy => "/1.1/statuses/update.json",
        }
    }
}

/// Poster configuration
#[derive(Debug, Clone)]
pub struct XPosterConfig {
    pub base_url: String,
    pub api_version: ApiVersion,
    /// Request timeout
    pub timeout: Duration,
    /// Pause before every request, to stay clear of burst limits
    pub min_spacing: Duration,
    /// Check credential shapes, not just presence
    pub strict_credentials: bool,
}

impl Default for XPosterConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: ApiVersion::V2,
            timeout: Duration::from_secs(10),
            min_spacing: Duration::from_secs(1),
            strict_credentials: false,
        }
    }
}

/// X API poster for creating posts, signed with OAuth 1.0a user context
pub struct XPoster {
    client: Client,
    config: XPosterConfig,
}

impl XPoster {
    pub fn new(config: XPosterConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version.path()
        )
    }

    async fn send(&self, text: &str, credentials: &Credentials) -> PostOutcome {
        let url = self.endpoint();
        let nonce = OAuthNonce {
            nonce: Uuid::new_v4().simple().to_string(),
            timestamp: OffsetDateTime::now_utc().unix_timestamp(),
        };

        let request = match self.config.api_version {
            ApiVersion::V2 => {
                let auth = authorization_header("POST", &url, &[], credentials, &nonce);
                self.client
                    .post(&url)
                    .header("Authorization", auth)
                    .json(&CreateTweetRequest { text })
            }
            ApiVersion::Legacy => {
                let params = [("status", text)];
                let auth = authorization_header("POST", &url, &params, credentials, &nonce);
                self.client
                    .post(&url)
                    .header("Authorization", auth)
                    .form(&params)
            }
        };

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => return PostOutcome::Failed(PostFailure::Transport(e.to_string())),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return PostOutcome::Failed(PostFailure::Transport(e.to_string())),
        };

        interpret_response(status, &body)
    }
}

#[derive(Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

/// Map an HTTP status and body onto the three posting outcomes
fn interpret_response(status: StatusCode, body: &str) -> PostOutcome {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return PostOutcome::RateLimited;
    }

    let json: serde_json::Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(e) => {
            return PostOutcome::Failed(PostFailure::Protocol(format!(
                "HTTP {}: malformed JSON: {}",
                status.as_u16(),
                e
            )));
        }
    };

    if json.get("status").and_then(|s| s.as_u64()) == Some(429) {
        return PostOutcome::RateLimited;
    }

    let id = json
        .pointer("/data/id")
        .or_else(|| json.get("id_str"))
        .and_then(|id| id.as_str());

    match id {
        Some(id) => PostOutcome::Success { id: id.to_string() },
        None => PostOutcome::Failed(PostFailure::Protocol(format!(
            "HTTP {}: {}",
            status.as_u16(),
            json
        ))),
    }
}

static ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]+$").expect("valid regex"));
static ACCESS_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+-[A-Za-z0-9]+$").expect("valid regex"));

/// Whether credentials are present (and, when `strict`, shaped like X API keys)
pub fn credentials_valid(credentials: &Credentials, strict: bool) -> bool {
    let api_key = credentials.api_key.expose_secret();
    let api_secret = credentials.api_secret.expose_secret();
    let access_token = credentials.access_token.expose_secret();
    let access_token_secret = credentials.access_token_secret.expose_secret();

    let fields = [api_key, api_secret, access_token, access_token_secret];
    if fields.iter().any(|field| field.trim().is_empty()) {
        return false;
    }

    if !strict {
        return true;
    }

    ALNUM.is_match(api_key)
        && ALNUM.is_match(api_secret)
        && ACCESS_TOKEN.is_match(access_token)
        && ALNUM.is_match(access_token_secret)
}

#[async_trait]
impl RemotePoster for XPoster {
    async fn post(&self, text: &str, credentials: &Credentials) -> PostOutcome {
        if !credentials_valid(credentials, self.config.strict_credentials) {
            tracing::error!("X API credentials missing or malformed");
            return PostOutcome::Failed(PostFailure::InvalidCredentials);
        }

        tokio::time::sleep(self.config.min_spacing).await;

        let outcome = self.send(text, credentials).await;
        match &outcome {
            PostOutcome::Success { id } => tracing::debug!(id = %id, "X API accepted post"),
            PostOutcome::RateLimited => tracing::warn!("X API rate limit reached"),
            PostOutcome::Failed(failure) => {
                tracing::error!(error = %failure, "X API post failed")
            }
        }
        outcome
    }

    fn platform(&self) -> &'static str {
        "x"
    }
}
