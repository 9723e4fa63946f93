//! Builds the transition guard and its adapters from configuration

use anyhow::{Context, Result, bail};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use x_autopost_adapters::{
    locks::{InMemoryLockStore, SqliteLockStore},
    state::{InMemoryStateStore, SqliteStateStore},
    x::{ApiVersion, StubPoster, XPoster, XPosterConfig},
};
use x_autopost_domain::{
    LockStore, RemotePoster, StateStore, SystemClock, TransitionEvent,
    usecases::TransitionGuard,
};

use crate::config::AppConfig;

/// Guard wired with trait objects so every backend combination shares one type
pub type Guard = TransitionGuard<dyn StateStore, dyn LockStore, dyn RemotePoster, SystemClock>;

const IN_MEMORY_DB: &str = ":memory:";

/// State and lock stores sharing one backend
pub struct Stores {
    pub state: Arc<dyn StateStore>,
    pub locks: Arc<dyn LockStore>,
}

pub async fn open_stores(config: &AppConfig) -> Result<Stores> {
    let db_path = &config.general.state_db_path;

    if db_path.as_os_str() == IN_MEMORY_DB {
        tracing::debug!("Using in-memory state, nothing will persist");
        return Ok(Stores {
            state: Arc::new(InMemoryStateStore::new()),
            locks: Arc::new(InMemoryLockStore::new()),
        });
    }

    let state = SqliteStateStore::new(db_path)
        .await
        .with_context(|| format!("Failed to open state database: {}", db_path.display()))?;
    let locks = SqliteLockStore::new(state.pool())
        .await
        .context("Failed to initialize lock table")?;

    Ok(Stores {
        state: Arc::new(state),
        locks: Arc::new(locks),
    })
}

pub(crate) fn parse_api_version(value: &str) -> Result<ApiVersion> {
    match value.to_lowercase().as_str() {
        "v2" | "2" => Ok(ApiVersion::V2),
        "legacy" | "v1.1" | "1.1" => Ok(ApiVersion::Legacy),
        other => bail!("Unknown X API version: {} (expected v2 or legacy)", other),
    }
}

pub fn build_poster(config: &AppConfig) -> Result<Arc<dyn RemotePoster>> {
    let x = &config.x;

    match x.backend.as_str() {
        "api" => {
            let poster = XPoster::new(XPosterConfig {
                base_url: x.base_url.clone(),
                api_version: parse_api_version(&x.api_version)?,
                timeout: Duration::from_secs(x.timeout_secs),
                min_spacing: Duration::from_millis(x.min_spacing_ms),
                strict_credentials: x.strict_credentials,
            })
            .context("Failed to build X API client")?;
            Ok(Arc::new(poster))
        }
        "stub" => {
            tracing::info!("Using stub poster, nothing will reach X");
            Ok(Arc::new(StubPoster::new()))
        }
        other => bail!("Unknown X backend: {} (expected api or stub)", other),
    }
}

pub async fn build_guard(config: &AppConfig, dry_run: bool) -> Result<Guard> {
    let mut settings = config.settings(config.x.load_credentials())?;
    settings.dry_run |= dry_run;

    let stores = open_stores(config).await?;
    let poster = build_poster(config)?;

    tracing::debug!(
        backend = %config.x.backend,
        dry_run = settings.dry_run,
        content_type = %settings.tracked_content_type,
        "Transition guard ready"
    );

    Ok(TransitionGuard::new(
        stores.state,
        stores.locks,
        poster,
        Arc::new(SystemClock),
        settings,
    ))
}

/// Read an event from a file, or stdin when the path is absent or `-`
pub fn read_event(file: Option<&Path>) -> Result<TransitionEvent> {
    let raw = match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?,
        _ => {
            let mut raw = String::new();
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read from stdin")?;
            raw
        }
    };

    serde_json::from_str(&raw).context("Invalid transition event JSON")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_version() {
        assert_eq!(parse_api_version("v2").unwrap(), ApiVersion::V2);
        assert_eq!(parse_api_version("Legacy").unwrap(), ApiVersion::Legacy);
        assert_eq!(parse_api_version("1.1").unwrap(), ApiVersion::Legacy);
        assert!(parse_api_version("v3").is_err());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let mut config = AppConfig::default();
        config.x.backend = "carrier-pigeon".to_string();
        assert!(build_poster(&config).is_err());
    }

    #[tokio::test]
    async fn test_in_memory_guard_posts_once() {
        let mut config = AppConfig::default();
        config.general.state_db_path = IN_MEMORY_DB.into();
        config.general.settle_delay_ms = 0;
        config.x.backend = "stub".to_string();

        let guard = build_guard(&config, false).await.unwrap();
        let event: TransitionEvent = serde_json::from_value(serde_json::json!({
            "item": {
                "id": 3,
                "title": "Hello",
                "url": "https://example.com/hello",
                "published_at": "2026-01-01T00:00:00Z"
            },
            "previous_status": "draft",
            "new_status": "publish"
        }))
        .unwrap();

        assert!(matches!(
            guard.handle(&event).await,
            x_autopost_domain::TransitionOutcome::Posted { .. }
        ));
        assert!(matches!(
            guard.handle(&event).await,
            x_autopost_domain::TransitionOutcome::Skipped(_)
        ));
    }
}
