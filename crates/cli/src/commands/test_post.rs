//! Test-post command - verify credentials with a live post

use anyhow::{Result, bail};
use std::path::PathBuf;
use x_autopost_domain::{PostOutcome, usecases::RATE_LIMIT_NOTICE};

use crate::config::AppConfig;
use crate::wiring::build_guard;

pub async fn execute(config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let guard = build_guard(&config, false).await?;

    match guard.send_test_post().await {
        PostOutcome::Success { id } => {
            println!("Test post created (id {})", id);
            Ok(())
        }
        PostOutcome::RateLimited => bail!("{}", RATE_LIMIT_NOTICE),
        PostOutcome::Failed(failure) => bail!("Test post failed: {}", failure),
    }
}
