//! Notice command - show or dismiss the rate-limit notice

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::args::{NoticeArgs, NoticeCommands};
use crate::config::AppConfig;
use crate::wiring::open_stores;

pub async fn execute(args: NoticeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let stores = open_stores(&config).await?;

    let notice = match args.command {
        NoticeCommands::Show { clear: false } => stores.state.rate_limit_notice().await,
        NoticeCommands::Show { clear: true } => stores.state.take_rate_limit_notice().await,
        NoticeCommands::Clear => {
            stores
                .state
                .take_rate_limit_notice()
                .await
                .context("Failed to clear notice")?;
            println!("Notice cleared");
            return Ok(());
        }
    }
    .context("Failed to read notice")?;

    match notice {
        Some(message) => println!("{}", message),
        None => println!("No pending notice"),
    }

    Ok(())
}
