//! Hashtags command - per-item custom hashtags

use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use x_autopost_domain::usecases::{HashtagComposer, sanitize_hashtag_field};

use crate::args::{HashtagsArgs, HashtagsCommands};
use crate::config::AppConfig;
use crate::wiring::{build_guard, open_stores, read_event};

pub async fn execute(args: HashtagsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    match args.command {
        HashtagsCommands::Set { item_id, tags } => set_hashtags(&config, item_id, &tags).await,
        HashtagsCommands::Show { item_id } => show_hashtags(&config, item_id).await,
        HashtagsCommands::Preview { file } => preview_hashtags(&config, file).await,
    }
}

async fn set_hashtags(config: &AppConfig, item_id: u64, tags: &str) -> Result<()> {
    let guard = build_guard(config, false).await?;

    let saved = guard
        .save_custom_hashtags(item_id, tags)
        .await
        .context("Failed to save hashtags")?;

    if !saved {
        bail!("Item {} is being processed, try again shortly", item_id);
    }

    println!("Saved hashtags for item {}: {}", item_id, sanitize_hashtag_field(tags));
    Ok(())
}

async fn show_hashtags(config: &AppConfig, item_id: u64) -> Result<()> {
    let stores = open_stores(config).await?;
    let record = stores
        .state
        .get_post_record(item_id)
        .await
        .context("Failed to read post record")?;

    match record.custom_hashtags {
        Some(tags) if !tags.is_empty() => println!("{}", tags),
        _ => println!("No custom hashtags for item {}", item_id),
    }

    Ok(())
}

async fn preview_hashtags(config: &AppConfig, file: Option<PathBuf>) -> Result<()> {
    let event = read_event(file.as_deref())?;
    let stores = open_stores(config).await?;

    let mut record = stores
        .state
        .get_post_record(event.item.id)
        .await
        .context("Failed to read post record")?;

    if let Some(raw) = event.submitted_hashtags.as_deref() {
        record.custom_hashtags = Some(sanitize_hashtag_field(raw));
    }

    let composer = HashtagComposer::new(config.hashtags.settings());
    println!("{}", composer.compose(&event.item, &record));

    Ok(())
}
