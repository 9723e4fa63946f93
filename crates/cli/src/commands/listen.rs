//! Listen command - handle a stream of transition events from stdin

use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use x_autopost_domain::TransitionEvent;

use crate::args::ListenArgs;
use crate::commands::handle::outcome_json;
use crate::config::AppConfig;
use crate::wiring::build_guard;

pub async fn execute(args: ListenArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let guard = build_guard(&config, args.dry_run).await?;

    tracing::info!(dry_run = guard.settings().dry_run, "Listening for events on stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut handled = 0usize;

    // Set up graceful shutdown
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Shutdown signal received");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    tracing::info!(handled, "End of input");
                    break;
                };

                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let event: TransitionEvent = match serde_json::from_str(line) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping malformed event");
                        continue;
                    }
                };

                let outcome = guard.handle(&event).await;
                println!("{}", outcome_json(&event, &outcome));
                handled += 1;
            }
            _ = &mut shutdown => {
                tracing::info!(handled, "Shutting down gracefully");
                break;
            }
        }
    }

    Ok(())
}
