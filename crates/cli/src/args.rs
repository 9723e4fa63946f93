//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// x-autopost: mirror content publish and update events to X
#[derive(Parser, Debug)]
#[command(name = "x-autopost")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Handle a single status transition event (JSON)
    Handle(HandleArgs),

    /// Handle transition events from stdin, one JSON object per line
    Listen(ListenArgs),

    /// Manage per-item custom hashtags
    Hashtags(HashtagsArgs),

    /// Send a timestamped test post with the configured credentials
    TestPost,

    /// Show or clear the stored rate-limit notice
    Notice(NoticeArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct HandleArgs {
    /// File containing the event (use - for stdin, the default)
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Compose and log the post without sending it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Compose and log posts without sending them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct HashtagsArgs {
    #[command(subcommand)]
    pub command: HashtagsCommands,
}

#[derive(Subcommand, Debug)]
pub enum HashtagsCommands {
    /// Save custom hashtags for an item (comma-separated)
    Set {
        /// Content item id
        item_id: u64,

        /// Hashtags, e.g. "rust, tokio"
        tags: String,
    },

    /// Show the stored custom hashtags for an item
    Show {
        /// Content item id
        item_id: u64,
    },

    /// Print the hashtag suffix a new post for the event would carry
    Preview {
        /// File containing the event (use - for stdin, the default)
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
pub struct NoticeArgs {
    #[command(subcommand)]
    pub command: NoticeCommands,
}

#[derive(Subcommand, Debug)]
pub enum NoticeCommands {
    /// Print the pending rate-limit notice, if any
    Show {
        /// Clear the notice after printing it
        #[arg(long)]
        clear: bool,
    },

    /// Clear the pending rate-limit notice
    Clear,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./config.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
