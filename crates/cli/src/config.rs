//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use x_autopost_domain::{AutoPostSettings, Credentials, HashtagSettings};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub x: XConfig,

    #[serde(default)]
    pub update: UpdateConfig,

    #[serde(default)]
    pub hashtags: HashtagsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// SQLite database path, or ":memory:" for process-local state
    #[serde(default = "default_state_db_path")]
    pub state_db_path: PathBuf,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_content_type")]
    pub content_type: String,

    #[serde(default = "default_lock_ttl")]
    pub lock_ttl_secs: u64,

    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XConfig {
    #[serde(default = "default_x_backend")]
    pub backend: String,

    #[serde(default = "default_x_api_version")]
    pub api_version: String,

    #[serde(default = "default_x_base_url")]
    pub base_url: String,

    #[serde(default = "default_x_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_x_min_spacing")]
    pub min_spacing_ms: u64,

    #[serde(default)]
    pub strict_credentials: bool,

    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_api_secret_env")]
    pub api_secret_env: String,

    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,

    #[serde(default = "default_access_token_secret_env")]
    pub access_token_secret_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_update_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_update_template")]
    pub template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashtagsConfig {
    /// Comma-separated default hashtags
    #[serde(default)]
    pub defaults: String,

    #[serde(default = "default_true")]
    pub use_taxonomy: bool,

    #[serde(default = "default_max_hashtags")]
    pub max: usize,
}

// Default value functions
fn default_state_db_path() -> PathBuf {
    PathBuf::from("./x-autopost.sqlite")
}

fn default_content_type() -> String {
    "post".to_string()
}

fn default_lock_ttl() -> u64 {
    60
}

fn default_settle_delay() -> u64 {
    500
}

fn default_x_backend() -> String {
    "api".to_string()
}

fn default_x_api_version() -> String {
    "v2".to_string()
}

fn default_x_base_url() -> String {
    x_autopost_adapters::x::DEFAULT_BASE_URL.to_string()
}

fn default_x_timeout() -> u64 {
    10
}

fn default_x_min_spacing() -> u64 {
    1000
}

fn default_api_key_env() -> String {
    "X_API_KEY".to_string()
}

fn default_api_secret_env() -> String {
    "X_API_SECRET".to_string()
}

fn default_access_token_env() -> String {
    "X_ACCESS_TOKEN".to_string()
}

fn default_access_token_secret_env() -> String {
    "X_ACCESS_TOKEN_SECRET".to_string()
}

fn default_true() -> bool {
    true
}

fn default_update_interval() -> u64 {
    3600
}

fn default_update_template() -> String {
    x_autopost_domain::settings::DEFAULT_UPDATE_TEMPLATE.to_string()
}

fn default_max_hashtags() -> usize {
    3
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            state_db_path: default_state_db_path(),
            dry_run: false,
            content_type: default_content_type(),
            lock_ttl_secs: default_lock_ttl(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

impl Default for XConfig {
    fn default() -> Self {
        Self {
            backend: default_x_backend(),
            api_version: default_x_api_version(),
            base_url: default_x_base_url(),
            timeout_secs: default_x_timeout(),
            min_spacing_ms: default_x_min_spacing(),
            strict_credentials: false,
            api_key_env: default_api_key_env(),
            api_secret_env: default_api_secret_env(),
            access_token_env: default_access_token_env(),
            access_token_secret_env: default_access_token_secret_env(),
        }
    }
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: default_update_interval(),
            template: default_update_template(),
        }
    }
}

impl Default for HashtagsConfig {
    fn default() -> Self {
        Self {
            defaults: String::new(),
            use_taxonomy: true,
            max: default_max_hashtags(),
        }
    }
}

impl XConfig {
    /// (setting name, env var name) for each credential
    pub fn credential_envs(&self) -> [(&'static str, &str); 4] {
        [
            ("api_key", self.api_key_env.as_str()),
            ("api_secret", self.api_secret_env.as_str()),
            ("access_token", self.access_token_env.as_str()),
            ("access_token_secret", self.access_token_secret_env.as_str()),
        ]
    }

    /// Read credentials from the configured env vars; unset vars stay empty
    pub fn load_credentials(&self) -> Credentials {
        let [api_key, api_secret, access_token, access_token_secret] =
            self.credential_envs().map(|(name, env_var)| {
                let value = std::env::var(env_var).unwrap_or_default();
                if value.trim().is_empty() {
                    tracing::warn!(credential = name, env_var = %env_var, "Credential env var not set");
                }
                value
            });

        Credentials::new(api_key, api_secret, access_token, access_token_secret)
    }
}

impl HashtagsConfig {
    pub fn settings(&self) -> HashtagSettings {
        HashtagSettings {
            default_hashtags: self.defaults.clone(),
            use_taxonomy: self.use_taxonomy,
            max_hashtags: self.max,
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./config.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("X_AUTOPOST")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Build the validated settings snapshot handed to the transition guard
    pub fn settings(&self, credentials: Credentials) -> Result<AutoPostSettings> {
        let settings = AutoPostSettings {
            tracked_content_type: self.general.content_type.clone(),
            credentials,
            update_posting_enabled: self.update.enabled,
            update_interval: Duration::from_secs(self.update.interval_secs),
            update_template: self.update.template.clone(),
            hashtags: self.hashtags.settings(),
            lock_ttl: Duration::from_secs(self.general.lock_ttl_secs),
            settle_delay: Duration::from_millis(self.general.settle_delay_ms),
            dry_run: self.general.dry_run,
            ..Default::default()
        };

        settings.validate().context("Invalid configuration")?;
        Ok(settings)
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# x-autopost configuration

[general]
# SQLite database for post records, notices and locks (":memory:" = no persistence)
state_db_path = "./x-autopost.sqlite"
dry_run = false
# Only items of this content type are mirrored
content_type = "post"
lock_ttl_secs = 60
settle_delay_ms = 500

[x]
backend = "api"  # api, stub
api_version = "v2"  # v2, legacy
base_url = "https://api.twitter.com"
timeout_secs = 10
min_spacing_ms = 1000
strict_credentials = false
# Names of the environment variables holding the OAuth 1.0a credentials
api_key_env = "X_API_KEY"
api_secret_env = "X_API_SECRET"
access_token_env = "X_ACCESS_TOKEN"
access_token_secret_env = "X_ACCESS_TOKEN_SECRET"

[update]
enabled = true
interval_secs = 3600  # 1800, 3600, 7200, 21600, 86400
template = "Updated: {title} {url}"

[hashtags]
defaults = ""  # e.g. "blog,tech"
use_taxonomy = true
max = 3  # 0-5
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_matches_defaults() {
        let parsed: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(parsed.general.state_db_path, defaults.general.state_db_path);
        assert_eq!(parsed.x.backend, defaults.x.backend);
        assert_eq!(parsed.x.api_key_env, defaults.x.api_key_env);
        assert_eq!(parsed.update.interval_secs, defaults.update.interval_secs);
        assert_eq!(parsed.update.template, defaults.update.template);
        assert_eq!(parsed.hashtags.max, defaults.hashtags.max);
    }

    #[test]
    fn test_default_settings_are_valid() {
        let settings = AppConfig::default()
            .settings(Credentials::empty())
            .unwrap();

        assert_eq!(settings.update_interval, Duration::from_secs(3600));
        assert_eq!(settings.hashtags.max_hashtags, 3);
        assert!(settings.hashtags.use_taxonomy);
        assert_eq!(settings.tracked_content_type, "post");
    }

    #[test]
    fn test_invalid_interval_rejected() {
        let mut config = AppConfig::default();
        config.update.interval_secs = 42;

        assert!(config.settings(Credentials::empty()).is_err());
    }
}
