//! Configuration loading and management

use anyhow::{Context, Result, bail};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub reddit: RedditConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_seen_file")]
    pub seen_file: PathBuf,

    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,

    #[serde(default = "default_restart_delay")]
    pub restart_delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Account whose submissions are relayed
    #[serde(default)]
    pub author: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    #[serde(default = "default_max_posts")]
    pub max_posts_per_check: usize,

    #[serde(default = "default_delivery_pause")]
    pub delivery_pause_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditConfig {
    /// Post source implementation: "reddit" or "stub"
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_client_id_env")]
    pub client_id_env: String,

    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_bot_token_env")]
    pub bot_token_env: String,

    /// Destination chat identifier (e.g. "-1001234567890")
    #[serde(default)]
    pub chat_id: String,
}

// Default value functions
fn default_seen_file() -> PathBuf {
    PathBuf::from("./data/processed_posts.txt")
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_consecutive_failures() -> u32 {
    5
}

fn default_restart_delay() -> u64 {
    60
}

fn default_poll_interval() -> u64 {
    300
}

fn default_max_posts() -> usize {
    10
}

fn default_delivery_pause() -> u64 {
    1
}

fn default_provider() -> String {
    "reddit".to_string()
}

fn default_client_id_env() -> String {
    "REDDIT_CLIENT_ID".to_string()
}

fn default_client_secret_env() -> String {
    "REDDIT_CLIENT_SECRET".to_string()
}

fn default_user_agent() -> String {
    "image-relay".to_string()
}

fn default_bot_token_env() -> String {
    "TELEGRAM_BOT_TOKEN".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            seen_file: default_seen_file(),
            work_dir: default_work_dir(),
            log_level: default_log_level(),
            dry_run: false,
            max_consecutive_failures: default_max_consecutive_failures(),
            restart_delay_secs: default_restart_delay(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            author: String::new(),
            poll_interval_secs: default_poll_interval(),
            max_posts_per_check: default_max_posts(),
            delivery_pause_secs: default_delivery_pause(),
        }
    }
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            client_id_env: default_client_id_env(),
            client_secret_env: default_client_secret_env(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token_env: default_bot_token_env(),
            chat_id: String::new(),
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
            config::Environment::with_prefix("IMAGE_RELAY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# image-relay configuration

[general]
seen_file = "./data/processed_posts.txt"
# work_dir = "/tmp"
log_level = "info"
dry_run = false
max_consecutive_failures = 5
restart_delay_secs = 60

[watch]
author = "watched_account"
poll_interval_secs = 300
max_posts_per_check = 10
delivery_pause_secs = 1

[reddit]
provider = "reddit"  # reddit, stub
client_id_env = "REDDIT_CLIENT_ID"
client_secret_env = "REDDIT_CLIENT_SECRET"
user_agent = "image-relay"

[telegram]
bot_token_env = "TELEGRAM_BOT_TOKEN"
chat_id = "-1001234567890"
"#
        .to_string()
    }
}

/// Read a required secret from the environment
pub fn load_secret_env(env_name: &str, component: &str) -> Result<SecretString> {
    let value = std::env::var(env_name)
        .with_context(|| format!("Missing environment variable {} ({})", env_name, component))?;

    if value.trim().is_empty() {
        bail!("Environment variable {} ({}) is empty", env_name, component);
    }

    Ok(SecretString::new(value.into()))
}
