use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The public Pépito cat-door event stream.
pub const DEFAULT_STREAM_URL: &str = "https://api.thecatdoor.com/sse/v1/events";
/// Seconds to wait before reconnecting after any stream failure.
pub const DEFAULT_RETRY_SECS: u64 = 5;

/// Top-level config (pepito.toml + PEPITO_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PepitoConfig {
    pub discord: DiscordConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for PepitoConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig {
                bot_token: String::new(),
                developer_guild_id: None,
            },
            stream: StreamConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub bot_token: String,
    /// Guild allowed to run `/announce`. Unset disables the command.
    #[serde(default)]
    pub developer_guild_id: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_url")]
    pub url: String,
    #[serde(default = "default_retry_secs")]
    pub retry_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            url: default_stream_url(),
            retry_secs: default_retry_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_channels_path")]
    pub channels_path: String,
    #[serde(default = "default_reminder_log_path")]
    pub reminder_log_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            channels_path: default_channels_path(),
            reminder_log_path: default_reminder_log_path(),
        }
    }
}

fn default_stream_url() -> String {
    DEFAULT_STREAM_URL.to_string()
}
fn default_retry_secs() -> u64 {
    DEFAULT_RETRY_SECS
}
fn default_channels_path() -> String {
    "channels.json".to_string()
}
fn default_reminder_log_path() -> String {
    "reminder_log.json".to_string()
}

impl PepitoConfig {
    /// Load config from a TOML file with PEPITO_* env var overrides.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let path = config_path.unwrap_or("pepito.toml");

        let config: PepitoConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("PEPITO_").split("_"))
            .extract()
            .map_err(|e| ConfigError::Load(e.to_string()))?;

        Ok(config)
    }
}
