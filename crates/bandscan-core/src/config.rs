use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::node::SourceId;
use crate::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Total request timeout. Conservative bound; navigation blocks on it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub tunein: TuneInConfig,
    #[serde(default)]
    pub somafm: SomaFmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneInConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_tunein_base_url")]
    pub base_url: String,
    /// Cached listings older than this are refetched before being served.
    #[serde(default = "default_stale_hours")]
    pub stale_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SomaFmConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_somafm_base_url")]
    pub base_url: String,
    #[serde(default = "default_stale_hours")]
    pub stale_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// External player command. Receives one stream URL as its argument.
    #[serde(default = "default_player_command")]
    pub command: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for TuneInConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_tunein_base_url(),
            stale_hours: default_stale_hours(),
        }
    }
}

impl Default for SomaFmConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_somafm_base_url(),
            stale_hours: default_stale_hours(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            command: default_player_command(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    4
}

fn default_user_agent() -> String {
    format!("bandscan/{}", env!("CARGO_PKG_VERSION"))
}

fn default_enabled() -> bool {
    true
}

fn default_stale_hours() -> u64 {
    12
}

fn default_tunein_base_url() -> String {
    "https://opml.radiotime.com/".to_string()
}

fn default_somafm_base_url() -> String {
    "https://somafm.com/".to_string()
}

fn default_player_command() -> String {
    "mpv".to_string()
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Staleness window per source, for the cache constructor.
    pub fn stale_windows(&self) -> std::collections::HashMap<SourceId, chrono::Duration> {
        let mut windows = std::collections::HashMap::new();
        windows.insert(
            SourceId::TuneIn,
            chrono::Duration::hours(self.sources.tunein.stale_hours as i64),
        );
        windows.insert(
            SourceId::SomaFm,
            chrono::Duration::hours(self.sources.somafm.stale_hours as i64),
        );
        windows
    }
}
