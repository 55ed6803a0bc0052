//! # Configuration
//!
//! petsim reads a single TOML file (default `petsim.toml`). Every section and
//! every key is optional; anything left out falls back to the values in
//! [`Config::default()`], which reproduce the canonical game balance.
//!
//! ## Sections
//!
//! - [`ServerConfig`] - TCP bind address and request size limit
//! - [`StorageConfig`] - backend choice and data directory
//! - [`Rules`] - per-action deltas, decay rates, leveling and achievement thresholds
//! - [`DayCycle`] - local hours that count as night
//! - [`LeaderboardConfig`] - default and maximum leaderboard sizes
//! - [`LoggingConfig`] - log level and optional log file
//!
//! ## Example
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:7878"
//!
//! [storage]
//! backend = "sled"
//! data_dir = "./data"
//!
//! [rules]
//! sleep_cooldown_secs = 5
//! decay = { hunger = 0.1, happiness = 0.05, energy = 0.07 }
//!
//! [day_cycle]
//! night_start_hour = 20
//! night_end_hour = 6
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::pet::{DayCycle, Rules};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// Longest accepted request line. Longer lines get a `bad_request` and the
    /// connection is closed.
    pub max_line_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:7878".to_string(),
            max_line_bytes: 4096,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Sled,
            data_dir: "./data".to_string(),
        }
    }
}

impl StorageConfig {
    /// Directory the sled database lives in.
    pub fn pets_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join("pets")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Parsed level; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub rules: Rules,
    pub day_cycle: DayCycle,
    pub leaderboard: LeaderboardConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load and validate a configuration file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config = Self::from_toml(&content)
            .map_err(|e| anyhow!("Failed to load config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.bind.trim().is_empty() {
            return Err(anyhow!("server.bind must not be empty"));
        }
        if self.server.max_line_bytes < 64 {
            return Err(anyhow!("server.max_line_bytes must be at least 64"));
        }
        if self.storage.backend == StorageBackend::Sled && self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir is required for the sled backend"));
        }
        if self.leaderboard.max_limit == 0 {
            return Err(anyhow!("leaderboard.max_limit must be greater than zero"));
        }
        if self.leaderboard.default_limit == 0
            || self.leaderboard.default_limit > self.leaderboard.max_limit
        {
            return Err(anyhow!(
                "leaderboard.default_limit must be between 1 and max_limit ({})",
                self.leaderboard.max_limit
            ));
        }
        self.rules.validate().map_err(|e| anyhow!(e))?;
        self.day_cycle.validate().map_err(|e| anyhow!(e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:7878");
        assert_eq!(config.storage.backend, StorageBackend::Sled);
        assert_eq!(config.rules, Rules::default());
        assert_eq!(config.day_cycle, DayCycle::default());
        assert_eq!(config.leaderboard.default_limit, 10);
    }

    #[test]
    fn test_partial_sections_override() {
        let config = Config::from_toml(
            r#"
            [storage]
            backend = "memory"

            [rules]
            sleep_cooldown_secs = 30

            [day_cycle]
            enabled = false

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.storage.data_dir, "./data");
        assert_eq!(config.rules.sleep_cooldown_secs, 30);
        assert_eq!(config.rules.exp_per_level, 50);
        assert!(!config.day_cycle.enabled);
        assert_eq!(config.logging.level_filter(), log::LevelFilter::Debug);
    }

    #[test]
    fn test_validation_rejects_nonsense() {
        assert!(Config::from_toml("[rules]\nexp_per_level = 0\n").is_err());
        assert!(Config::from_toml("[rules]\nplayful_plays = 0\n").is_err());
        assert!(Config::from_toml("[day_cycle]\nnight_start_hour = 24\n").is_err());
        assert!(Config::from_toml("[leaderboard]\ndefault_limit = 500\n").is_err());
        assert!(Config::from_toml("[rules.decay]\nhunger = -1.0\nhappiness = 0.05\nenergy = 0.07\n").is_err());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        let back = Config::from_toml(&text).unwrap();
        assert_eq!(back.rules, Rules::default());
        assert_eq!(back.server.max_line_bytes, 4096);
    }

    #[tokio::test]
    async fn test_create_default_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("petsim.toml");
        let path = path.to_str().unwrap();
        Config::create_default(path).await.unwrap();
        let config = Config::load(path).await.unwrap();
        assert_eq!(config.leaderboard.max_limit, 100);
    }
}
