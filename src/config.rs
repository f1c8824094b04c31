//! User configuration for ttodo
//!
//! Configuration is stored in `<data dir>/config.toml`. Every field has a
//! default, so a missing file or a partial file is fine.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Terminal UI behaviour
    #[serde(default)]
    pub ui: UiConfig,

    /// Background archive sweep
    #[serde(default)]
    pub archive: ArchiveConfig,

    /// Deleted-task undo stack
    #[serde(default)]
    pub undo: UndoConfig,

    /// Log output
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UiConfig {
    /// Number of commands kept in the input history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Event poll interval in milliseconds
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

fn default_history_limit() -> usize {
    50
}

fn default_tick_ms() -> u64 {
    250
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            tick_ms: default_tick_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArchiveConfig {
    /// Run the periodic sweep while the TUI is open
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Completed tasks older than this many hours are archived
    #[serde(default = "default_after_hours")]
    pub after_hours: u64,

    /// Minutes between sweeps
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,

    /// How long shutdown waits for a running sweep
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

fn default_true() -> bool {
    true
}

fn default_after_hours() -> u64 {
    24
}

fn default_interval_minutes() -> u64 {
    60
}

fn default_shutdown_timeout_ms() -> u64 {
    1000
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            after_hours: default_after_hours(),
            interval_minutes: default_interval_minutes(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl ArchiveConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1) * 60)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::hours(self.after_hours as i64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UndoConfig {
    /// Deleted tasks kept for `undo`
    #[serde(default = "default_undo_limit")]
    pub limit: usize,
}

fn default_undo_limit() -> usize {
    crate::store::DEFAULT_UNDO_LIMIT
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            limit: default_undo_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// tracing filter directive, overridden by RUST_LOG
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Config {
    /// Default data directory: `<platform data dir>/ttodo`
    pub fn default_dir() -> anyhow::Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Ok(data_dir.join("ttodo"))
    }

    /// Load configuration from `<dir>/config.toml`
    /// Returns default config if file doesn't exist
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let config_path = dir.join(CONFIG_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("Failed to read config: {}", e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;

        Ok(config)
    }

    /// Save configuration to `<dir>/config.toml`
    pub fn save(&self, dir: &Path) -> anyhow::Result<()> {
        fs::create_dir_all(dir)
            .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;
        let config_path = dir.join(CONFIG_FILE);

        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

        fs::write(&config_path, content)
            .map_err(|e| anyhow::anyhow!("Failed to write config: {}", e))?;

        Ok(())
    }

    /// Initialize default config file if it doesn't exist
    pub fn init(dir: &Path) -> anyhow::Result<bool> {
        let config_path = dir.join(CONFIG_FILE);

        if config_path.exists() {
            return Ok(false);
        }

        let config = Self::default();
        config.save(dir)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.ui.history_limit, 50);
        assert_eq!(config.undo.limit, 20);
        assert_eq!(config.archive.after_hours, 24);
        assert_eq!(config.archive.interval(), Duration::from_secs(3600));
        assert_eq!(config.archive.shutdown_timeout(), Duration::from_secs(1));
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(temp_dir.path()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE),
            "[archive]\nafter_hours = 48\n",
        )
        .unwrap();
        let config = Config::load(temp_dir.path()).unwrap();
        assert_eq!(config.archive.after_hours, 48);
        assert!(config.archive.enabled);
        assert_eq!(config.archive.interval_minutes, 60);
        assert_eq!(config.ui, UiConfig::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();

        let mut config = Config::default();
        config.ui.history_limit = 10;
        config.archive.enabled = false;
        config.save(temp_dir.path()).unwrap();

        let loaded = Config::load(temp_dir.path()).unwrap();
        assert_eq!(loaded.ui.history_limit, 10);
        assert!(!loaded.archive.enabled);
    }

    #[test]
    fn test_init_config() {
        let temp_dir = TempDir::new().unwrap();

        let created = Config::init(temp_dir.path()).unwrap();
        assert!(created);

        let created = Config::init(temp_dir.path()).unwrap();
        assert!(!created);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(CONFIG_FILE), "[ui\nhistory_limit = ").unwrap();
        assert!(Config::load(temp_dir.path()).is_err());
    }
}
