//! Configuration management for page-scribe

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Page model configuration
    #[serde(default)]
    pub page: PageConfig,

    /// Control panel configuration
    #[serde(default)]
    pub panel: PanelConfig,

    /// Recording configuration
    #[serde(default)]
    pub recording: RecordingConfig,

    /// Path to config file (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    /// URL the page model starts on before any navigation arrives
    #[serde(default = "default_initial_url")]
    pub initial_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanelConfig {
    /// Polling interval for the snippet count while recording (ms)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Whether stopping a session copies the buffered data to the clipboard
    #[serde(default = "default_true")]
    pub copy_on_stop: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Whether to start a recording session automatically on launch
    #[serde(default)]
    pub autostart_on_launch: bool,
}

// Default value functions
fn default_initial_url() -> String {
    "about:blank".to_string()
}

fn default_poll_interval() -> u64 {
    1000 // 1s, the badge only needs coarse updates
}

fn default_true() -> bool {
    true
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            initial_url: default_initial_url(),
        }
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
            copy_on_stop: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            panel: PanelConfig::default(),
            recording: RecordingConfig::default(),
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_config_path()?)
    }

    /// Load configuration from a specific path, creating it with defaults
    /// when missing
    pub fn load_from(config_path: PathBuf) -> Result<Self> {
        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            config.config_path = Some(config_path);
            Ok(config)
        } else {
            let mut config = Config::default();
            config.config_path = Some(config_path);
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self
            .config_path
            .clone()
            .unwrap_or_else(|| Self::default_config_path().expect("Failed to get config path"));

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the config file path
    pub fn config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| Self::default_config_path().expect("Failed to get config path"))
    }

    /// Get default config path
    fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("dev", "page-scribe", "agent")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.page.initial_url, "about:blank");
        assert_eq!(config.panel.poll_interval_ms, 1000);
        assert!(config.panel.copy_on_stop);
        assert!(!config.recording.autostart_on_launch);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [page]
            initial_url = "https://shop.example/"

            [panel]
            poll_interval_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.page.initial_url, "https://shop.example/");
        assert_eq!(config.panel.poll_interval_ms, 250);
        assert!(config.panel.copy_on_stop);
        assert!(!config.recording.autostart_on_launch);
    }

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::load_from(path.clone()).unwrap();
        assert!(path.exists());

        config.recording.autostart_on_launch = true;
        config.panel.poll_interval_ms = 250;
        config.save().unwrap();

        let reloaded = Config::load_from(path).unwrap();
        assert!(reloaded.recording.autostart_on_launch);
        assert_eq!(reloaded.panel.poll_interval_ms, 250);
    }
}
