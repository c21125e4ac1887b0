//! User configuration settings
//!
//! Layered configuration: defaults → config file → environment variables

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Error, Result};
use crate::session::{ChannelId, DEFAULT_MAX_BUFFER, DEFAULT_MIN_PANE_WIDTH};
use crate::source::{DEFAULT_QUEUE_CAPACITY, DEFAULT_SERVER};
use crate::tui::ColorMode;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Channels joined at startup, in pane order
    pub channels: Vec<String>,

    /// Messages kept per channel
    pub max_buffer: usize,

    /// Narrowest a pane may get before fewer panes are shown
    pub min_pane_width: u16,

    /// Capacity of the queue between the network reader and the UI
    pub queue_capacity: usize,

    /// UI refresh rate in FPS
    pub ui_refresh_fps: u32,

    /// Chat server address (host:port)
    pub server: String,

    /// Twitch login name (anonymous read-only access when unset)
    pub username: Option<String>,

    /// Twitch OAuth token, with or without the `oauth:` prefix
    pub oauth_token: Option<String>,

    /// Timeout for connecting and for each write, in milliseconds
    pub connect_timeout_ms: u64,

    /// Upper bound on waiting for a clean disconnect, in milliseconds
    pub shutdown_timeout_ms: u64,

    /// Color depth override (detected from the terminal when unset)
    pub color_mode: Option<ColorMode>,

    /// Enable debug logging
    pub debug: bool,

    /// Log file path used while the TUI is running
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            max_buffer: DEFAULT_MAX_BUFFER,
            min_pane_width: DEFAULT_MIN_PANE_WIDTH,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            ui_refresh_fps: 30,
            server: DEFAULT_SERVER.to_string(),
            username: None,
            oauth_token: None,
            connect_timeout_ms: 10_000,
            shutdown_timeout_ms: 2_000,
            color_mode: None,
            debug: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from all sources
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Load configuration using a specific config file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config: Config = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Layer config file if it exists
            .merge(Toml::file(config_path))
            // Layer environment variables (CHATLURK_MAX_BUFFER, etc.)
            .merge(Env::prefixed("CHATLURK_"))
            .extract()
            .map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot work with
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, reason: &str| -> Result<()> {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                reason: reason.to_string(),
            }
            .into())
        };

        if self.max_buffer == 0 {
            return invalid("max_buffer", "must be at least 1");
        }
        if self.min_pane_width == 0 {
            return invalid("min_pane_width", "must be at least 1");
        }
        if self.queue_capacity == 0 {
            return invalid("queue_capacity", "must be at least 1");
        }
        if self.ui_refresh_fps == 0 {
            return invalid("ui_refresh_fps", "must be at least 1");
        }
        if let Some(bad) = self.channels.iter().find(|c| !ChannelId::new(c).is_valid()) {
            return invalid("channels", &format!("'{}' is not a channel name", bad));
        }
        Ok(())
    }

    /// Replace the persisted channel list
    pub fn set_channels(&mut self, channels: Vec<String>) {
        self.channels = channels;
    }

    /// Get the configuration file path
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let dirs = Self::project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Log file used in TUI mode
    pub fn log_file_path(&self) -> Result<PathBuf> {
        match &self.log_file {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("chatlurk.log")),
        }
    }

    /// Ensure all required directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        let dirs = Self::project_dirs()?;

        for dir in [dirs.config_dir(), dirs.data_dir()] {
            std::fs::create_dir_all(dir).map_err(|_e| {
                Error::Config(ConfigError::DirectoryCreationFailed(dir.to_path_buf()))
            })?;
        }

        Ok(())
    }

    /// Save current configuration to a specific file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|_e| {
                Error::Config(ConfigError::DirectoryCreationFailed(parent.to_path_buf()))
            })?;
        }

        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        std::fs::write(config_path, toml).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    /// Write only the channel list back to the default file
    pub fn save_channels(channels: &[String]) -> Result<()> {
        Self::save_channels_to(&Self::config_file_path()?, channels)
    }

    /// Write only the channel list back to a specific file
    ///
    /// Every other key in the file keeps its value, so values that came
    /// from the environment never reach disk. A file that does not parse is
    /// left untouched.
    pub fn save_channels_to(config_path: &Path, channels: &[String]) -> Result<()> {
        let mut table = match std::fs::read_to_string(config_path) {
            Ok(contents) => contents.parse::<toml::Table>().map_err(|e| {
                ConfigError::SaveFailed(format!(
                    "refusing to overwrite {}: {}",
                    config_path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
            Err(e) => return Err(ConfigError::SaveFailed(e.to_string()).into()),
        };

        let list = channels
            .iter()
            .map(|c| toml::Value::String(c.clone()))
            .collect();
        table.insert("channels".to_string(), toml::Value::Array(list));

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|_e| {
                Error::Config(ConfigError::DirectoryCreationFailed(parent.to_path_buf()))
            })?;
        }

        let toml = toml::to_string_pretty(&table)
            .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        std::fs::write(config_path, toml).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        Ok(())
    }

    /// Connect/write timeout as a duration
    pub fn connect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.connect_timeout_ms)
    }

    /// Shutdown wait as a duration
    pub fn shutdown_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.shutdown_timeout_ms)
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("com", "chatlurk", "chatlurk").ok_or_else(|| {
            Error::Config(ConfigError::LoadFailed(
                "Could not determine home directory".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.channels.is_empty());
        assert_eq!(config.max_buffer, 500);
        assert_eq!(config.min_pane_width, 40);
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.server, "irc.chat.twitch.tv:6667");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("max_buffer"));
        assert!(toml.contains("min_pane_width"));
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let config = Config {
            min_pane_width: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::Config(ConfigError::InvalidValue { ref key, .. })) if key == "min_pane_width"
        ));

        let config = Config {
            channels: vec!["#".to_string()],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set_channels(vec!["foo".to_string(), "bar".to_string()]);
        config.max_buffer = 42;
        config.color_mode = Some(ColorMode::Basic);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.channels, vec!["foo", "bar"]);
        assert_eq!(loaded.max_buffer, 42);
        assert_eq!(loaded.color_mode, Some(ColorMode::Basic));
    }

    #[test]
    fn test_channel_write_back_keeps_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            "# tuned by hand\nchannels = [\"foo\"]\nmax_buffer = 42\nusername = \"lurker\"\n",
        )
        .unwrap();

        Config::save_channels_to(&path, &["foo".to_string(), "bar".to_string()]).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.channels, vec!["foo", "bar"]);
        assert_eq!(loaded.max_buffer, 42);
        assert_eq!(loaded.username.as_deref(), Some("lurker"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("oauth_token"));
        assert!(!written.contains("server"));
    }

    #[test]
    fn test_channel_write_back_skips_merged_values() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "channels = [\"foo\"]\n").unwrap();

        // A token that only lives in memory, as an environment override would
        let mut config = Config::load_from(&path).unwrap();
        config.oauth_token = Some("supersecret".to_string());
        config.set_channels(vec!["foo".to_string(), "baz".to_string()]);
        Config::save_channels_to(&path, &config.channels).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("baz"));
        assert!(!written.contains("supersecret"));
    }

    #[test]
    fn test_channel_write_back_refuses_unparsable_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "channels = [\"foo\"\nnot toml at all").unwrap();

        let result = Config::save_channels_to(&path, &["bar".to_string()]);
        assert!(matches!(result, Err(Error::Config(ConfigError::SaveFailed(_)))));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "channels = [\"foo\"\nnot toml at all"
        );
    }

    #[test]
    fn test_channel_write_back_creates_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        Config::save_channels_to(&path, &["foo".to_string()]).unwrap();

        let written: toml::Table = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(Config::load_from(&path).unwrap().channels, vec!["foo"]);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Config::load_from(&temp_dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded.max_buffer, 500);
    }
}
