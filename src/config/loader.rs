use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::types::Config;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

impl Config {
    /// Returns the path to the configuration file.
    ///
    /// Uses `~/.config/shellstream/config.toml` on Unix/macOS,
    /// or equivalent on other platforms via `dirs::config_dir()`.
    /// Falls back to current directory if config_dir is unavailable.
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("shellstream").join("config.toml")
    }

    /// Loads configuration from the default config file.
    ///
    /// A missing file yields `Config::default()`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Config::default());
        }
        Self::load_from(&path)
    }

    /// Loads and validates configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// Checks:
    /// - The terminal address is not empty
    /// - Command and stream timeouts are non-zero
    /// - The agent base URL is an HTTP(S) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.terminal.address.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "terminal.address must not be empty".to_string(),
            });
        }

        if self.terminal.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "terminal.timeout_seconds must be greater than zero".to_string(),
            });
        }

        if self.agent.idle_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError {
                message: "agent.idle_timeout_seconds must be greater than zero".to_string(),
            });
        }

        let base_url = self.agent.base_url.to_ascii_lowercase();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "agent.base_url '{}' must start with http:// or https://",
                    self.agent.base_url
                ),
            });
        }

        Ok(())
    }
}
