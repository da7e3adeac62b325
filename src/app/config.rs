//! Configuration for the line editor

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::raw::DEFAULT_QUEUE_CAPACITY;

/// Message shown after a rejected or unconvertible line
pub const DEFAULT_FAILURE_MESSAGE: &str = "Invalid input, try again.";

/// Which keystroke channel to open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Poll when the tty supports it, threaded otherwise
    #[default]
    Auto,
    /// `poll(2)` plus non-blocking reads
    Poll,
    /// Background reader thread feeding a bounded queue
    Threaded,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Backend::Auto),
            "poll" => Ok(Backend::Poll),
            "threaded" => Ok(Backend::Threaded),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

/// Line editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Default mask character; `None` echoes the real text
    pub mask: Option<char>,
    /// Shown once after each failed validation or conversion
    pub failure_message: String,
    /// How long a lone ESC waits for the rest of an escape sequence
    pub escape_timeout_ms: u64,
    /// How long the session parks when no input is ready
    pub idle_wait_ms: u64,
    /// Capacity of the threaded backend's queue
    pub queue_capacity: usize,
    /// Channel backend
    pub backend: Backend,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            mask: None,
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
            escape_timeout_ms: 30,
            idle_wait_ms: 20,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            backend: Backend::Auto,
        }
    }
}

impl EditorConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EditorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from default location or return default config
    pub fn load_or_default() -> Self {
        // ~/.config/typed-prompt/config.json
        if let Some(config_path) = default_config_path() {
            if config_path.exists() {
                match Self::load(&config_path) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!(path = %config_path.display(), "ignoring config: {}", e)
                    }
                }
            }
        }
        Self::default()
    }

    /// Reject values the editor cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(mask) = self.mask {
            if mask.is_control() {
                return Err(ConfigError::Invalid(format!(
                    "mask must be a printable character, got {:?}",
                    mask
                )));
            }
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.failure_message.contains(['\r', '\n']) {
            return Err(ConfigError::Invalid(
                "failure_message must be a single line".to_string(),
            ));
        }
        Ok(())
    }
}

/// Get the default configuration file path
pub fn default_config_path() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("typed-prompt")
            .join("config.json")
    })
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
