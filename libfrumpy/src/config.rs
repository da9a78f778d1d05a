//! Configuration management for Frumpy

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
pub use crate::logging::LogSettings;

/// Rounds of `model:change` a single drain may run before giving up.
pub const DEFAULT_MAX_CHANGE_CASCADE: usize = 32;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    #[serde(default)]
    pub logging: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    #[serde(default = "default_max_change_cascade")]
    pub max_change_cascade: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_change_cascade: DEFAULT_MAX_CHANGE_CASCADE,
        }
    }
}

impl DispatcherConfig {
    /// A zero cascade limit would reject the first accepted transition,
    /// the initial model included.
    pub fn validate(&self) -> Result<()> {
        if self.max_change_cascade == 0 {
            return Err(ConfigError::InvalidValue {
                field: "dispatcher.max_change_cascade".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn default_max_change_cascade() -> usize {
    DEFAULT_MAX_CHANGE_CASCADE
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load from the default location, falling back to defaults when no
    /// file exists there.
    pub fn load_or_default() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.dispatcher.validate()?;
        self.logging.validate()
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("FRUMPY_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("frumpy").join("config.toml"))
}
