//! Engine configuration file format and operations.

use std::path::Path;

use confluence_core::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, Settings};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine configuration stored as TOML.
///
/// # TOML Format
///
/// ```toml
/// log_filter = "confluence_core=debug,info"
///
/// [settings]
/// block_size = 256
/// sample_rate = 48000
/// ```
///
/// Every field is optional; missing values fall back to the defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,

    /// Block size and sample rate the graph starts with.
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// File form of [`Settings`]. Unvalidated until [`EngineConfig::to_settings`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SettingsConfig {
    /// Samples per processing pass.
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

fn default_sample_rate() -> u32 {
    DEFAULT_SAMPLE_RATE
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl From<Settings> for SettingsConfig {
    fn from(settings: Settings) -> Self {
        Self {
            block_size: settings.block_size(),
            sample_rate: settings.sample_rate(),
        }
    }
}

impl EngineConfig {
    /// Load a configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("config: loaded {}", path.display());
        Ok(config)
    }

    /// Load a configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::debug!("config: saved {}", path.display());
        Ok(())
    }

    /// Convert the configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validated engine settings.
    pub fn to_settings(&self) -> Result<Settings, ConfigError> {
        Ok(Settings::new(
            self.settings.block_size,
            self.settings.sample_rate,
        )?)
    }

    /// Returns a copy with the block size replaced.
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.settings.block_size = block_size;
        self
    }

    /// Returns a copy with the sample rate replaced.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.settings.sample_rate = sample_rate;
        self
    }
}
