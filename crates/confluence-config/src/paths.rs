//! Platform-specific configuration paths.
//!
//! - Linux: `~/.config/confluence/config.toml`
//! - macOS: `~/Library/Application Support/confluence/config.toml`
//! - Windows: `%APPDATA%\confluence\config.toml`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "confluence";

/// File name of the engine configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// Falls back to the current directory if the platform config directory
/// cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the default location of the engine configuration file.
pub fn user_config_file() -> PathBuf {
    user_config_dir().join(CONFIG_FILE_NAME)
}
