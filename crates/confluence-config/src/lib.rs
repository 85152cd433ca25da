//! Engine configuration for the confluence audio graph.
//!
//! A small TOML file tells a host which [`Settings`](confluence_core::Settings)
//! to start the graph with and which `tracing` filter to log under.
//!
//! # Features
//!
//! - **Config files**: load and save [`EngineConfig`] as TOML
//! - **Validation**: non-fatal [`validate`] warnings for suspicious values
//! - **Paths**: platform-specific default config location
//!
//! # Example
//!
//! ```rust,no_run
//! use confluence_config::{EngineConfig, paths};
//!
//! let path = paths::user_config_file();
//! let config = if path.exists() {
//!     EngineConfig::load(&path).unwrap()
//! } else {
//!     EngineConfig::default()
//! };
//! let settings = config.to_settings().unwrap();
//! println!("starting at {settings}");
//! ```

mod config;
mod error;

/// Platform-specific configuration paths.
pub mod paths;

/// Non-fatal configuration checks.
pub mod validation;

pub use config::{EngineConfig, SettingsConfig};
pub use error::ConfigError;
pub use validation::{ValidationReport, ValidationWarning, validate};
