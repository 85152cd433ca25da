//! Non-fatal configuration checks.
//!
//! [`validate`] never rejects a configuration that [`EngineConfig::to_settings`]
//! accepts. It reports values that work but are likely mistakes, such as a
//! block size that is not a power of two, so a host can surface them.
//!
//! # Example
//!
//! ```rust
//! use confluence_config::{EngineConfig, validate};
//!
//! let report = validate(&EngineConfig::default().with_block_size(100));
//! assert!(!report.is_clean());
//! for warning in report.warnings() {
//!     println!("warning: {warning}");
//! }
//! ```

use thiserror::Error;

use crate::config::EngineConfig;

/// Sample rates hosts commonly run at.
pub const COMMON_SAMPLE_RATES: &[u32] = &[
    8_000, 11_025, 16_000, 22_050, 32_000, 44_100, 48_000, 88_200, 96_000, 176_400, 192_000,
];

/// Largest block size accepted without a warning.
pub const MAX_TYPICAL_BLOCK_SIZE: usize = 8_192;

/// A suspicious but usable configuration value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    /// Block size is not a power of two.
    #[error("block size {0} is not a power of two")]
    BlockSizeNotPowerOfTwo(usize),

    /// Block size is far larger than real-time hosts use.
    #[error("block size {0} exceeds {max} samples", max = MAX_TYPICAL_BLOCK_SIZE)]
    BlockSizeVeryLarge(usize),

    /// Sample rate is not one of [`COMMON_SAMPLE_RATES`].
    #[error("sample rate {0} Hz is unusual")]
    UnusualSampleRate(u32),

    /// The log filter is blank.
    #[error("log filter is empty")]
    EmptyLogFilter,
}

/// Outcome of [`validate`]: zero or more warnings and nothing fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// True when there is nothing to report.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// The collected warnings, in check order.
    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    /// Emits every warning through `tracing::warn!`.
    pub fn log(&self) {
        for warning in &self.warnings {
            tracing::warn!("config: {warning}");
        }
    }
}

/// Checks a configuration for values that are legal but likely unintended.
///
/// Zero block size or sample rate is not reported here; those fail in
/// [`EngineConfig::to_settings`].
pub fn validate(config: &EngineConfig) -> ValidationReport {
    let mut warnings = Vec::new();
    let block = config.settings.block_size;
    let rate = config.settings.sample_rate;

    if block > 0 && !block.is_power_of_two() {
        warnings.push(ValidationWarning::BlockSizeNotPowerOfTwo(block));
    }
    if block > MAX_TYPICAL_BLOCK_SIZE {
        warnings.push(ValidationWarning::BlockSizeVeryLarge(block));
    }
    if rate > 0 && !COMMON_SAMPLE_RATES.contains(&rate) {
        warnings.push(ValidationWarning::UnusualSampleRate(rate));
    }
    if let Some(filter) = &config.log_filter
        && filter.trim().is_empty()
    {
        warnings.push(ValidationWarning::EmptyLogFilter);
    }

    ValidationReport { warnings }
}
