//! Engine-wide processing settings.
//!
//! [`Settings`] bundles the two values that govern buffer sizing and timing:
//! the block size (samples per processing pass) and the sample rate. The value
//! is always replaced as a whole, never field by field, so every node observes
//! one consistent pair.

use thiserror::Error;

/// Default block size in samples.
pub const DEFAULT_BLOCK_SIZE: usize = 256;

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Errors produced when constructing [`Settings`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// The block size must be at least one sample.
    #[error("block size must be positive")]
    ZeroBlockSize,
    /// The sample rate must be at least 1 Hz.
    #[error("sample rate must be positive")]
    ZeroSampleRate,
}

/// Block size and sample rate in effect for the graph.
///
/// Both fields are guaranteed positive: the only constructor is
/// [`Settings::new`], which rejects zeros.
///
/// # Example
///
/// ```rust
/// use confluence_core::Settings;
///
/// let settings = Settings::new(512, 44_100).unwrap();
/// assert_eq!(settings.block_size(), 512);
/// assert!(Settings::new(0, 44_100).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Settings {
    block_size: usize,
    sample_rate: u32,
}

impl Settings {
    /// Creates a settings value, rejecting a zero block size or sample rate.
    pub fn new(block_size: usize, sample_rate: u32) -> Result<Self, SettingsError> {
        if block_size == 0 {
            return Err(SettingsError::ZeroBlockSize);
        }
        if sample_rate == 0 {
            return Err(SettingsError::ZeroSampleRate);
        }
        Ok(Self {
            block_size,
            sample_rate,
        })
    }

    /// Samples per processing pass.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Duration of one block in seconds.
    pub fn block_duration_secs(&self) -> f64 {
        self.block_size as f64 / f64::from(self.sample_rate)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl core::fmt::Display for Settings {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} samples @ {} Hz", self.block_size, self.sample_rate)
    }
}
