//! WAV file reading and writing at the graph boundary.
//!
//! Inputs keep their native width where the graph ports accept it directly:
//! 16-bit PCM stays `i16`, float stays `f32`, and other integer depths are
//! scaled to `f32`. Multi-channel files are mixed down to mono by averaging.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use confluence_core::{SourcePort, TargetPort};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

/// Decoded mono samples in the width they were stored with.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    /// 16-bit linear PCM.
    Pcm16(Vec<i16>),
    /// IEEE float, or integer PCM of another depth scaled to [-1, 1).
    Float(Vec<f32>),
}

impl Samples {
    pub fn len(&self) -> usize {
        match self {
            Self::Pcm16(v) => v.len(),
            Self::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies frames `start..start + len` into `port`.
    ///
    /// Past the end of the file the port is filled with silence.
    pub fn copy_block(&self, start: usize, len: usize, port: &SourcePort) -> usize {
        match self {
            Self::Pcm16(v) => port.copy_in(window(v.as_slice(), start, len)),
            Self::Float(v) => port.copy_in(window(v.as_slice(), start, len)),
        }
    }
}

fn window<T>(samples: &[T], start: usize, len: usize) -> &[T] {
    let start = start.min(samples.len());
    let end = start.saturating_add(len).min(samples.len());
    &samples[start..end]
}

/// A mono input file.
#[derive(Debug)]
pub struct WavInput {
    pub samples: Samples,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

/// Reads a WAV file, mixing down to mono.
pub fn read_mono(path: &Path) -> anyhow::Result<WavInput> {
    let reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Int, 16) => {
            let raw = reader
                .into_samples::<i16>()
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("failed to decode {}", path.display()))?;
            Samples::Pcm16(mix_down(&raw, channels, |frame| {
                let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                (sum / frame.len() as i32) as i16
            }))
        }
        (SampleFormat::Int, bits) => {
            let max_val = (1i64 << bits.saturating_sub(1)) as f32;
            let raw = reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("failed to decode {}", path.display()))?;
            Samples::Float(mix_down(&raw, channels, average))
        }
        (SampleFormat::Float, _) => {
            let raw = reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("failed to decode {}", path.display()))?;
            Samples::Float(mix_down(&raw, channels, average))
        }
    };

    tracing::debug!(
        "wav: read {} ({} frames, {} ch, {}-bit, {} Hz)",
        path.display(),
        samples.len(),
        spec.channels,
        spec.bits_per_sample,
        spec.sample_rate
    );

    Ok(WavInput {
        samples,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
    })
}

fn average(frame: &[f32]) -> f32 {
    frame.iter().sum::<f32>() / frame.len() as f32
}

fn mix_down<T: Copy>(raw: &[T], channels: usize, mix: impl Fn(&[T]) -> T) -> Vec<T> {
    if channels == 1 {
        raw.to_vec()
    } else {
        raw.chunks(channels).map(mix).collect()
    }
}

/// Mono output file in a fixed width.
pub enum WavOutput {
    /// 16-bit linear PCM.
    Pcm16 {
        writer: WavWriter<BufWriter<File>>,
        scratch: Vec<i16>,
    },
    /// 32-bit IEEE float.
    Float {
        writer: WavWriter<BufWriter<File>>,
        scratch: Vec<f32>,
    },
}

impl WavOutput {
    /// Creates `path` for mono output at `bit_depth` (16 or 32).
    pub fn create(
        path: &Path,
        sample_rate: u32,
        bit_depth: u16,
        block_size: usize,
    ) -> anyhow::Result<Self> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: bit_depth,
            sample_format: if bit_depth == 32 {
                SampleFormat::Float
            } else {
                SampleFormat::Int
            },
        };
        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok(match bit_depth {
            16 => Self::Pcm16 {
                writer,
                scratch: vec![0; block_size],
            },
            32 => Self::Float {
                writer,
                scratch: vec![0.0; block_size],
            },
            other => anyhow::bail!("unsupported output bit depth {other} (expected 16 or 32)"),
        })
    }

    /// Copies the first `frames` samples of `port` out and appends them.
    pub fn write_block(&mut self, port: &TargetPort, frames: usize) -> anyhow::Result<()> {
        match self {
            Self::Pcm16 { writer, scratch } => {
                let n = frames.min(scratch.len());
                let copied = port.copy_out(&mut scratch[..n]);
                for &s in &scratch[..copied] {
                    writer.write_sample(s)?;
                }
            }
            Self::Float { writer, scratch } => {
                let n = frames.min(scratch.len());
                let copied = port.copy_out(&mut scratch[..n]);
                for &s in &scratch[..copied] {
                    writer.write_sample(s)?;
                }
            }
        }
        Ok(())
    }

    pub fn finalize(self) -> anyhow::Result<()> {
        match self {
            Self::Pcm16 { writer, .. } | Self::Float { writer, .. } => writer.finalize()?,
        }
        Ok(())
    }
}
