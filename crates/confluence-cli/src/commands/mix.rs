//! Offline mixing: WAV inputs into system sources, one sum node, one WAV output.

use std::path::PathBuf;

use clap::Args;
use confluence_config::EngineConfig;
use indicatif::{ProgressBar, ProgressStyle};

use super::common::MixGraph;
use crate::wav::{WavOutput, read_mono};

#[derive(Args)]
pub struct MixArgs {
    /// Input WAV files (all must share one sample rate)
    #[arg(value_name = "INPUT", required = true)]
    inputs: Vec<PathBuf>,

    /// Output WAV file
    #[arg(short, long, value_name = "OUTPUT")]
    output: PathBuf,

    /// Processing block size (overrides the configuration)
    #[arg(long)]
    block_size: Option<usize>,

    /// Output bit depth (16 or 32)
    #[arg(long, default_value = "32")]
    bit_depth: u16,
}

pub fn run(args: MixArgs, config: &EngineConfig) -> anyhow::Result<()> {
    if !matches!(args.bit_depth, 16 | 32) {
        anyhow::bail!(
            "unsupported output bit depth {} (expected 16 or 32)",
            args.bit_depth
        );
    }

    let mut inputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let input = read_mono(path)?;
        println!(
            "Reading {}: {} samples, {} Hz, {}-bit",
            path.display(),
            input.samples.len(),
            input.sample_rate,
            input.bits_per_sample
        );
        inputs.push(input);
    }

    let Some(sample_rate) = inputs.first().map(|i| i.sample_rate) else {
        anyhow::bail!("no input files given");
    };
    if let Some((path, input)) = args
        .inputs
        .iter()
        .zip(&inputs)
        .find(|(_, input)| input.sample_rate != sample_rate)
    {
        anyhow::bail!(
            "sample rate mismatch: {} is {} Hz, expected {} Hz",
            path.display(),
            input.sample_rate,
            sample_rate
        );
    }

    let mut config = config.clone().with_sample_rate(sample_rate);
    if let Some(block_size) = args.block_size {
        config = config.with_block_size(block_size);
    }
    let settings = config.to_settings()?;
    let block_size = settings.block_size();

    let mix = MixGraph::build(settings, inputs.len())?;
    let frames = inputs.iter().map(|i| i.samples.len()).max().unwrap_or(0);
    tracing::info!(
        "mix: {} inputs, {} frames, block size {}",
        inputs.len(),
        frames,
        block_size
    );

    let mut writer = WavOutput::create(&args.output, sample_rate, args.bit_depth, block_size)?;

    let pb = ProgressBar::new(frames as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut peak = 0.0f64;
    let mut start = 0;
    while start < frames {
        let len = block_size.min(frames - start);
        mix.graph.execute(|ctx| -> anyhow::Result<()> {
            for (input, source) in inputs.iter().zip(&mix.sources) {
                input.samples.copy_block(start, len, source.port());
            }
            ctx.process();
            let port = mix.output.port();
            peak = port.read(|block| {
                block[..len.min(block.len())]
                    .iter()
                    .fold(peak, |acc, s| acc.max(s.abs()))
            });
            writer.write_block(port, len)
        })?;
        start += len;
        pb.set_position(start as u64);
    }
    pb.finish_with_message("done");

    writer.finalize()?;

    if peak > 1.0 {
        tracing::warn!("mix: output clipped (peak {peak:.3})");
    }
    println!("\nStats:");
    println!("  Frames: {frames}");
    println!("  Peak:   {:.1} dB", linear_to_db(peak));
    println!("Wrote {}", args.output.display());

    Ok(())
}

fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_to_db() {
        assert_eq!(linear_to_db(0.0), -120.0);
        assert!(linear_to_db(1.0).abs() < 1e-12);
        assert!((linear_to_db(0.5) + 6.0206).abs() < 1e-3);
    }
}
