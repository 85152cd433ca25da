//! Show or write the engine configuration.

use std::path::PathBuf;

use clap::Args;
use confluence_config::{EngineConfig, paths, validate};

#[derive(Args)]
pub struct ConfigArgs {
    /// Write a default configuration file to this path
    #[arg(long, value_name = "FILE")]
    write: Option<PathBuf>,

    /// Print the user configuration file path
    #[arg(long)]
    path: bool,
}

pub fn run(args: ConfigArgs, config: &EngineConfig) -> anyhow::Result<()> {
    if let Some(path) = args.write {
        EngineConfig::default().save(&path)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    if args.path {
        println!("{}", paths::user_config_file().display());
        return Ok(());
    }

    print!("{}", config.to_toml()?);

    let report = validate(config);
    if !report.is_clean() {
        println!();
        for warning in report.warnings() {
            println!("warning: {warning}");
        }
    }
    Ok(())
}
