//! Confluence CLI - offline host harness for the confluence audio graph.

mod commands;
mod wav;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "confluence")]
#[command(author, version, about = "Confluence audio graph CLI", long_about = None)]
struct Cli {
    /// Engine configuration file (TOML). Defaults to the user config file when present.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mix WAV files block by block through a sum node
    Mix(commands::mix::MixArgs),

    /// Print the visitation order and connections of a mixing graph
    Topology(commands::topology::TopologyArgs),

    /// Show or write the engine configuration
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = commands::common::load_config(cli.config.as_deref())?;
    init_tracing(config.log_filter.as_deref());
    confluence_config::validate(&config).log();

    match cli.command {
        Commands::Mix(args) => commands::mix::run(args, &config),
        Commands::Topology(args) => commands::topology::run(args, &config),
        Commands::Config(args) => commands::config::run(args, &config),
    }
}

/// Installs the global subscriber: `RUST_LOG`, else the config filter, else `info`.
fn init_tracing(config_filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_filter.unwrap_or("info")))
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
