//! Prints the visitation order and connections of a mixing graph.

use clap::Args;
use confluence_config::EngineConfig;

use super::common::MixGraph;

#[derive(Args)]
pub struct TopologyArgs {
    /// Number of system sources feeding the sum node
    #[arg(long, default_value = "2")]
    inputs: usize,
}

pub fn run(args: TopologyArgs, config: &EngineConfig) -> anyhow::Result<()> {
    let settings = config.to_settings()?;
    let mix = MixGraph::build(settings, args.inputs)?;
    let snapshot = mix.graph.snapshot();

    println!(
        "Settings: block size {}, {} Hz ({:.2} ms per block)",
        settings.block_size(),
        settings.sample_rate(),
        settings.block_duration_secs() * 1000.0
    );

    println!("\nVisitation order ({} nodes):", snapshot.node_count());
    for (i, node) in snapshot.order().enumerate() {
        println!(
            "  {:>2}. {:<6} {:<16} {}",
            i + 1,
            mix.label(node.id()),
            node.kind().to_string(),
            node.id()
        );
    }

    println!("\nConnections ({}):", snapshot.connections().len());
    for conn in snapshot.connections() {
        println!(
            "  {}.{} -> {}.{}",
            mix.label(conn.source_node()),
            conn.source_id().key(),
            mix.label(conn.target_node()),
            conn.target_id().key()
        );
    }

    Ok(())
}
