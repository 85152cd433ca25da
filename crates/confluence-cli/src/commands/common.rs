//! Shared helpers: configuration lookup and the mixing graph.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use confluence_config::{EngineConfig, paths};
use confluence_core::{AudioGraph, Node, NodeId, Settings, SumNode, SystemSource, SystemTarget};

/// Loads `path`, else the user config file if it exists, else the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    if let Some(path) = path {
        return Ok(EngineConfig::load(path)?);
    }
    let default_path = paths::user_config_file();
    if default_path.is_file() {
        Ok(EngineConfig::load(&default_path)?)
    } else {
        Ok(EngineConfig::default())
    }
}

/// `inputs` system sources feeding one sum node, feeding one system target.
///
/// ```text
/// in0 ─┐
/// in1 ─┼─► sum ─► out
/// ...  ─┘
/// ```
pub struct MixGraph {
    pub graph: AudioGraph,
    pub sources: Vec<Arc<SystemSource>>,
    pub sum: Arc<SumNode>,
    pub output: Arc<SystemTarget>,
    labels: HashMap<NodeId, String>,
}

impl MixGraph {
    pub fn build(settings: Settings, inputs: usize) -> anyhow::Result<Self> {
        let graph = AudioGraph::new(settings);
        let mut labels = HashMap::new();

        let mut sources = Vec::with_capacity(inputs);
        for i in 0..inputs {
            let src = graph.create_system_source(None)?;
            labels.insert(src.id(), format!("in{i}"));
            sources.push(src);
        }

        let sum = graph.create_sum(None)?;
        labels.insert(sum.id(), "sum".to_string());
        for (i, src) in sources.iter().enumerate() {
            let port = sum.create_port_target(format!("in{i}"))?;
            graph.connect_audio(src.port(), &port)?;
        }

        let output = graph.create_system_target(None)?;
        labels.insert(output.id(), "out".to_string());
        graph.connect_audio(sum.source_port(), output.port())?;

        Ok(Self {
            graph,
            sources,
            sum,
            output,
            labels,
        })
    }

    /// Human-readable name of a node in this graph.
    pub fn label(&self, id: NodeId) -> &str {
        self.labels.get(&id).map_or("?", String::as_str)
    }
}
