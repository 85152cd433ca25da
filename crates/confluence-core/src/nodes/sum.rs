//! N-to-1 mixer node.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::graph::{
    Connection, GraphError, Node, NodeId, NodeKind, PortId, PortKey, PortRef, ProcessingContext,
    Sample, SourcePort, TargetPort,
};
use crate::settings::Settings;

/// Port key of a [`SumNode`]'s output.
pub const SUM_SOURCE_PORT: &str = "out";

#[derive(Debug)]
struct Targets {
    settings: Settings,
    ports: Vec<Arc<TargetPort>>,
}

/// Mixes every connected input into one output, sample by sample.
///
/// Starts with no target ports; add them with
/// [`create_port_target`](Self::create_port_target). Unconnected target ports
/// contribute nothing, and with no inputs at all the output is silence.
/// Inputs are read from the connections of the snapshot the pass is bound to.
#[derive(Debug)]
pub struct SumNode {
    id: NodeId,
    source: Arc<SourcePort>,
    targets: RwLock<Targets>,
    accumulator: Mutex<Vec<Sample>>,
}

impl SumNode {
    /// Creates a sum node with a single silent output port.
    pub fn new(id: NodeId, settings: &Settings) -> Self {
        Self {
            id,
            source: Arc::new(SourcePort::new(PortId::new(id, SUM_SOURCE_PORT), settings)),
            targets: RwLock::new(Targets {
                settings: *settings,
                ports: Vec::new(),
            }),
            accumulator: Mutex::new(vec![0.0; settings.block_size()]),
        }
    }

    /// The mixed output.
    pub fn source_port(&self) -> &Arc<SourcePort> {
        &self.source
    }

    /// Target ports created so far, in creation order.
    pub fn target_ports(&self) -> Vec<Arc<TargetPort>> {
        self.targets.read().ports.clone()
    }

    /// Adds a new input port sized to the current settings.
    ///
    /// Returns [`GraphError::DuplicatePortId`] if the node already owns a port
    /// with this key (the output's key included).
    pub fn create_port_target(
        &self,
        key: impl Into<PortKey>,
    ) -> Result<Arc<TargetPort>, GraphError> {
        let id = PortId::new(self.id, key);
        let mut targets = self.targets.write();
        if id == *self.source.id() || targets.ports.iter().any(|p| *p.id() == id) {
            return Err(GraphError::DuplicatePortId(id));
        }
        let port = Arc::new(TargetPort::new(id, &targets.settings));
        targets.ports.push(Arc::clone(&port));
        tracing::debug!("sum {}: added target port {}", self.id, port.id().key());
        Ok(port)
    }
}

impl Node for SumNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Sum
    }

    fn ports(&self) -> Vec<PortRef> {
        let targets = self.targets.read();
        let mut ports = Vec::with_capacity(targets.ports.len() + 1);
        ports.push(PortRef::Source(Arc::clone(&self.source)));
        ports.extend(targets.ports.iter().cloned().map(PortRef::Target));
        ports
    }

    fn settings_update(&self, settings: &Settings) {
        let mut targets = self.targets.write();
        targets.settings = *settings;
        for port in &targets.ports {
            port.update_settings(settings);
        }
        self.source.update_settings(settings);

        let mut acc = self.accumulator.lock();
        acc.clear();
        acc.resize(settings.block_size(), 0.0);
    }

    fn process(&self, ctx: &ProcessingContext<'_>) {
        let mut acc = self.accumulator.lock();
        acc.clear();
        acc.resize(ctx.block_size(), 0.0);

        for conn in ctx.incoming(self.id) {
            conn.source_port().read(|block| {
                for (a, &s) in acc.iter_mut().zip(block) {
                    *a += s;
                }
            });
        }

        self.source.copy_in(acc.as_slice());
    }

    fn on_incoming_connections_changed(&self, connections: &[Connection]) {
        tracing::trace!("sum {}: {} inputs", self.id, connections.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AudioGraph;

    fn graph(block: usize) -> AudioGraph {
        AudioGraph::new(Settings::new(block, 48_000).unwrap())
    }

    #[test]
    fn test_two_inputs_are_summed() {
        let g = graph(4);
        let a = g.create_system_source(None).unwrap();
        let b = g.create_system_source(None).unwrap();
        let sum = g.create_sum(None).unwrap();
        g.connect_audio(a.port(), &sum.create_port_target("a").unwrap())
            .unwrap();
        g.connect_audio(b.port(), &sum.create_port_target("b").unwrap())
            .unwrap();

        a.port().copy_in(&[0.25f64; 4]);
        b.port().copy_in(&[0.40f64; 4]);
        g.execute(|ctx| ctx.process());

        for s in sum.source_port().to_vec() {
            assert!((s - 0.65).abs() < 1e-12, "expected 0.65, got {s}");
        }
    }

    #[test]
    fn test_no_inputs_outputs_silence() {
        let g = graph(4);
        let sum = g.create_sum(None).unwrap();
        sum.create_port_target("unused").unwrap();
        sum.source_port().copy_in(&[1.0f64; 4]);
        g.execute(|ctx| ctx.process());
        assert_eq!(sum.source_port().to_vec(), vec![0.0; 4]);
    }

    #[test]
    fn test_duplicate_target_key_rejected() {
        let g = graph(4);
        let sum = g.create_sum(None).unwrap();
        sum.create_port_target("a").unwrap();
        assert!(matches!(
            sum.create_port_target("a"),
            Err(GraphError::DuplicatePortId(_))
        ));
        assert!(matches!(
            sum.create_port_target(SUM_SOURCE_PORT),
            Err(GraphError::DuplicatePortId(_))
        ));
        assert_eq!(sum.target_ports().len(), 1);
    }

    #[test]
    fn test_new_target_port_uses_current_settings() {
        let g = graph(4);
        let sum = g.create_sum(None).unwrap();
        g.update_settings(Settings::new(64, 48_000).unwrap());
        let port = sum.create_port_target("late").unwrap();
        assert_eq!(port.len(), 64);
    }

    #[test]
    fn test_ports_lists_output_first() {
        let g = graph(4);
        let sum = g.create_sum(None).unwrap();
        sum.create_port_target("x").unwrap();
        sum.create_port_target("y").unwrap();
        let ports = sum.ports();
        assert_eq!(ports.len(), 3);
        assert_eq!(ports[0].id().key().as_str(), SUM_SOURCE_PORT);
        assert_eq!(ports[2].id().key().as_str(), "y");
    }

    #[test]
    fn test_disconnected_input_drops_out_of_mix() {
        let g = graph(2);
        let a = g.create_system_source(None).unwrap();
        let b = g.create_system_source(None).unwrap();
        let sum = g.create_sum(None).unwrap();
        let ta = sum.create_port_target("a").unwrap();
        let tb = sum.create_port_target("b").unwrap();
        g.connect_audio(a.port(), &ta).unwrap();
        g.connect_audio(b.port(), &tb).unwrap();
        a.port().copy_in(&[0.5f64; 2]);
        b.port().copy_in(&[0.25f64; 2]);

        g.disconnect_audio(b.port(), &tb).unwrap();
        g.execute(|ctx| ctx.process());
        assert_eq!(sum.source_port().to_vec(), vec![0.5; 2]);
    }
}
