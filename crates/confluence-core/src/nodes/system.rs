//! System boundary nodes: where host audio enters and leaves the graph.

use std::sync::Arc;

use crate::graph::{
    Connection, Node, NodeId, NodeKind, PortId, PortRef, ProcessingContext, SourcePort,
    TargetPort,
};
use crate::settings::Settings;

/// Port key of a [`SystemSource`]'s only port.
pub const SYSTEM_SOURCE_PORT: &str = "out";

/// Port key of a [`SystemTarget`]'s only port.
pub const SYSTEM_TARGET_PORT: &str = "in";

/// External input boundary.
///
/// Owns a single source port that host code fills with
/// [`SourcePort::copy_in`] before each pass. Its process step does nothing.
#[derive(Debug)]
pub struct SystemSource {
    id: NodeId,
    port: Arc<SourcePort>,
}

impl SystemSource {
    /// Creates a system source with one silent port sized to the settings.
    pub fn new(id: NodeId, settings: &Settings) -> Self {
        Self {
            id,
            port: Arc::new(SourcePort::new(PortId::new(id, SYSTEM_SOURCE_PORT), settings)),
        }
    }

    /// The node's only port.
    pub fn port(&self) -> &Arc<SourcePort> {
        &self.port
    }
}

impl Node for SystemSource {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::SystemSource
    }

    fn ports(&self) -> Vec<PortRef> {
        vec![PortRef::Source(Arc::clone(&self.port))]
    }

    fn settings_update(&self, settings: &Settings) {
        self.port.update_settings(settings);
    }

    fn process(&self, _ctx: &ProcessingContext<'_>) {}

    fn on_incoming_connections_changed(&self, _connections: &[Connection]) {}
}

/// External output boundary.
///
/// Owns a single target port. Each pass it copies the block of the source
/// connected to it in the bound snapshot into that port, where host code
/// collects it with [`TargetPort::copy_out`]. With nothing connected the port keeps whatever
/// it last held.
#[derive(Debug)]
pub struct SystemTarget {
    id: NodeId,
    port: Arc<TargetPort>,
}

impl SystemTarget {
    /// Creates a system target with one silent port sized to the settings.
    pub fn new(id: NodeId, settings: &Settings) -> Self {
        Self {
            id,
            port: Arc::new(TargetPort::new(PortId::new(id, SYSTEM_TARGET_PORT), settings)),
        }
    }

    /// The node's only port.
    pub fn port(&self) -> &Arc<TargetPort> {
        &self.port
    }
}

impl Node for SystemTarget {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::SystemTarget
    }

    fn ports(&self) -> Vec<PortRef> {
        vec![PortRef::Target(Arc::clone(&self.port))]
    }

    fn settings_update(&self, settings: &Settings) {
        self.port.update_settings(settings);
    }

    fn process(&self, ctx: &ProcessingContext<'_>) {
        if let Some(conn) = ctx.incoming(self.id).next() {
            self.port.copy_from(conn.source_port());
        }
    }

    fn on_incoming_connections_changed(&self, connections: &[Connection]) {
        debug_assert!(connections.len() <= 1, "system target has a single port");
        if connections.len() > 1 {
            tracing::error!(
                node = %self.id,
                count = connections.len(),
                "system target fed by more than one connection; using the first"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AudioGraph;

    fn settings(block: usize) -> Settings {
        Settings::new(block, 48_000).unwrap()
    }

    #[test]
    fn test_source_ports() {
        let src = SystemSource::new(NodeId::generate(), &settings(16));
        let ports = src.ports();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].id().key().as_str(), SYSTEM_SOURCE_PORT);
        assert_eq!(src.port().len(), 16);
        assert_eq!(src.kind(), NodeKind::SystemSource);
    }

    #[test]
    fn test_target_copies_upstream() {
        let graph = AudioGraph::new(settings(4));
        let src = graph.create_system_source(None).unwrap();
        let dst = graph.create_system_target(None).unwrap();
        graph.connect_audio(src.port(), dst.port()).unwrap();

        src.port().copy_in(&[0.25f64, 0.5, 0.75, 1.0]);
        graph.execute(|ctx| ctx.process());
        assert_eq!(dst.port().to_vec(), vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_unconnected_target_keeps_contents() {
        let graph = AudioGraph::new(settings(2));
        let dst = graph.create_system_target(None).unwrap();
        dst.port().write(|buf| buf.fill(0.3));
        graph.execute(|ctx| ctx.process());
        assert_eq!(dst.port().to_vec(), vec![0.3, 0.3]);
    }

    #[test]
    fn test_target_after_disconnect_stops_copying() {
        let graph = AudioGraph::new(settings(2));
        let src = graph.create_system_source(None).unwrap();
        let dst = graph.create_system_target(None).unwrap();
        graph.connect_audio(src.port(), dst.port()).unwrap();
        src.port().copy_in(&[0.5f64, 0.5]);
        graph.execute(|ctx| ctx.process());

        graph.disconnect_audio(src.port(), dst.port()).unwrap();
        src.port().copy_in(&[0.9f64, 0.9]);
        graph.execute(|ctx| ctx.process());
        assert_eq!(dst.port().to_vec(), vec![0.5, 0.5]);
    }
}
