//! Directed connections between ports.
//!
//! A [`Connection`] links a source port to a target port. It holds shared
//! handles to both ports, so a node notified of its incoming connections can
//! read the upstream buffers directly during its process step.

use std::sync::Arc;

use super::node::NodeId;
use super::port::{PortId, SourcePort, TargetPort};

/// Immutable edge from a source port to a target port.
///
/// Two connections are equal when they join the same pair of port identities.
#[derive(Clone)]
pub struct Connection {
    source: Arc<SourcePort>,
    target: Arc<TargetPort>,
}

impl Connection {
    /// Creates a connection between two ports.
    ///
    /// This does not validate anything; [`AudioGraph::connect_audio`](super::AudioGraph::connect_audio)
    /// is the only way an edge enters a graph.
    pub fn new(source: Arc<SourcePort>, target: Arc<TargetPort>) -> Self {
        Self { source, target }
    }

    /// The upstream node.
    #[inline]
    pub fn source_node(&self) -> NodeId {
        self.source.id().node()
    }

    /// The downstream node.
    #[inline]
    pub fn target_node(&self) -> NodeId {
        self.target.id().node()
    }

    /// Identity of the source port.
    #[inline]
    pub fn source_id(&self) -> &PortId {
        self.source.id()
    }

    /// Identity of the target port.
    #[inline]
    pub fn target_id(&self) -> &PortId {
        self.target.id()
    }

    /// The source port itself.
    pub fn source_port(&self) -> &Arc<SourcePort> {
        &self.source
    }

    /// The target port itself.
    pub fn target_port(&self) -> &Arc<TargetPort> {
        &self.target
    }

    /// Returns true if this connection joins exactly these two ports.
    pub fn joins(&self, source: &PortId, target: &PortId) -> bool {
        self.source_id() == source && self.target_id() == target
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.joins(other.source_id(), other.target_id())
    }
}

impl Eq for Connection {}

impl core::fmt::Debug for Connection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Connection")
            .field("source", self.source_id())
            .field("target", self.target_id())
            .finish()
    }
}

impl core::fmt::Display for Connection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} → {}", self.source_id(), self.target_id())
    }
}
