//! Node identity, kind tags, and the node capability trait.
//!
//! Every vertex of the audio graph implements [`Node`]. The engine ships
//! system sources/targets, sum and loopback nodes (see [`crate::nodes`]); DSP
//! nodes built elsewhere implement the same trait and are inserted with
//! [`AudioGraph::add_node`](super::AudioGraph::add_node).

use core::str::FromStr;

use uuid::Uuid;

use super::context::ProcessingContext;
use super::edge::Connection;
use super::port::{PortId, PortRef};
use crate::settings::Settings;

/// Stable, globally unique identifier of a node.
///
/// Either supplied by the caller or freshly generated (random v4 UUID).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[inline]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for NodeId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl core::fmt::Display for NodeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// The role of a node in the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// External input boundary: one source port, filled by the host.
    SystemSource,
    /// External output boundary: one target port, read by the host.
    SystemTarget,
    /// N-to-1 mixer.
    Sum,
    /// Feedback entry: stores its input for the next pass.
    LoopbackSend,
    /// Feedback exit: emits the block stored during the previous pass.
    LoopbackReturn,
    /// A node kind defined outside this crate.
    Custom(&'static str),
}

impl core::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SystemSource => f.write_str("system-source"),
            Self::SystemTarget => f.write_str("system-target"),
            Self::Sum => f.write_str("sum"),
            Self::LoopbackSend => f.write_str("loopback-send"),
            Self::LoopbackReturn => f.write_str("loopback-return"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// Capability set every graph vertex provides.
///
/// All methods take `&self`: nodes are shared between the control path
/// (settings and connection notifications) and the audio path (`process`),
/// so any mutable state lives behind the node's own interior synchronization.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use confluence_core::{
///     AudioGraph, Connection, Node, NodeId, NodeKind, PortId, PortRef,
///     ProcessingContext, Settings, SourcePort,
/// };
///
/// /// Emits a constant level on every sample.
/// struct Dc {
///     id: NodeId,
///     out: Arc<SourcePort>,
/// }
///
/// impl Node for Dc {
///     fn id(&self) -> NodeId {
///         self.id
///     }
///     fn kind(&self) -> NodeKind {
///         NodeKind::Custom("dc")
///     }
///     fn ports(&self) -> Vec<PortRef> {
///         vec![PortRef::Source(Arc::clone(&self.out))]
///     }
///     fn settings_update(&self, settings: &Settings) {
///         self.out.update_settings(settings);
///     }
///     fn process(&self, _ctx: &ProcessingContext<'_>) {
///         self.out.write(|buf| buf.fill(0.5));
///     }
///     fn on_incoming_connections_changed(&self, _connections: &[Connection]) {}
/// }
///
/// let graph = AudioGraph::new(Settings::default());
/// let id = NodeId::generate();
/// let out = Arc::new(SourcePort::new(PortId::new(id, "out"), &graph.settings()));
/// graph.add_node(Arc::new(Dc { id, out })).unwrap();
/// assert_eq!(graph.node_count(), 1);
/// ```
pub trait Node: Send + Sync {
    /// The node's identifier.
    fn id(&self) -> NodeId;

    /// The node's kind tag.
    fn kind(&self) -> NodeKind;

    /// All ports the node currently owns.
    fn ports(&self) -> Vec<PortRef>;

    /// Resizes ports and resets internal state for new settings.
    ///
    /// Called on the control path, in node creation order, whenever the
    /// graph's settings change, and once when the node is inserted.
    fn settings_update(&self, settings: &Settings);

    /// Produces one block of output from already-available input.
    ///
    /// Called on the audio path, after every upstream node has run in the
    /// same pass.
    fn process(&self, ctx: &ProcessingContext<'_>);

    /// Receives the complete, current set of connections into this node.
    fn on_incoming_connections_changed(&self, connections: &[Connection]);

    /// Returns the port with the given identity, if this node owns it.
    fn port(&self, id: &PortId) -> Option<PortRef> {
        self.ports().into_iter().find(|p| p.id() == id)
    }
}

impl core::fmt::Debug for dyn Node {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id())
            .field("kind", &self.kind())
            .finish()
    }
}
