//! Audio graph: node creation, validated connect/disconnect, settings
//! propagation, and snapshot publication.
//!
//! [`AudioGraph`] owns a private *working* topology, edited only by the control
//! path under a mutex, and a published [`Snapshot`] behind an `ArcSwap`, read
//! only by the audio path. Every successful edit ends by building a brand-new
//! snapshot and swapping it in; [`execute`](AudioGraph::execute) loads the
//! current snapshot exactly once and works from it for the whole pass.
//!
//! The graph is used through `&self` from both paths, so it is typically
//! shared as `Arc<AudioGraph>`.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;

use super::context::ProcessingContext;
use super::edge::Connection;
use super::listener::{GraphListener, ListenerId, ListenerSet};
use super::node::{Node, NodeId};
use super::port::{PortId, PortRef, SourcePort, TargetPort};
use super::schedule::Snapshot;
use crate::nodes::{LoopbackPair, SumNode, SystemSource, SystemTarget};
use crate::settings::Settings;

/// Errors returned by graph edits. All are raised synchronously on the control path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A node with this identifier already exists in the graph.
    #[error("node {0} already exists")]
    DuplicateNodeId(NodeId),
    /// The node already owns a port with this identifier.
    #[error("port {0} already exists")]
    DuplicatePortId(PortId),
    /// The target port already has an incoming connection.
    #[error("target port {0} already has an incoming connection")]
    PortAlreadyConnected(PortId),
    /// There is no live connection between these two ports.
    #[error("no connection from {from} to {to}")]
    PortNotConnected {
        /// The source port named in the request.
        from: PortId,
        /// The target port named in the request.
        to: PortId,
    },
    /// The source node is already reachable from the target node.
    #[error("connecting {from} to {to} would create a cycle")]
    CycleWouldBeCreated {
        /// The requested source node.
        from: NodeId,
        /// The requested target node.
        to: NodeId,
    },
    /// The node is not part of this graph.
    #[error("node {0} not found")]
    NodeNotFound(NodeId),
    /// The port is not owned by the node its identity names.
    #[error("port {0} not found on its node")]
    PortNotFound(PortId),
}

/// Mutable topology, touched only by the control path.
struct Topology {
    /// Nodes in creation order.
    nodes: Vec<Arc<dyn Node>>,
    index: HashMap<NodeId, usize>,
    connections: Vec<Connection>,
    settings: Settings,
    settings_version: u64,
    revision: u64,
}

impl Topology {
    fn new(settings: Settings) -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            connections: Vec::new(),
            settings,
            settings_version: 0,
            revision: 0,
        }
    }

    fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    fn node(&self, id: NodeId) -> Option<&Arc<dyn Node>> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    fn insert(&mut self, node: Arc<dyn Node>) {
        self.index.insert(node.id(), self.nodes.len());
        self.nodes.push(node);
    }

    fn incoming(&self, id: NodeId) -> Vec<Connection> {
        self.connections
            .iter()
            .filter(|c| c.target_node() == id)
            .cloned()
            .collect()
    }

    fn is_target_connected(&self, port: &PortId) -> bool {
        self.connections.iter().any(|c| c.target_id() == port)
    }

    /// DFS reachability check: can `from` reach `to` via existing connections?
    fn can_reach(&self, from: NodeId, to: NodeId) -> bool {
        let mut successors: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        for conn in &self.connections {
            successors
                .entry(conn.source_node())
                .or_default()
                .push(conn.target_node());
        }

        let mut visited = HashSet::new();
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            if let Some(next) = successors.get(&current) {
                stack.extend(next.iter().copied());
            }
        }
        false
    }
}

/// Verifies that `node` owns exactly this source port instance.
fn owns_source(node: &Arc<dyn Node>, port: &Arc<SourcePort>) -> bool {
    matches!(node.port(port.id()), Some(PortRef::Source(p)) if Arc::ptr_eq(&p, port))
}

/// Verifies that `node` owns exactly this target port instance.
fn owns_target(node: &Arc<dyn Node>, port: &Arc<TargetPort>) -> bool {
    matches!(node.port(port.id()), Some(PortRef::Target(p)) if Arc::ptr_eq(&p, port))
}

/// Audio graph with a control-path working topology and an audio-path snapshot.
///
/// # Usage
///
/// 1. Create a graph with [`new()`](Self::new)
/// 2. Add nodes: [`create_system_source()`](Self::create_system_source),
///    [`create_system_target()`](Self::create_system_target),
///    [`create_sum()`](Self::create_sum),
///    [`create_loopback_pair()`](Self::create_loopback_pair),
///    [`add_node()`](Self::add_node)
/// 3. Connect ports: [`connect_audio()`](Self::connect_audio)
/// 4. Per audio block: [`execute()`](Self::execute), calling
///    [`ProcessingContext::process`] inside the callback
///
/// # Example
///
/// ```rust
/// use confluence_core::{AudioGraph, Settings};
///
/// let graph = AudioGraph::new(Settings::new(4, 48_000).unwrap());
/// let input = graph.create_system_source(None).unwrap();
/// let output = graph.create_system_target(None).unwrap();
/// graph.connect_audio(input.port(), output.port()).unwrap();
///
/// input.port().copy_in(&[0.25f32; 4]);
/// graph.execute(|ctx| ctx.process());
///
/// let mut out = [0.0f32; 4];
/// output.port().copy_out(&mut out);
/// assert_eq!(out, [0.25; 4]);
/// ```
pub struct AudioGraph {
    working: Mutex<Topology>,
    published: ArcSwap<Snapshot>,
    listeners: ListenerSet,
    /// Serializes settings changes against in-flight passes.
    pass_gate: RwLock<()>,
    passes: AtomicU64,
}

impl AudioGraph {
    /// Creates an empty graph with the given settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            working: Mutex::new(Topology::new(settings)),
            published: ArcSwap::from_pointee(Snapshot::empty(settings)),
            listeners: ListenerSet::new(),
            pass_gate: RwLock::new(()),
            passes: AtomicU64::new(0),
        }
    }

    // --- Node creation ---

    /// Creates a system source node (external input boundary).
    ///
    /// Uses `id` if given, otherwise generates one.
    pub fn create_system_source(
        &self,
        id: Option<NodeId>,
    ) -> Result<Arc<SystemSource>, GraphError> {
        self.create_with(id, SystemSource::new)
    }

    /// Creates a system target node (external output boundary).
    pub fn create_system_target(
        &self,
        id: Option<NodeId>,
    ) -> Result<Arc<SystemTarget>, GraphError> {
        self.create_with(id, SystemTarget::new)
    }

    /// Creates a sum (N-to-1 mixer) node with no target ports yet.
    pub fn create_sum(&self, id: Option<NodeId>) -> Result<Arc<SumNode>, GraphError> {
        self.create_with(id, SumNode::new)
    }

    /// Creates a loopback send/return pair carrying feedback with one block of delay.
    ///
    /// No topology edge joins the two nodes, so routing the return back to
    /// the send's upstream keeps the graph acyclic. Both nodes are added in
    /// one publication.
    pub fn create_loopback_pair(
        &self,
        send_id: Option<NodeId>,
        return_id: Option<NodeId>,
    ) -> Result<LoopbackPair, GraphError> {
        let mut topo = self.working.lock();
        let send_id = send_id.unwrap_or_else(NodeId::generate);
        let return_id = return_id.unwrap_or_else(NodeId::generate);
        if topo.contains(send_id) {
            return Err(GraphError::DuplicateNodeId(send_id));
        }
        if topo.contains(return_id) || return_id == send_id {
            return Err(GraphError::DuplicateNodeId(return_id));
        }

        let pair = LoopbackPair::new(send_id, return_id, &topo.settings);
        topo.insert(Arc::clone(&pair.send) as Arc<dyn Node>);
        topo.insert(Arc::clone(&pair.ret) as Arc<dyn Node>);
        tracing::debug!("graph_add: loopback pair {send_id} ⇢ {return_id}");
        self.publish(&mut topo);
        Ok(pair)
    }

    /// Inserts an externally built node.
    ///
    /// The node receives a [`settings_update`](Node::settings_update) with the
    /// graph's current settings before it becomes visible to the audio path.
    pub fn add_node<N>(&self, node: Arc<N>) -> Result<Arc<N>, GraphError>
    where
        N: Node + 'static,
    {
        let mut topo = self.working.lock();
        let id = node.id();
        if topo.contains(id) {
            return Err(GraphError::DuplicateNodeId(id));
        }
        node.settings_update(&topo.settings);
        topo.insert(Arc::clone(&node) as Arc<dyn Node>);
        tracing::debug!("graph_add: {} node {id}", node.kind());
        self.publish(&mut topo);
        Ok(node)
    }

    fn create_with<N, F>(&self, id: Option<NodeId>, make: F) -> Result<Arc<N>, GraphError>
    where
        N: Node + 'static,
        F: FnOnce(NodeId, &Settings) -> N,
    {
        let mut topo = self.working.lock();
        let id = id.unwrap_or_else(NodeId::generate);
        if topo.contains(id) {
            return Err(GraphError::DuplicateNodeId(id));
        }
        let node = Arc::new(make(id, &topo.settings));
        topo.insert(Arc::clone(&node) as Arc<dyn Node>);
        tracing::debug!("graph_add: {} node {id}", node.kind());
        self.publish(&mut topo);
        Ok(node)
    }

    // --- Connections ---

    /// Connects a source port to a target port.
    ///
    /// Returns the new connection, or an error if:
    /// - Either port's node is not in this graph, or does not own the port
    /// - The target port already has an incoming connection
    /// - The source node is already reachable from the target node (cycle)
    ///
    /// On success, in this order: the target node is told its new incoming
    /// set, a new snapshot is published, the working lock is released, and
    /// then listeners are notified. A listener therefore sees the edit that
    /// triggered it and may edit the graph itself.
    pub fn connect_audio(
        &self,
        source: &Arc<SourcePort>,
        target: &Arc<TargetPort>,
    ) -> Result<Connection, GraphError> {
        let mut topo = self.working.lock();
        let from = source.id().node();
        let to = target.id().node();

        let source_node = topo.node(from).ok_or(GraphError::NodeNotFound(from))?;
        if !owns_source(source_node, source) {
            return Err(GraphError::PortNotFound(source.id().clone()));
        }
        let target_node = Arc::clone(topo.node(to).ok_or(GraphError::NodeNotFound(to))?);
        if !owns_target(&target_node, target) {
            return Err(GraphError::PortNotFound(target.id().clone()));
        }

        if topo.is_target_connected(target.id()) {
            return Err(GraphError::PortAlreadyConnected(target.id().clone()));
        }

        // A cycle exists if `to` can already reach `from` via existing edges.
        if topo.can_reach(to, from) {
            return Err(GraphError::CycleWouldBeCreated { from, to });
        }

        let connection = Connection::new(Arc::clone(source), Arc::clone(target));
        topo.connections.push(connection.clone());
        target_node.on_incoming_connections_changed(&topo.incoming(to));
        tracing::debug!("graph_connect: {connection}");
        self.publish(&mut topo);
        drop(topo);

        self.listeners.notify_connect(&connection);
        Ok(connection)
    }

    /// Removes the connection between a source port and a target port.
    ///
    /// Returns [`GraphError::PortNotConnected`] if no such connection exists.
    /// Notifications follow the same order as [`connect_audio`](Self::connect_audio).
    pub fn disconnect_audio(
        &self,
        source: &SourcePort,
        target: &TargetPort,
    ) -> Result<(), GraphError> {
        let mut topo = self.working.lock();
        let pos = topo
            .connections
            .iter()
            .position(|c| c.joins(source.id(), target.id()))
            .ok_or_else(|| GraphError::PortNotConnected {
                from: source.id().clone(),
                to: target.id().clone(),
            })?;

        let connection = topo.connections.remove(pos);
        let to = connection.target_node();
        if let Some(node) = topo.node(to) {
            node.on_incoming_connections_changed(&topo.incoming(to));
        }
        tracing::debug!("graph_disconnect: {connection}");
        self.publish(&mut topo);
        drop(topo);

        self.listeners.notify_disconnect(&connection);
        Ok(())
    }

    // --- Settings ---

    /// Replaces the settings and propagates them to every node in creation order.
    ///
    /// Each node resizes its ports, discarding their contents. Waits for any
    /// in-flight pass to finish first; passes that start while the change is
    /// being applied run suspended (see [`ProcessingContext::is_suspended`]).
    ///
    /// The gate is taken before the working lock, so an in-flight pass that
    /// edits the graph can still finish. Calling this from inside an
    /// [`execute`](Self::execute) callback on the same thread never returns.
    pub fn update_settings(&self, settings: Settings) {
        let _gate = self.pass_gate.write();
        let mut topo = self.working.lock();

        topo.settings = settings;
        topo.settings_version += 1;
        for node in &topo.nodes {
            node.settings_update(&settings);
        }
        tracing::debug!(
            "graph_settings: {settings} (version {}, {} nodes)",
            topo.settings_version,
            topo.nodes.len()
        );
        self.publish(&mut topo);
    }

    // --- Listeners ---

    /// Registers a listener. Returns a handle for [`remove_listener`](Self::remove_listener).
    pub fn add_listener(&self, listener: Arc<dyn GraphListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    /// Unregisters a listener. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // --- Audio path ---

    /// Runs `f` with a processing context bound to the current snapshot.
    ///
    /// Loads the snapshot handle exactly once and never blocks: if a settings
    /// change is being applied, the context is suspended and its
    /// [`process`](ProcessingContext::process) does nothing.
    pub fn execute<R>(&self, f: impl FnOnce(&ProcessingContext<'_>) -> R) -> R {
        let gate = self.pass_gate.try_read();
        let snapshot = self.published.load_full();
        let listeners = self.listeners.load();
        let pass = self.passes.fetch_add(1, Ordering::Relaxed);
        let ctx = ProcessingContext::new(snapshot, listeners, pass, gate);
        f(&ctx)
    }

    // --- Introspection ---

    /// The currently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.published.load_full()
    }

    /// The settings currently in effect.
    pub fn settings(&self) -> Settings {
        self.published.load().settings()
    }

    /// Looks up a node in the published topology.
    pub fn node(&self, id: NodeId) -> Option<Arc<dyn Node>> {
        self.published.load().node(id).cloned()
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.published.load().node_count()
    }

    /// Number of live connections.
    pub fn connection_count(&self) -> usize {
        self.published.load().connections().len()
    }

    /// Live connections, in the order they were made.
    pub fn connections(&self) -> Vec<Connection> {
        self.published.load().connections().to_vec()
    }

    // --- Internal helpers ---

    /// Builds a snapshot of the working topology and swaps it in.
    fn publish(&self, topo: &mut Topology) {
        topo.revision += 1;
        let snapshot = Snapshot::build(
            topo.revision,
            topo.settings,
            topo.settings_version,
            topo.nodes.clone(),
            topo.connections.clone(),
        );
        tracing::debug!(
            "graph_publish: revision {} ({} nodes, {} connections)",
            topo.revision,
            topo.nodes.len(),
            topo.connections.len()
        );
        self.published.store(Arc::new(snapshot));
    }
}

impl Default for AudioGraph {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl core::fmt::Debug for AudioGraph {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AudioGraph")
            .field("snapshot", &self.published.load())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
