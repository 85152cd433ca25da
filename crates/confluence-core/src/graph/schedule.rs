//! Published topology snapshots.
//!
//! A [`Snapshot`] is an immutable, fully-built copy of the graph topology:
//! nodes in creation order, the live connections, and a precomputed
//! topological visitation order. The control path builds one after every
//! successful edit and swaps it in atomically; the audio path loads it once
//! per [`execute`](super::AudioGraph::execute) call and never sees partial
//! state.
//!
//! The visitation order is computed here, at publish time, so that a
//! processing pass is a plain iteration with no allocation.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::Arc;

use super::edge::Connection;
use super::node::{Node, NodeId};
use crate::settings::Settings;

/// Immutable topology view shared with the audio path via `Arc`.
pub struct Snapshot {
    revision: u64,
    settings: Settings,
    settings_version: u64,
    nodes: Vec<Arc<dyn Node>>,
    index: HashMap<NodeId, usize>,
    connections: Vec<Connection>,
    /// Indices into `nodes`, topologically sorted.
    order: Vec<usize>,
}

impl Snapshot {
    /// Builds a snapshot, computing its visitation order.
    pub(crate) fn build(
        revision: u64,
        settings: Settings,
        settings_version: u64,
        nodes: Vec<Arc<dyn Node>>,
        connections: Vec<Connection>,
    ) -> Self {
        let index: HashMap<NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id(), i))
            .collect();
        let order = topological_order(nodes.len(), &index, &connections);
        Self {
            revision,
            settings,
            settings_version,
            nodes,
            index,
            connections,
            order,
        }
    }

    /// An empty topology, used before the first edit.
    pub(crate) fn empty(settings: Settings) -> Self {
        Self::build(0, settings, 0, Vec::new(), Vec::new())
    }

    /// Topology revision this snapshot was published at.
    ///
    /// Strictly increases with every publication.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Settings in effect when this snapshot was published.
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Version of [`settings`](Self::settings); increments on every settings change.
    pub fn settings_version(&self) -> u64 {
        self.settings_version
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> &[Arc<dyn Node>] {
        &self.nodes
    }

    /// Looks up a node by identifier.
    pub fn node(&self, id: NodeId) -> Option<&Arc<dyn Node>> {
        self.index.get(&id).map(|&i| &self.nodes[i])
    }

    /// Live connections, in the order they were made.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Connections feeding the given node.
    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Connection> {
        self.connections
            .iter()
            .filter(move |c| c.target_node() == id)
    }

    /// Nodes in visitation (topological) order.
    pub fn order(&self) -> impl Iterator<Item = &Arc<dyn Node>> {
        self.order.iter().map(|&i| &self.nodes[i])
    }

    /// Node identifiers in visitation order.
    pub fn visitation_order(&self) -> Vec<NodeId> {
        self.order().map(|n| n.id()).collect()
    }
}

impl core::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Snapshot")
            .field("revision", &self.revision)
            .field("settings", &self.settings)
            .field("settings_version", &self.settings_version)
            .field("nodes", &self.nodes.len())
            .field("connections", &self.connections)
            .finish()
    }
}

/// Kahn's algorithm with a creation-order tie-break.
///
/// Among nodes whose predecessors have all been visited, the one created
/// earliest goes first. The topology is acyclic by construction; should any
/// node remain unvisited anyway, it is appended in creation order so that every
/// node still runs exactly once.
fn topological_order(
    node_count: usize,
    index: &HashMap<NodeId, usize>,
    connections: &[Connection],
) -> Vec<usize> {
    let mut in_degree = vec![0usize; node_count];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); node_count];

    for conn in connections {
        let (Some(&from), Some(&to)) = (
            index.get(&conn.source_node()),
            index.get(&conn.target_node()),
        ) else {
            continue;
        };
        successors[from].push(to);
        in_degree[to] += 1;
    }

    let mut ready: BinaryHeap<Reverse<usize>> = (0..node_count)
        .filter(|&i| in_degree[i] == 0)
        .map(Reverse)
        .collect();
    let mut order = Vec::with_capacity(node_count);
    let mut visited = vec![false; node_count];

    while let Some(Reverse(idx)) = ready.pop() {
        order.push(idx);
        visited[idx] = true;
        for &next in &successors[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() != node_count {
        tracing::error!(
            unvisited = node_count - order.len(),
            "topology contains a cycle; appending unvisited nodes in creation order"
        );
        order.extend((0..node_count).filter(|&i| !visited[i]));
    }

    order
}
