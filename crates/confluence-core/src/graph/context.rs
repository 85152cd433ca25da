//! Processing context: one pass over one snapshot.
//!
//! [`AudioGraph::execute`](super::AudioGraph::execute) builds a
//! [`ProcessingContext`] bound to the snapshot current at that instant and
//! hands it to the host callback. The host decides when to call
//! [`process`](ProcessingContext::process), so it can copy input in before
//! and copy output out after, all within one block.

use std::sync::Arc;

use parking_lot::RwLockReadGuard;

use super::edge::Connection;
use super::listener::{ListenerList, notify};
use super::node::NodeId;
use super::schedule::Snapshot;
use crate::settings::Settings;

/// A processing pass bound to one published snapshot.
pub struct ProcessingContext<'g> {
    snapshot: Arc<Snapshot>,
    listeners: Arc<ListenerList>,
    pass_index: u64,
    /// Held for the whole pass; `None` while a settings change is in flight.
    gate: Option<RwLockReadGuard<'g, ()>>,
}

impl<'g> ProcessingContext<'g> {
    pub(crate) fn new(
        snapshot: Arc<Snapshot>,
        listeners: Arc<ListenerList>,
        pass_index: u64,
        gate: Option<RwLockReadGuard<'g, ()>>,
    ) -> Self {
        Self {
            snapshot,
            listeners,
            pass_index,
            gate,
        }
    }

    /// Visits every node of the bound snapshot in topological order.
    ///
    /// For each node, every registered listener's `on_process` hook runs
    /// first, then the node's own [`process`](super::Node::process). Upstream
    /// nodes have always written their output by the time a node runs.
    ///
    /// A suspended pass visits nothing.
    pub fn process(&self) {
        if self.is_suspended() {
            tracing::trace!(
                pass = self.pass_index,
                "settings change in flight; pass suspended"
            );
            return;
        }

        tracing::trace!(
            pass = self.pass_index,
            revision = self.snapshot.revision(),
            nodes = self.snapshot.node_count(),
            "processing pass"
        );

        for node in self.snapshot.order() {
            if !self.listeners.is_empty() {
                notify(&self.listeners, "on_process", |l| l.on_process(node.as_ref()));
            }
            node.process(self);
        }
    }

    /// The snapshot this pass is bound to.
    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    /// Settings the bound snapshot was published under.
    pub fn settings(&self) -> Settings {
        self.snapshot.settings()
    }

    /// Block size for this pass.
    #[inline]
    pub fn block_size(&self) -> usize {
        self.snapshot.settings().block_size()
    }

    /// Monotonic index of this pass, unique per `execute` call.
    #[inline]
    pub fn pass_index(&self) -> u64 {
        self.pass_index
    }

    /// True when this pass overlaps a settings change and will not process.
    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.gate.is_none()
    }

    /// Connections feeding `node` in the bound snapshot.
    pub fn incoming(&self, node: NodeId) -> impl Iterator<Item = &Connection> {
        self.snapshot.incoming(node)
    }
}
