//! Graph observers and their isolated notification.
//!
//! A [`GraphListener`] is told about connection edits (on the control path)
//! and about every node visited during a pass (on the audio path). Listener
//! failures never escape: a returned error is logged with `tracing::warn!`, a
//! panic is caught and logged with `tracing::error!`, and notification moves
//! on to the next listener.
//!
//! The registry is a copy-on-write list behind an `ArcSwap`. Every
//! notification round loads one stable copy up front, so a listener may add
//! or remove listeners from inside a callback; the change takes effect from
//! the next round.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwap;

use super::edge::Connection;
use super::node::Node;

/// Error type listeners report failures with.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Observer of graph events. Every hook defaults to a no-op.
pub trait GraphListener: Send + Sync {
    /// A connection was added.
    fn on_connect(&self, _connection: &Connection) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A connection was removed.
    fn on_disconnect(&self, _connection: &Connection) -> Result<(), ListenerError> {
        Ok(())
    }

    /// A node is about to be processed in the current pass.
    ///
    /// Runs inline on the audio path.
    fn on_process(&self, _node: &dyn Node) -> Result<(), ListenerError> {
        Ok(())
    }
}

/// Handle returned by [`AudioGraph::add_listener`](super::AudioGraph::add_listener).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) type ListenerList = Vec<(ListenerId, Arc<dyn GraphListener>)>;

/// Copy-on-write listener registry.
pub(crate) struct ListenerSet {
    list: ArcSwap<ListenerList>,
    next_id: AtomicU64,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self {
            list: ArcSwap::from_pointee(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn add(&self, listener: Arc<dyn GraphListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.list.rcu(|current| {
            let mut next = ListenerList::clone(current);
            next.push((id, Arc::clone(&listener)));
            next
        });
        id
    }

    pub fn remove(&self, id: ListenerId) -> bool {
        let mut removed = false;
        self.list.rcu(|current| {
            let mut next = ListenerList::clone(current);
            let before = next.len();
            next.retain(|(lid, _)| *lid != id);
            removed = next.len() != before;
            next
        });
        removed
    }

    pub fn len(&self) -> usize {
        self.list.load().len()
    }

    /// Stable copy of the current registry.
    pub fn load(&self) -> Arc<ListenerList> {
        self.list.load_full()
    }

    pub fn notify_connect(&self, connection: &Connection) {
        notify(&self.load(), "on_connect", |l| l.on_connect(connection));
    }

    pub fn notify_disconnect(&self, connection: &Connection) {
        notify(&self.load(), "on_disconnect", |l| l.on_disconnect(connection));
    }
}

/// Invokes `hook` on every listener in `list`, isolating failures.
pub(crate) fn notify<F>(list: &ListenerList, hook: &'static str, mut f: F)
where
    F: FnMut(&dyn GraphListener) -> Result<(), ListenerError>,
{
    for (id, listener) in list {
        match catch_unwind(AssertUnwindSafe(|| f(listener.as_ref()))) {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::warn!(listener = ?id, hook, error = %err, "listener reported an error");
            }
            Err(payload) => {
                let msg = payload
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                    .unwrap_or("<non-string panic payload>");
                tracing::error!(listener = ?id, hook, panic = msg, "listener panicked");
            }
        }
    }
}
