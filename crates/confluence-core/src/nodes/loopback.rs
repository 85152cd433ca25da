//! Loopback send/return pair: feedback with a mandatory one-block delay.
//!
//! The send and the return are two separate graph nodes joined only by a
//! shared delay line, never by a connection. The topology stays acyclic, so
//! the return's output can be routed back upstream of the send.
//!
//! Whatever order the scheduler visits the pair in, the return emits, during
//! pass `n`, the block the send stored during pass `n - 1`. When no such block
//! exists (first pass, a skipped pass, or right after a settings change) the
//! return emits silence.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::graph::{
    Connection, Node, NodeId, NodeKind, PortId, PortRef, ProcessingContext, Sample, SourcePort,
    TargetPort,
};
use crate::settings::Settings;

/// Port key of a [`LoopbackSend`]'s input.
pub const LOOPBACK_SEND_PORT: &str = "in";

/// Port key of a [`LoopbackReturn`]'s output.
pub const LOOPBACK_RETURN_PORT: &str = "out";

/// Two-slot block store shared by a send and its return.
#[derive(Debug)]
struct DelayLine {
    /// Written by the send during `pending_pass`.
    pending: Vec<Sample>,
    pending_pass: Option<u64>,
    /// Promoted from `pending` once a later pass begins.
    ready: Vec<Sample>,
    ready_pass: Option<u64>,
}

impl DelayLine {
    fn new(block_size: usize) -> Self {
        Self {
            pending: vec![0.0; block_size],
            pending_pass: None,
            ready: vec![0.0; block_size],
            ready_pass: None,
        }
    }

    fn reset(&mut self, block_size: usize) {
        *self = Self::new(block_size);
    }

    /// Promotes the pending block once `pass` has moved past it.
    fn advance(&mut self, pass: u64) {
        if let Some(p) = self.pending_pass
            && p < pass
        {
            core::mem::swap(&mut self.pending, &mut self.ready);
            self.ready_pass = Some(p);
            self.pending_pass = None;
        }
    }

    fn store(&mut self, pass: u64, block: &[Sample]) {
        self.advance(pass);
        let n = block.len().min(self.pending.len());
        self.pending[..n].copy_from_slice(&block[..n]);
        self.pending[n..].fill(0.0);
        self.pending_pass = Some(pass);
    }

    /// The block stored during `pass - 1`, if there is one.
    fn previous(&mut self, pass: u64) -> Option<&[Sample]> {
        self.advance(pass);
        match self.ready_pass {
            Some(p) if p + 1 == pass => Some(self.ready.as_slice()),
            _ => None,
        }
    }
}

/// Feedback entry: stores its input for the next pass.
#[derive(Debug)]
pub struct LoopbackSend {
    id: NodeId,
    port: Arc<TargetPort>,
    line: Arc<Mutex<DelayLine>>,
}

impl LoopbackSend {
    /// The input port.
    pub fn port(&self) -> &Arc<TargetPort> {
        &self.port
    }
}

impl Node for LoopbackSend {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::LoopbackSend
    }

    fn ports(&self) -> Vec<PortRef> {
        vec![PortRef::Target(Arc::clone(&self.port))]
    }

    fn settings_update(&self, settings: &Settings) {
        self.port.update_settings(settings);
        self.line.lock().reset(settings.block_size());
    }

    fn process(&self, ctx: &ProcessingContext<'_>) {
        if let Some(conn) = ctx.incoming(self.id).next() {
            self.port.copy_from(conn.source_port());
        }
        let mut line = self.line.lock();
        self.port.read(|block| line.store(ctx.pass_index(), block));
    }

    fn on_incoming_connections_changed(&self, _connections: &[Connection]) {}
}

/// Feedback exit: emits the block its send stored during the previous pass.
#[derive(Debug)]
pub struct LoopbackReturn {
    id: NodeId,
    port: Arc<SourcePort>,
    line: Arc<Mutex<DelayLine>>,
}

impl LoopbackReturn {
    /// The output port.
    pub fn port(&self) -> &Arc<SourcePort> {
        &self.port
    }
}

impl Node for LoopbackReturn {
    fn id(&self) -> NodeId {
        self.id
    }

    fn kind(&self) -> NodeKind {
        NodeKind::LoopbackReturn
    }

    fn ports(&self) -> Vec<PortRef> {
        vec![PortRef::Source(Arc::clone(&self.port))]
    }

    fn settings_update(&self, settings: &Settings) {
        self.port.update_settings(settings);
        self.line.lock().reset(settings.block_size());
    }

    fn process(&self, ctx: &ProcessingContext<'_>) {
        let mut line = self.line.lock();
        match line.previous(ctx.pass_index()) {
            Some(block) => {
                self.port.copy_in(block);
            }
            None => self.port.write(|buf| buf.fill(0.0)),
        }
    }

    fn on_incoming_connections_changed(&self, _connections: &[Connection]) {}
}

/// A send and its return, created together by
/// [`AudioGraph::create_loopback_pair`](crate::AudioGraph::create_loopback_pair).
#[derive(Debug, Clone)]
pub struct LoopbackPair {
    /// Feedback entry.
    pub send: Arc<LoopbackSend>,
    /// Feedback exit.
    pub ret: Arc<LoopbackReturn>,
}

impl LoopbackPair {
    pub(crate) fn new(send_id: NodeId, return_id: NodeId, settings: &Settings) -> Self {
        let line = Arc::new(Mutex::new(DelayLine::new(settings.block_size())));
        Self {
            send: Arc::new(LoopbackSend {
                id: send_id,
                port: Arc::new(TargetPort::new(
                    PortId::new(send_id, LOOPBACK_SEND_PORT),
                    settings,
                )),
                line: Arc::clone(&line),
            }),
            ret: Arc::new(LoopbackReturn {
                id: return_id,
                port: Arc::new(SourcePort::new(
                    PortId::new(return_id, LOOPBACK_RETURN_PORT),
                    settings,
                )),
                line,
            }),
        }
    }
}
