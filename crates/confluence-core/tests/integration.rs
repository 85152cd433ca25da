//! Integration tests for the confluence-core audio graph.
//!
//! Exercises the public API end to end: boundary copies with format
//! conversion, mixing, visitation order, edit validation, listener isolation,
//! loopback feedback, and concurrent control/audio access.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use confluence_core::{
    AudioGraph, Connection, GraphError, GraphListener, ListenerError, Node, NodeId, NodeKind,
    PortId, PortRef, ProcessingContext, Settings, SourcePort, TargetPort,
};
use parking_lot::Mutex;

fn graph(block: usize) -> AudioGraph {
    AudioGraph::new(Settings::new(block, 48_000).unwrap())
}

// ============================================================================
// 1. Boundary scenarios
// ============================================================================

#[test]
fn identity_chain_passes_audio_through() {
    let g = graph(8);
    let s = g.create_system_source(None).unwrap();
    let t = g.create_system_target(None).unwrap();
    g.connect_audio(s.port(), t.port()).unwrap();
    let rec = Arc::new(Recorder::default());
    g.add_listener(Arc::clone(&rec) as Arc<dyn GraphListener>);

    let mut out = [0.0f32; 8];
    let order = g.execute(|ctx| {
        s.port().copy_in(&[0.25f32; 8]);
        ctx.process();
        t.port().copy_out(&mut out);
        ctx.snapshot().visitation_order()
    });

    assert_eq!(out, [0.25f32; 8]);
    assert_eq!(order, vec![s.id(), t.id()]);
    assert_eq!(*rec.visited.lock(), vec![s.id(), t.id()]);
}

#[test]
fn identity_chain_with_pcm_boundary() {
    let g = graph(4);
    let s = g.create_system_source(None).unwrap();
    let t = g.create_system_target(None).unwrap();
    g.connect_audio(s.port(), t.port()).unwrap();

    s.port().copy_in(&[8_192i16, -8_192, 16_384, 0]);
    g.execute(|ctx| ctx.process());
    let mut out = [0i16; 4];
    t.port().copy_out(&mut out);
    assert_eq!(out, [8_192, -8_192, 16_384, 0]);
}

#[test]
fn summing_two_sources() {
    let g = graph(16);
    let a = g.create_system_source(None).unwrap();
    let b = g.create_system_source(None).unwrap();
    let m = g.create_sum(None).unwrap();
    let t0 = m.create_port_target("t0").unwrap();
    let t1 = m.create_port_target("t1").unwrap();
    g.connect_audio(a.port(), &t0).unwrap();
    g.connect_audio(b.port(), &t1).unwrap();

    a.port().copy_in(&[0.25f64; 16]);
    b.port().copy_in(&[0.40f64; 16]);
    g.execute(|ctx| ctx.process());

    for (i, s) in m.source_port().to_vec().into_iter().enumerate() {
        assert!((s - 0.65).abs() < 1e-12, "sample {i}: expected 0.65, got {s}");
    }
}

#[test]
fn isolated_vertices_are_visited_but_not_written() {
    let g = graph(4);
    let s = g.create_system_source(None).unwrap();
    let t = g.create_system_target(None).unwrap();
    s.port().copy_in(&[0.9f64; 4]);
    let rec = Arc::new(Recorder::default());
    g.add_listener(Arc::clone(&rec) as Arc<dyn GraphListener>);

    let order = g.execute(|ctx| {
        ctx.process();
        ctx.snapshot().visitation_order()
    });

    assert_eq!(order, vec![s.id(), t.id()]);
    assert_eq!(*rec.visited.lock(), vec![s.id(), t.id()]);
    assert_eq!(t.port().to_vec(), vec![0.0; 4]);
}

#[test]
fn settings_change_empties_every_buffer() {
    let g = graph(4);
    let s = g.create_system_source(None).unwrap();
    let t = g.create_system_target(None).unwrap();
    g.connect_audio(s.port(), t.port()).unwrap();
    s.port().copy_in(&[0.5f64; 4]);
    g.execute(|ctx| ctx.process());

    g.update_settings(Settings::new(8, 96_000).unwrap());
    assert_eq!(s.port().to_vec(), vec![0.0; 8]);
    assert_eq!(t.port().to_vec(), vec![0.0; 8]);
    assert_eq!(g.execute(|ctx| ctx.settings().sample_rate()), 96_000);
}

// ============================================================================
// 2. Visitation order
// ============================================================================

#[test]
fn downstream_created_first_still_runs_last() {
    let g = graph(4);
    let t = g.create_system_target(None).unwrap();
    let m = g.create_sum(None).unwrap();
    let s = g.create_system_source(None).unwrap();
    g.connect_audio(m.source_port(), t.port()).unwrap();
    g.connect_audio(s.port(), &m.create_port_target("in").unwrap())
        .unwrap();

    assert_eq!(g.snapshot().visitation_order(), vec![s.id(), m.id(), t.id()]);
}

#[test]
fn ready_nodes_tie_break_by_creation_order() {
    let g = graph(4);
    let x = g.create_system_source(None).unwrap();
    let m = g.create_sum(None).unwrap();
    let y = g.create_system_source(None).unwrap();
    g.connect_audio(y.port(), &m.create_port_target("in").unwrap())
        .unwrap();

    // x and y are ready at once; x was created first. m waits for y.
    assert_eq!(g.snapshot().visitation_order(), vec![x.id(), y.id(), m.id()]);
}

// ============================================================================
// 3. Edit validation
// ============================================================================

#[test]
fn second_writer_to_target_rejected() {
    let g = graph(4);
    let a = g.create_system_source(None).unwrap();
    let b = g.create_system_source(None).unwrap();
    let t = g.create_system_target(None).unwrap();
    g.connect_audio(a.port(), t.port()).unwrap();

    let err = g.connect_audio(b.port(), t.port()).unwrap_err();
    assert_eq!(err, GraphError::PortAlreadyConnected(t.port().id().clone()));
}

#[test]
fn disconnect_unknown_edge_rejected() {
    let g = graph(4);
    let s = g.create_system_source(None).unwrap();
    let t = g.create_system_target(None).unwrap();
    let err = g.disconnect_audio(s.port(), t.port()).unwrap_err();
    assert!(matches!(err, GraphError::PortNotConnected { .. }));
}

#[test]
fn feedback_edge_rejected() {
    let g = graph(4);
    let a = g.create_sum(None).unwrap();
    let b = g.create_sum(None).unwrap();
    g.connect_audio(a.source_port(), &b.create_port_target("in").unwrap())
        .unwrap();

    let err = g
        .connect_audio(b.source_port(), &a.create_port_target("fb").unwrap())
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::CycleWouldBeCreated {
            from: b.id(),
            to: a.id()
        }
    );
    assert_eq!(g.connection_count(), 1);
}

#[test]
fn duplicate_ids_rejected() {
    let g = graph(4);
    let id = NodeId::generate();
    g.create_system_target(Some(id)).unwrap();
    assert_eq!(
        g.create_system_source(Some(id)).unwrap_err(),
        GraphError::DuplicateNodeId(id)
    );
    assert!(matches!(
        g.create_loopback_pair(None, Some(id)),
        Err(GraphError::DuplicateNodeId(_))
    ));

    let m = g.create_sum(None).unwrap();
    m.create_port_target("t0").unwrap();
    assert!(matches!(
        m.create_port_target("t0"),
        Err(GraphError::DuplicatePortId(_))
    ));
}

#[test]
fn error_messages_name_the_offender() {
    let id = NodeId::generate();
    let msg = GraphError::DuplicateNodeId(id).to_string();
    assert!(msg.contains(&id.to_string()));
}

// ============================================================================
// 4. Custom nodes
// ============================================================================

/// Doubles its input.
struct Doubler {
    id: NodeId,
    input: Arc<TargetPort>,
    output: Arc<SourcePort>,
}

impl Doubler {
    fn new(settings: &Settings) -> Self {
        let id = NodeId::generate();
        Self {
            id,
            input: Arc::new(TargetPort::new(PortId::new(id, "in"), settings)),
            output: Arc::new(SourcePort::new(PortId::new(id, "out"), settings)),
        }
    }
}

impl Node for Doubler {
    fn id(&self) -> NodeId {
        self.id
    }
    fn kind(&self) -> NodeKind {
        NodeKind::Custom("doubler")
    }
    fn ports(&self) -> Vec<PortRef> {
        vec![
            PortRef::Target(Arc::clone(&self.input)),
            PortRef::Source(Arc::clone(&self.output)),
        ]
    }
    fn settings_update(&self, settings: &Settings) {
        self.input.update_settings(settings);
        self.output.update_settings(settings);
    }
    fn process(&self, ctx: &ProcessingContext<'_>) {
        if let Some(conn) = ctx.incoming(self.id).next() {
            self.input.copy_from(conn.source_port());
        }
        let doubled: Vec<f64> = self.input.read(|b| b.iter().map(|s| s * 2.0).collect());
        self.output.copy_in(doubled.as_slice());
    }
    fn on_incoming_connections_changed(&self, _connections: &[Connection]) {}
}

#[test]
fn custom_node_participates_in_pass() {
    let g = graph(4);
    let s = g.create_system_source(None).unwrap();
    let d = g.add_node(Arc::new(Doubler::new(&g.settings()))).unwrap();
    let t = g.create_system_target(None).unwrap();
    g.connect_audio(s.port(), &d.input).unwrap();
    g.connect_audio(&d.output, t.port()).unwrap();

    s.port().copy_in(&[0.2f64; 4]);
    g.execute(|ctx| ctx.process());
    assert_eq!(t.port().to_vec(), vec![0.4; 4]);
    assert_eq!(g.node(d.id).map(|n| n.kind()), Some(NodeKind::Custom("doubler")));
}

#[test]
fn added_node_is_resized_to_graph_settings() {
    let g = graph(32);
    let stale = Settings::new(4, 48_000).unwrap();
    let d = g.add_node(Arc::new(Doubler::new(&stale))).unwrap();
    assert_eq!(d.input.len(), 32);
    assert_eq!(d.output.len(), 32);
}

// ============================================================================
// 5. Listeners
// ============================================================================

#[derive(Default)]
struct Recorder {
    connects: AtomicUsize,
    disconnects: AtomicUsize,
    visited: Mutex<Vec<NodeId>>,
}

impl GraphListener for Recorder {
    fn on_connect(&self, _c: &Connection) -> Result<(), ListenerError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn on_disconnect(&self, _c: &Connection) -> Result<(), ListenerError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
    fn on_process(&self, node: &dyn Node) -> Result<(), ListenerError> {
        self.visited.lock().push(node.id());
        Ok(())
    }
}

struct Faulty;

impl GraphListener for Faulty {
    fn on_connect(&self, _c: &Connection) -> Result<(), ListenerError> {
        Err("refused".into())
    }
    fn on_process(&self, _node: &dyn Node) -> Result<(), ListenerError> {
        panic!("faulty listener");
    }
}

#[test]
fn listener_sees_visits_in_order() {
    let g = graph(4);
    let rec = Arc::new(Recorder::default());
    g.add_listener(Arc::clone(&rec) as Arc<dyn GraphListener>);
    let s = g.create_system_source(None).unwrap();
    let t = g.create_system_target(None).unwrap();
    g.connect_audio(s.port(), t.port()).unwrap();

    g.execute(|ctx| ctx.process());
    assert_eq!(*rec.visited.lock(), vec![s.id(), t.id()]);
    assert_eq!(rec.connects.load(Ordering::SeqCst), 1);
}

#[test]
fn faulty_listener_does_not_disturb_processing() {
    let g = graph(4);
    g.add_listener(Arc::new(Faulty));
    let rec = Arc::new(Recorder::default());
    g.add_listener(Arc::clone(&rec) as Arc<dyn GraphListener>);

    let s = g.create_system_source(None).unwrap();
    let t = g.create_system_target(None).unwrap();
    g.connect_audio(s.port(), t.port()).unwrap();
    s.port().copy_in(&[0.5f64; 4]);
    g.execute(|ctx| ctx.process());

    assert_eq!(t.port().to_vec(), vec![0.5; 4]);
    assert_eq!(rec.connects.load(Ordering::SeqCst), 1);
    assert_eq!(rec.visited.lock().len(), 2);
}

#[test]
fn removed_listener_goes_quiet() {
    let g = graph(4);
    let rec = Arc::new(Recorder::default());
    let id = g.add_listener(Arc::clone(&rec) as Arc<dyn GraphListener>);
    assert_eq!(g.listener_count(), 1);
    assert!(g.remove_listener(id));
    assert!(!g.remove_listener(id));

    let s = g.create_system_source(None).unwrap();
    let t = g.create_system_target(None).unwrap();
    g.connect_audio(s.port(), t.port()).unwrap();
    g.disconnect_audio(s.port(), t.port()).unwrap();
    g.execute(|ctx| ctx.process());

    assert_eq!(rec.connects.load(Ordering::SeqCst), 0);
    assert_eq!(rec.disconnects.load(Ordering::SeqCst), 0);
    assert!(rec.visited.lock().is_empty());
}

// ============================================================================
// 6. Loopback feedback
// ============================================================================

#[test]
fn loopback_feedback_through_a_sum() {
    // in ──► sum ──► send ⇢ ret ──► out
    //        ▲                 │
    //        └─────────────────┘  one block late
    let g = graph(1);
    let input = g.create_system_source(None).unwrap();
    let sum = g.create_sum(None).unwrap();
    let pair = g.create_loopback_pair(None, None).unwrap();
    let out = g.create_system_target(None).unwrap();

    g.connect_audio(input.port(), &sum.create_port_target("dry").unwrap())
        .unwrap();
    g.connect_audio(pair.ret.port(), &sum.create_port_target("fb").unwrap())
        .unwrap();
    g.connect_audio(sum.source_port(), pair.send.port()).unwrap();
    g.connect_audio(pair.ret.port(), out.port()).unwrap();

    let mut taps = Vec::new();
    for _ in 0..4 {
        input.port().copy_in(&[1.0f64]);
        g.execute(|ctx| ctx.process());
        taps.push(sum.source_port().to_vec()[0]);
    }
    // y[n] = 1 + y[n-1]
    assert_eq!(taps, vec![1.0, 2.0, 3.0, 4.0]);
}

// ============================================================================
// 7. Concurrency
// ============================================================================

#[test]
fn concurrent_edits_and_passes() {
    let g = Arc::new(graph(64));
    let s = g.create_system_source(None).unwrap();
    let m = g.create_sum(None).unwrap();
    let t = g.create_system_target(None).unwrap();
    let m_in = m.create_port_target("in").unwrap();
    g.connect_audio(m.source_port(), t.port()).unwrap();

    let stop = Arc::new(AtomicBool::new(false));
    let audio = {
        let g = Arc::clone(&g);
        let t = Arc::clone(&t);
        let stop = Arc::clone(&stop);
        thread::spawn(move || {
            let mut passes = 0usize;
            while !stop.load(Ordering::Relaxed) {
                g.execute(|ctx| {
                    let block = ctx.block_size();
                    ctx.process();
                    let snap = ctx.snapshot();
                    let order = snap.visitation_order();
                    assert_eq!(order.len(), snap.node_count());
                    for conn in snap.connections() {
                        let u = order.iter().position(|&n| n == conn.source_node());
                        let v = order.iter().position(|&n| n == conn.target_node());
                        assert!(u < v, "edge {conn} out of order");
                    }
                    if !ctx.is_suspended() {
                        assert_eq!(t.port().len(), block);
                    }
                });
                passes += 1;
            }
            passes
        })
    };

    for i in 0..200 {
        g.connect_audio(s.port(), &m_in).unwrap();
        g.disconnect_audio(s.port(), &m_in).unwrap();
        if i % 20 == 0 {
            g.update_settings(Settings::new(32 << (i % 3), 48_000).unwrap());
        }
    }

    stop.store(true, Ordering::Relaxed);
    let passes = audio.join().unwrap();
    assert!(passes > 0);
    assert_eq!(g.connection_count(), 1);
}
