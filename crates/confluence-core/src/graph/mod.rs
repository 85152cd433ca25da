//! Audio graph: topology, snapshot publication, and processing passes.
//!
//! # Architecture
//!
//! The graph is split between two paths that never block each other:
//!
//! - **Control path**: [`AudioGraph`] edits a private working topology under
//!   a mutex: node creation, [`connect_audio`](AudioGraph::connect_audio),
//!   [`disconnect_audio`](AudioGraph::disconnect_audio),
//!   [`update_settings`](AudioGraph::update_settings). Every edit is validated
//!   first (single writer per target port, no cycles) and ends by publishing a
//!   new immutable [`Snapshot`].
//! - **Audio path**: [`execute`](AudioGraph::execute) loads the current
//!   snapshot once and hands the host a [`ProcessingContext`]. Calling
//!   [`process`](ProcessingContext::process) visits every node in the
//!   snapshot's precomputed topological order.
//!
//! # Ports and buffers
//!
//! Nodes own their ports. Each [`SourcePort`] and [`TargetPort`] holds one
//! block of [`Sample`]s behind a reader/writer lock scoped to a single copy,
//! so a control-path settings change and an audio-path read never observe a
//! half-resized buffer.
//!
//! # Visitation order
//!
//! Kahn's algorithm over the snapshot's connections. Among nodes whose
//! predecessors have all run, the earliest created runs first. Isolated nodes
//! therefore run in creation order.
//!
//! # Example
//!
//! ```rust
//! use confluence_core::{AudioGraph, Settings};
//!
//! let graph = AudioGraph::new(Settings::new(4, 48_000).unwrap());
//! let a = graph.create_system_source(None).unwrap();
//! let b = graph.create_system_source(None).unwrap();
//! let sum = graph.create_sum(None).unwrap();
//! let out = graph.create_system_target(None).unwrap();
//!
//! graph.connect_audio(a.port(), &sum.create_port_target("a").unwrap()).unwrap();
//! graph.connect_audio(b.port(), &sum.create_port_target("b").unwrap()).unwrap();
//! graph.connect_audio(sum.source_port(), out.port()).unwrap();
//!
//! a.port().copy_in(&[0.25f64; 4]);
//! b.port().copy_in(&[0.5f64; 4]);
//! graph.execute(|ctx| ctx.process());
//!
//! assert_eq!(out.port().to_vec(), vec![0.75; 4]);
//! ```

mod context;
pub mod edge;
mod listener;
pub mod node;
pub mod port;
mod processing;
pub mod schedule;

pub use context::ProcessingContext;
pub use edge::Connection;
pub use listener::{GraphListener, ListenerError, ListenerId};
pub use node::{Node, NodeId, NodeKind};
pub use port::{PortDirection, PortId, PortKey, PortRef, Sample, SourcePort, TargetPort};
pub use processing::{AudioGraph, GraphError};
pub use schedule::Snapshot;
