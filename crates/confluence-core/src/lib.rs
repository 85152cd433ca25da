//! Confluence Core - real-time audio graph engine
//!
//! A host (hardware audio callback, plugin shell, or test harness) assembles
//! a network of nodes, wires their ports together, and runs one processing
//! pass per audio block. Topology edits on the control path never block the
//! audio path, and a pass never observes a half-edited graph.
//!
//! # Core Abstractions
//!
//! ## Graph
//!
//! - [`AudioGraph`] - Topology manager: node creation, validated connections,
//!   settings propagation, listener registration, [`execute`](AudioGraph::execute)
//! - [`Snapshot`] - Immutable published topology with precomputed visitation order
//! - [`ProcessingContext`] - One pass over one snapshot
//! - [`GraphListener`] - Isolated observer of connection and process events
//!
//! ## Nodes and Ports
//!
//! - [`Node`] - Object-safe capability trait implemented by every vertex
//! - [`SourcePort`] / [`TargetPort`] - Lock-guarded sample buffers with
//!   bounded, format-converting [`copy_in`](SourcePort::copy_in) /
//!   [`copy_out`](TargetPort::copy_out)
//! - [`SystemSource`], [`SystemTarget`], [`SumNode`], [`LoopbackPair`] - Built-in kinds
//!
//! ## Settings
//!
//! - [`Settings`] - Block size and sample rate, replaced as a whole
//!
//! # Example
//!
//! ```rust
//! use confluence_core::{AudioGraph, Settings};
//!
//! let graph = AudioGraph::new(Settings::new(64, 48_000).unwrap());
//! let input = graph.create_system_source(None).unwrap();
//! let output = graph.create_system_target(None).unwrap();
//! graph.connect_audio(input.port(), output.port()).unwrap();
//!
//! // Per audio block: copy in, process, copy out.
//! let hw_in = [0.5f32; 64];
//! let mut hw_out = [0.0f32; 64];
//! graph.execute(|ctx| {
//!     input.port().copy_in(&hw_in);
//!     ctx.process();
//!     output.port().copy_out(&mut hw_out);
//! });
//! assert_eq!(hw_out, hw_in);
//! ```

pub mod graph;
pub mod nodes;
pub mod settings;

pub use graph::{
    AudioGraph, Connection, GraphError, GraphListener, ListenerError, ListenerId, Node, NodeId,
    NodeKind, PortDirection, PortId, PortKey, PortRef, ProcessingContext, Sample, Snapshot,
    SourcePort, TargetPort,
};
pub use nodes::{LoopbackPair, LoopbackReturn, LoopbackSend, SumNode, SystemSource, SystemTarget};
pub use settings::{DEFAULT_BLOCK_SIZE, DEFAULT_SAMPLE_RATE, Settings, SettingsError};
