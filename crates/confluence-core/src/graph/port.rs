//! Directional audio ports and their guarded sample buffers.
//!
//! Every node owns its ports. A [`SourcePort`] carries the audio a node
//! produces; a [`TargetPort`] is where an upstream source is connected in.
//! Each port holds one block of [`Sample`]s behind a reader/writer lock that
//! is taken only around a single copy or traversal, never across a whole
//! processing pass.
//!
//! Host glue moves audio across the graph boundary with
//! [`SourcePort::copy_in`] and [`TargetPort::copy_out`]. Both accept any
//! `dasp_sample` format convertible to and from the native `f64` sample:
//! hardware-native `f32` floats and `i16` PCM are the common cases.

use std::sync::Arc;

use dasp_sample::{FromSample, ToSample};
use parking_lot::RwLock;

use super::node::NodeId;
use crate::settings::Settings;

/// Native sample type used inside the engine.
pub type Sample = f64;

/// Caller-chosen local identifier of a port within its node.
///
/// Cheap to clone (shared string).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortKey(Arc<str>);

impl PortKey {
    /// Creates a key from any string.
    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PortKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for PortKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl core::fmt::Display for PortKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Globally unique port identity: owning node plus local key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PortId {
    node: NodeId,
    key: PortKey,
}

impl PortId {
    /// Creates a port identity.
    pub fn new(node: NodeId, key: impl Into<PortKey>) -> Self {
        Self {
            node,
            key: key.into(),
        }
    }

    /// The node that owns this port.
    #[inline]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The port's local key within its node.
    #[inline]
    pub fn key(&self) -> &PortKey {
        &self.key
    }
}

impl core::fmt::Display for PortId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.node, self.key)
    }
}

/// Direction of a port relative to its owning node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PortDirection {
    /// Produces audio; the tail of a connection.
    Source,
    /// Receives audio; the head of a connection.
    Target,
}

/// One block of samples behind a reader/writer lock.
#[derive(Debug)]
struct PortBuffer {
    samples: RwLock<Vec<Sample>>,
}

impl PortBuffer {
    fn new(len: usize) -> Self {
        Self {
            samples: RwLock::new(vec![0.0; len]),
        }
    }

    fn len(&self) -> usize {
        self.samples.read().len()
    }

    fn read<R>(&self, f: impl FnOnce(&[Sample]) -> R) -> R {
        let guard = self.samples.read();
        f(&guard)
    }

    fn write<R>(&self, f: impl FnOnce(&mut [Sample]) -> R) -> R {
        let mut guard = self.samples.write();
        f(&mut guard)
    }

    fn copy_in<S>(&self, src: &[S]) -> usize
    where
        S: ToSample<Sample> + Copy,
    {
        let mut buf = self.samples.write();
        let n = src.len().min(buf.len());
        for (dst, &s) in buf[..n].iter_mut().zip(src) {
            *dst = s.to_sample_();
        }
        buf[n..].fill(0.0);
        n
    }

    fn copy_out<S>(&self, dst: &mut [S]) -> usize
    where
        S: FromSample<Sample>,
    {
        let buf = self.samples.read();
        let n = dst.len().min(buf.len());
        for (d, &s) in dst[..n].iter_mut().zip(buf.iter()) {
            *d = S::from_sample_(s);
        }
        n
    }

    /// Reallocates to `len` samples of silence. Prior contents are discarded.
    fn reallocate(&self, len: usize) {
        *self.samples.write() = vec![0.0; len];
    }
}

/// Output endpoint of a node.
///
/// Written by the owning node during its process step (or by host code via
/// [`copy_in`](Self::copy_in) for system sources) and read by downstream
/// nodes.
#[derive(Debug)]
pub struct SourcePort {
    id: PortId,
    buffer: PortBuffer,
}

impl SourcePort {
    /// Creates a silent source port sized to `settings.block_size()`.
    pub fn new(id: PortId, settings: &Settings) -> Self {
        Self {
            id,
            buffer: PortBuffer::new(settings.block_size()),
        }
    }

    /// The port's identity.
    pub fn id(&self) -> &PortId {
        &self.id
    }

    /// Current buffer length in samples.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` over the buffer under a shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&[Sample]) -> R) -> R {
        self.buffer.read(f)
    }

    /// Runs `f` over the buffer under an exclusive lock.
    ///
    /// Intended for the owning node's process step.
    pub fn write<R>(&self, f: impl FnOnce(&mut [Sample]) -> R) -> R {
        self.buffer.write(f)
    }

    /// Copies an external block into the port, converting to [`Sample`].
    ///
    /// Copies `min(src.len(), self.len())` samples and zero-fills the rest of
    /// the port. Returns the number of samples copied.
    pub fn copy_in<S>(&self, src: &[S]) -> usize
    where
        S: ToSample<Sample> + Copy,
    {
        self.buffer.copy_in(src)
    }

    /// Returns a copy of the current contents.
    pub fn to_vec(&self) -> Vec<Sample> {
        self.read(<[Sample]>::to_vec)
    }

    /// Resizes the buffer to the new block size, resetting it to silence.
    pub fn update_settings(&self, settings: &Settings) {
        self.buffer.reallocate(settings.block_size());
    }
}

/// Input endpoint of a node.
///
/// At most one connection may feed a target port at a time.
#[derive(Debug)]
pub struct TargetPort {
    id: PortId,
    buffer: PortBuffer,
}

impl TargetPort {
    /// Creates a silent target port sized to `settings.block_size()`.
    pub fn new(id: PortId, settings: &Settings) -> Self {
        Self {
            id,
            buffer: PortBuffer::new(settings.block_size()),
        }
    }

    /// The port's identity.
    pub fn id(&self) -> &PortId {
        &self.id
    }

    /// Current buffer length in samples.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` over the buffer under an exclusive lock.
    pub fn write<R>(&self, f: impl FnOnce(&mut [Sample]) -> R) -> R {
        self.buffer.write(f)
    }

    /// Runs `f` over the buffer under a shared lock (metering, monitoring).
    pub fn read<R>(&self, f: impl FnOnce(&[Sample]) -> R) -> R {
        self.buffer.read(f)
    }

    /// Copies the port's contents out to an external block.
    ///
    /// Copies `min(dst.len(), self.len())` samples; the rest of `dst` is left
    /// untouched. Returns the number of samples copied.
    pub fn copy_out<S>(&self, dst: &mut [S]) -> usize
    where
        S: FromSample<Sample>,
    {
        self.buffer.copy_out(dst)
    }

    /// Copies an upstream source port's block into this port.
    ///
    /// Takes the source's shared lock, then this port's exclusive lock. On a
    /// length mismatch the overlap is copied and the remainder zeroed.
    pub fn copy_from(&self, source: &SourcePort) -> usize {
        source.read(|src| self.buffer.copy_in(src))
    }

    /// Returns a copy of the current contents.
    pub fn to_vec(&self) -> Vec<Sample> {
        self.read(<[Sample]>::to_vec)
    }

    /// Resizes the buffer to the new block size, resetting it to silence.
    pub fn update_settings(&self, settings: &Settings) {
        self.buffer.reallocate(settings.block_size());
    }
}

/// A handle to either kind of port, as listed by [`Node::ports`](super::Node::ports).
#[derive(Clone, Debug)]
pub enum PortRef {
    /// An output endpoint.
    Source(Arc<SourcePort>),
    /// An input endpoint.
    Target(Arc<TargetPort>),
}

impl PortRef {
    /// The referenced port's identity.
    pub fn id(&self) -> &PortId {
        match self {
            Self::Source(port) => port.id(),
            Self::Target(port) => port.id(),
        }
    }

    /// The referenced port's direction.
    pub fn direction(&self) -> PortDirection {
        match self {
            Self::Source(_) => PortDirection::Source,
            Self::Target(_) => PortDirection::Target,
        }
    }

    /// Current buffer length of the referenced port.
    pub fn len(&self) -> usize {
        match self {
            Self::Source(port) => port.len(),
            Self::Target(port) => port.len(),
        }
    }

    /// Returns true if the referenced port's buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
