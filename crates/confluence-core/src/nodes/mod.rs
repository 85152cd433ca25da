//! Built-in node kinds.
//!
//! - [`SystemSource`] / [`SystemTarget`]: the graph's boundary with host audio
//! - [`SumNode`]: N-to-1 mixer with on-demand target ports
//! - [`LoopbackSend`] / [`LoopbackReturn`]: feedback through a one-block delay

mod loopback;
mod sum;
mod system;

pub use loopback::{
    LOOPBACK_RETURN_PORT, LOOPBACK_SEND_PORT, LoopbackPair, LoopbackReturn, LoopbackSend,
};
pub use sum::{SUM_SOURCE_PORT, SumNode};
pub use system::{SYSTEM_SOURCE_PORT, SYSTEM_TARGET_PORT, SystemSource, SystemTarget};
