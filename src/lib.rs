//! Per-frame audio graph nodes.
//!
//! Every node is driven one sample-frame at a time by an external scheduler.
//! Parameters are resolved each frame from either a stored value or the first
//! channel of a connected input port, see [`params`].
//!
//! The [`harness`] module carries a small single-threaded scheduler that is
//! used by the tests and benches, and is handy when embedding a few nodes
//! without a full graph engine.

pub mod config;
pub mod context;
pub mod harness;
pub mod msg;
pub mod node;
pub mod nodes;
pub mod params;
pub mod ports;
pub mod sample;

/// Upper bound on the channels carried by a single port.
///
/// Port frames are stack allocated, so channel counts can change from one
/// frame to the next without touching the allocator.
pub const MAX_CHANNELS: usize = 16;

/// Upper bound on the input ports of a node driven by the harness.
pub const MAX_INPUTS: usize = 32;
