//! GPU side of the harness.
//!
//! - `context` acquires the adapter and device and owns surface configuration.
//! - `pipeline` compiles the WGSL program into the quad pipeline and its
//!   single uniform bind group layout.
//! - `uniforms` defines the 24-byte frame payload and the buffer it lives in.
//! - `state` glues the three together and implements
//!   [`FrameSink`](crate::frame_loop::FrameSink) for the hosts.

mod context;
mod pipeline;
mod state;
pub mod uniforms;

pub(crate) use context::AcquiredGpu;
pub(crate) use state::GpuState;
