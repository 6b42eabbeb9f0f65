//! GPU device, surface and buffer ownership.
//!
//! - [`GpuContext`]: device + queue + buffer arena, usable without a window
//! - [`Gpu`]: a `GpuContext` bound to a window surface with a depth target
//! - [`RenderState`]: explicit fixed-function state per pass

mod arena;
mod context;
mod gpu;
mod init;
mod state;
mod surface;

pub use arena::{Arena, BufferArena, BufferHandle, BufferInfo, Handle};
pub use context::GpuContext;
pub use gpu::{Gpu, GpuFrame, SurfaceErrorAction};
pub use init::GpuInit;
pub use state::{DepthState, RenderState, TargetFormats};
