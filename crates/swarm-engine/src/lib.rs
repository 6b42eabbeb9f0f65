//! GPU particle-swarm engine.
//!
//! The core is a double-buffered stream-out pipeline: a vertex-only pass
//! reads simulation state from one set of buffers and writes the next state
//! into the other, then the two swap roles. The written buffers feed an
//! instanced mesh draw directly, without a host round trip.
//!
//! Around that sits the runtime needed to host it: a window loop, input,
//! frame timing and logging.

pub mod capture;
pub mod core;
pub mod device;
pub mod driver;
mod error;
pub mod input;
pub mod logging;
pub mod render;
pub mod shader;
pub mod time;
pub mod vertex;
pub mod window;

pub use error::{Error, Result};
