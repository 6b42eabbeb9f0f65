//! Frame timing.

mod fps;
mod frame_clock;

pub use fps::FpsMeter;
pub use frame_clock::{FrameClock, FrameTime};
