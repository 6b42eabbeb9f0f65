//! Per-frame orchestration of the stream pipeline and the instanced mesh.

mod camera;
mod frame;
mod params;

pub use camera::{camera_position_for, chase_target_for, pointer_ndc, Camera};
pub use frame::{FrameDriver, FrameInputs, InstanceBinding};
pub use params::{DebugParams, Param};
