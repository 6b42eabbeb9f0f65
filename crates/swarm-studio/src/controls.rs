//! Keyboard bindings for the debug parameters.

use swarm_engine::driver::{DebugParams, Param};
use swarm_engine::input::{InputFrame, Key};

pub const INSTANCE_COUNT: &str = "instanceCount";
pub const SPEED: &str = "speed";
pub const ATTRACT_RATE: &str = "attractRate";
pub const FPS: &str = "fps";

/// `(decrease, increase, parameter)`
const BINDINGS: [(Key, Key, &str); 3] = [
    (Key::ArrowDown, Key::ArrowUp, INSTANCE_COUNT),
    (Key::ArrowLeft, Key::ArrowRight, SPEED),
    (Key::BracketLeft, Key::BracketRight, ATTRACT_RATE),
];

pub fn default_params(max_instances: u32, initial_instances: u32) -> DebugParams {
    let max = max_instances.max(1) as f32;
    let mut params = DebugParams::new();
    params
        .add(
            INSTANCE_COUNT,
            Param::new(initial_instances as f32, 1.0, max, (max / 16.0).ceil()),
        )
        .add(SPEED, Param::new(1.5, 0.0, 6.0, 0.25))
        .add(ATTRACT_RATE, Param::new(2.0, 0.0, 10.0, 0.5));
    params.set_readout(FPS, "-");
    params
}

/// Applies this frame's key presses. Returns true if anything changed.
pub fn apply_keys(params: &mut DebugParams, frame: &InputFrame) -> bool {
    let mut changed = false;
    for (down, up, name) in BINDINGS {
        let value = if frame.pressed(up) {
            params.step_up(name)
        } else if frame.pressed(down) {
            params.step_down(name)
        } else {
            continue;
        };
        if let Some(value) = value {
            log::info!("{name} = {value}");
            changed = true;
        }
    }
    changed
}

/// Instance count as an integer in `[1, max]`.
pub fn instance_count(params: &DebugParams, max_instances: u32) -> u32 {
    let value = params.get(INSTANCE_COUNT).unwrap_or(1.0);
    (value.round() as u32).clamp(1, max_instances.max(1))
}
