#![allow(dead_code)]

use swarm_engine::device::{GpuContext, GpuInit};

/// Headless context, or `None` when this machine has no suitable adapter.
///
/// Set `SWARM_REQUIRE_GPU=1` to turn a missing adapter into a failure.
pub fn gpu() -> Option<GpuContext> {
    match pollster::block_on(GpuContext::headless(&GpuInit::default())) {
        Ok(ctx) => Some(ctx),
        Err(e) if std::env::var("SWARM_REQUIRE_GPU").as_deref() == Ok("1") => {
            panic!("SWARM_REQUIRE_GPU is set but no adapter is usable: {e:#}")
        }
        Err(e) => {
            eprintln!("skipping: {e:#}");
            None
        }
    }
}

/// Moves each record by its velocity and sets every velocity to (0.01, 0, 0).
pub const STEP_WGSL: &str = r#"
@group(1) @binding(0) var<storage, read_write> vPosition: array<f32>;
@group(1) @binding(1) var<storage, read_write> vVelocity: array<f32>;

@vertex
fn vs_main(
    @builtin(vertex_index) i: u32,
    @location(0) aPosition: vec3<f32>,
    @location(1) aVelocity: vec3<f32>,
) -> @builtin(position) vec4<f32> {
    let p = aPosition + aVelocity;
    let base = i * 3u;
    vPosition[base] = p.x;
    vPosition[base + 1u] = p.y;
    vPosition[base + 2u] = p.z;
    vVelocity[base] = 0.01;
    vVelocity[base + 1u] = 0.0;
    vVelocity[base + 2u] = 0.0;
    return vec4<f32>(0.0, 0.0, 2.0, 1.0);
}

@fragment
fn fs_main() {}
"#;

pub fn assert_close(actual: &[f32], expected: &[f32]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-5, "{actual:?} vs {expected:?}");
    }
}
