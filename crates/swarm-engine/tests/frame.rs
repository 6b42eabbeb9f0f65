mod common;

use common::STEP_WGSL;
use glam::Mat4;
use swarm_engine::capture::{StreamPipeline, StreamPipelineDesc};
use swarm_engine::device::{GpuContext, RenderState};
use swarm_engine::driver::{Camera, FrameDriver, FrameInputs, InstanceBinding};
use swarm_engine::render::OffscreenTarget;
use swarm_engine::shader::{Program, ProgramDesc, Uniforms};
use swarm_engine::vertex::{AttributeDesc, AttributeSet};
use swarm_engine::Error;

const MESH_WGSL: &str = r#"
struct Camera {
    uWorldMatrix: mat4x4<f32>,
    uViewMatrix: mat4x4<f32>,
    uProjectionMatrix: mat4x4<f32>,
    uScale: f32,
}

@group(0) @binding(0) var<uniform> camera: Camera;

struct VertexOut {
    @builtin(position) clip: vec4<f32>,
    @location(0) tint: vec3<f32>,
}

@vertex
fn vs_main(
    @location(0) aPosition: vec3<f32>,
    @location(1) aOffset: vec3<f32>,
    @location(2) aTint: vec3<f32>,
) -> VertexOut {
    let world = camera.uWorldMatrix * vec4<f32>(aPosition * camera.uScale + aOffset, 1.0);
    var out: VertexOut;
    out.clip = camera.uProjectionMatrix * camera.uViewMatrix * world;
    out.tint = aTint;
    return out;
}

@fragment
fn fs_main(frag: VertexOut) -> @location(0) vec4<f32> {
    return vec4<f32>(frag.tint, 1.0);
}
"#;

fn driver(ctx: &mut GpuContext, mesh_capacity: usize) -> Result<FrameDriver, Error> {
    let pipeline = StreamPipeline::new(
        ctx,
        StreamPipelineDesc {
            label: "step",
            vertex: STEP_WGSL,
            fragment: STEP_WGSL,
            capture_outputs: &["vPosition", "vVelocity"],
            attributes: vec![
                AttributeDesc::float("position", 3, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]),
                AttributeDesc::float("velocity", 3, vec![]),
            ],
            capacity: 2,
        },
    )?;

    let mesh = AttributeSet::new(
        ctx,
        "tri",
        &[
            AttributeDesc::float(
                "position",
                3,
                vec![-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0],
            ),
            AttributeDesc::float("offset", 3, vec![0.0; 6]).per_instance(),
            AttributeDesc::float("tint", 3, vec![1.0; mesh_capacity * 3]).per_instance(),
        ],
        None,
    )?;

    let program = Program::compile(
        ctx.device(),
        &ProgramDesc {
            label: "tri",
            vertex: MESH_WGSL,
            fragment: MESH_WGSL,
            capture_outputs: &[],
        },
    )?;

    FrameDriver::new(
        ctx,
        pipeline,
        mesh,
        program,
        vec![InstanceBinding::new("offset", "position")],
    )
}

#[test]
fn frame_clears_steps_and_draws() {
    let Some(mut ctx) = common::gpu() else { return };
    let mut driver = driver(&mut ctx, 2)
        .unwrap()
        .with_clear_color(wgpu::Color {
            r: 0.0,
            g: 0.0,
            b: 1.0,
            a: 1.0,
        })
        .with_render_state(RenderState::opaque().with_cull_mode(None));

    let offscreen = OffscreenTarget::new(&ctx, 64, 64);
    let mut camera = Camera::default();
    camera.set_viewport_size(64, 64);
    let render_uniforms = Uniforms::new().with("uScale", 1.0f32);
    let sim_uniforms = Uniforms::new();

    for _ in 0..2 {
        let mut encoder = ctx.create_encoder("test frame");
        {
            let mut target = offscreen.target(&mut encoder);
            driver
                .frame(
                    &ctx,
                    &mut target,
                    &FrameInputs {
                        sim_uniforms: &sim_uniforms,
                        render_uniforms: &render_uniforms,
                        camera: &camera,
                        world: Mat4::IDENTITY,
                        instance_count: 2,
                    },
                )
                .unwrap();
        }
        ctx.flush(encoder);
    }

    // The mesh now reads the buffer the last pass wrote.
    let offset = driver.mesh().find_buffer("offset").unwrap();
    let latest = driver
        .pipeline()
        .read()
        .attribute_set
        .find_buffer("position")
        .unwrap();
    assert_eq!(offset, latest);
    // Both frames reuse one capture pipeline.
    assert_eq!(driver.pipeline().program().pipeline_count(), 1);

    let pixels = offscreen.read_rgba8(&ctx).unwrap();
    assert_eq!(&pixels[..4], &[0, 0, 255, 255]);
    // Instance 0 sits near the origin, which projects to the center.
    let center = (32 * 64 + 32) * 4;
    assert_eq!(&pixels[center..center + 4], &[255, 255, 255, 255]);

    driver.destroy(&mut ctx).unwrap();
    assert!(ctx.buffers().is_empty());
}

#[test]
fn undersized_meshes_are_rejected() {
    let Some(mut ctx) = common::gpu() else { return };
    let result = driver(&mut ctx, 1);
    assert!(matches!(
        result,
        Err(Error::CapacityExceeded {
            requested: 2,
            capacity: 1
        })
    ));
}

#[test]
fn empty_frames_only_clear() {
    let Some(mut ctx) = common::gpu() else { return };
    let mut driver = driver(&mut ctx, 2).unwrap();

    let offscreen = OffscreenTarget::new(&ctx, 16, 16);
    let camera = Camera::default();
    let render_uniforms = Uniforms::new().with("uScale", 1.0f32);
    let sim_uniforms = Uniforms::new();
    let before = driver
        .pipeline()
        .read()
        .attribute_set
        .find_buffer("position")
        .unwrap();

    let mut encoder = ctx.create_encoder("test empty frame");
    {
        let mut target = offscreen.target(&mut encoder);
        driver
            .frame(
                &ctx,
                &mut target,
                &FrameInputs {
                    sim_uniforms: &sim_uniforms,
                    render_uniforms: &render_uniforms,
                    camera: &camera,
                    world: Mat4::IDENTITY,
                    instance_count: 0,
                },
            )
            .unwrap();
    }
    ctx.flush(encoder);

    let read = driver.pipeline().read().attribute_set;
    assert_eq!(read.find_buffer("position").unwrap(), before);
    assert_eq!(driver.mesh().find_buffer("offset").unwrap(), before);
    assert_eq!(ctx.read_f32(before).unwrap(), vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);

    let pixels = offscreen.read_rgba8(&ctx).unwrap();
    assert!(pixels.chunks_exact(4).all(|p| p == [0, 0, 0, 255]));

    driver.destroy(&mut ctx).unwrap();
}
