mod common;

use common::{assert_close, STEP_WGSL};
use swarm_engine::Error;
use swarm_engine::capture::{CaptureTarget, StreamPipeline, StreamPipelineDesc};
use swarm_engine::device::{BufferHandle, GpuContext};
use swarm_engine::shader::{Program, ProgramDesc, Uniforms};
use swarm_engine::vertex::{AttributeDesc, AttributeSet};

fn step_pipeline(ctx: &mut GpuContext, capacity: u32) -> StreamPipeline {
    StreamPipeline::new(
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
            capacity,
        },
    )
    .unwrap()
}

fn handles(set: &AttributeSet) -> Vec<BufferHandle> {
    set.buffers().into_iter().map(|(_, h)| h).collect()
}

fn assert_crosswise(pipeline: &StreamPipeline) {
    let (read, write) = (pipeline.read(), pipeline.write());
    assert_eq!(read.capture_target.buffers(), handles(write.attribute_set));
    assert_eq!(write.capture_target.buffers(), handles(read.attribute_set));
}

fn step(ctx: &GpuContext, pipeline: &mut StreamPipeline, count: u32) {
    let mut encoder = ctx.create_encoder("test step");
    pipeline
        .run_capture_pass(ctx, &mut encoder, &Uniforms::new(), count)
        .unwrap();
    ctx.flush(encoder);
    pipeline.swap();
}

fn read_state(ctx: &GpuContext, pipeline: &StreamPipeline) -> (Vec<f32>, Vec<f32>) {
    let set = pipeline.read().attribute_set;
    (
        ctx.read_f32(set.find_buffer("position").unwrap()).unwrap(),
        ctx.read_f32(set.find_buffer("velocity").unwrap()).unwrap(),
    )
}

#[test]
fn records_write_into_each_other() {
    let Some(mut ctx) = common::gpu() else { return };
    let mut pipeline = step_pipeline(&mut ctx, 2);

    assert_crosswise(&pipeline);

    let first_read = handles(pipeline.read().attribute_set);
    let first_write = handles(pipeline.write().attribute_set);
    assert_ne!(first_read, first_write);

    pipeline.swap();
    assert_crosswise(&pipeline);
    assert_eq!(handles(pipeline.read().attribute_set), first_write);
    assert_eq!(handles(pipeline.write().attribute_set), first_read);

    pipeline.swap();
    assert_crosswise(&pipeline);
    assert_eq!(handles(pipeline.read().attribute_set), first_read);

    pipeline.destroy(&mut ctx).unwrap();
    assert!(ctx.buffers().is_empty());
}

#[test]
fn initial_state_is_zero_filled_to_capacity() {
    let Some(mut ctx) = common::gpu() else { return };
    let pipeline = step_pipeline(&mut ctx, 3);

    let (position, velocity) = read_state(&ctx, &pipeline);
    assert_eq!(position, vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]);
    assert_eq!(velocity, vec![0.0; 9]);

    pipeline.destroy(&mut ctx).unwrap();
}

#[test]
fn capture_pass_advances_the_state() {
    let Some(mut ctx) = common::gpu() else { return };
    let mut pipeline = step_pipeline(&mut ctx, 2);

    step(&ctx, &mut pipeline, 2);
    let (position, velocity) = read_state(&ctx, &pipeline);
    assert_close(&position, &[0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
    assert_close(&velocity, &[0.01, 0.0, 0.0, 0.01, 0.0, 0.0]);

    step(&ctx, &mut pipeline, 2);
    let (position, _) = read_state(&ctx, &pipeline);
    assert_close(&position, &[0.01, 0.0, 0.0, 1.01, 1.0, 1.0]);

    pipeline.destroy(&mut ctx).unwrap();
}

#[test]
fn partial_passes_leave_the_tail_untouched() {
    let Some(mut ctx) = common::gpu() else { return };
    let mut pipeline = step_pipeline(&mut ctx, 2);

    step(&ctx, &mut pipeline, 1);
    let (_, velocity) = read_state(&ctx, &pipeline);
    assert_close(&velocity[..3], &[0.01, 0.0, 0.0]);
    assert_close(&velocity[3..], &[0.0, 0.0, 0.0]);

    pipeline.destroy(&mut ctx).unwrap();
}

#[test]
fn counts_beyond_capacity_are_rejected() {
    let Some(mut ctx) = common::gpu() else { return };
    let mut pipeline = step_pipeline(&mut ctx, 2);

    let mut encoder = ctx.create_encoder("test overflow");
    let err = pipeline
        .run_capture_pass(&ctx, &mut encoder, &Uniforms::new(), 3)
        .unwrap_err();
    assert_eq!(
        err,
        Error::CapacityExceeded {
            requested: 3,
            capacity: 2
        }
    );
    drop(encoder);

    pipeline.destroy(&mut ctx).unwrap();
}

#[test]
fn mismatched_outputs_are_rejected() {
    let Some(mut ctx) = common::gpu() else { return };

    let result = StreamPipeline::new(
        &mut ctx,
        StreamPipelineDesc {
            label: "short",
            vertex: STEP_WGSL,
            fragment: STEP_WGSL,
            capture_outputs: &["vPosition", "vVelocity"],
            attributes: vec![AttributeDesc::float("position", 3, vec![])],
            capacity: 2,
        },
    );
    assert!(matches!(result, Err(Error::CaptureMismatch { .. })));
    assert!(ctx.buffers().is_empty());
}

#[test]
fn capture_targets_follow_program_order() {
    let Some(mut ctx) = common::gpu() else { return };

    let program = Program::compile(
        ctx.device(),
        &ProgramDesc {
            label: "step",
            vertex: STEP_WGSL,
            fragment: STEP_WGSL,
            capture_outputs: &["vVelocity", "vPosition"],
        },
    )
    .unwrap();
    let names: Vec<&str> = program
        .capture_outputs()
        .iter()
        .map(|s| s.name.as_str())
        .collect();
    assert_eq!(names, ["vVelocity", "vPosition"]);

    let set = AttributeSet::new(
        &mut ctx,
        "dest",
        &[
            AttributeDesc::float("a", 3, vec![0.0; 6]).dynamic(),
            AttributeDesc::float("b", 3, vec![0.0; 6]).dynamic(),
        ],
        None,
    )
    .unwrap();
    let a = set.find_buffer("a").unwrap();
    let b = set.find_buffer("b").unwrap();

    let destinations = [("vPosition", a), ("vVelocity", b)];
    let target = CaptureTarget::new(&ctx, &program, &destinations, 2).unwrap();
    assert_eq!(target.buffers(), vec![b, a]);
    assert_eq!(target.buffer("vPosition"), Some(a));

    let positional = CaptureTarget::from_buffers(&ctx, &program, &[a, b], 2).unwrap();
    assert_eq!(positional.buffer("vVelocity"), Some(a));

    assert!(matches!(
        CaptureTarget::new(&ctx, &program, &[("vPosition", a)], 2),
        Err(Error::CaptureMismatch { .. })
    ));
    assert!(matches!(
        CaptureTarget::new(&ctx, &program, &[("vPosition", a), ("vVelocity", b)], 3),
        Err(Error::CaptureMismatch { .. })
    ));

    set.destroy(&mut ctx).unwrap();
}

#[test]
fn static_buffers_cannot_be_captured_into() {
    let Some(mut ctx) = common::gpu() else { return };

    let program = Program::compile(
        ctx.device(),
        &ProgramDesc {
            label: "step",
            vertex: STEP_WGSL,
            fragment: STEP_WGSL,
            capture_outputs: &["vPosition", "vVelocity"],
        },
    )
    .unwrap();
    let set = AttributeSet::new(
        &mut ctx,
        "static",
        &[
            AttributeDesc::float("a", 3, vec![0.0; 6]),
            AttributeDesc::float("b", 3, vec![0.0; 6]),
        ],
        None,
    )
    .unwrap();

    let buffers: Vec<BufferHandle> = set.buffers().into_iter().map(|(_, h)| h).collect();
    assert!(matches!(
        CaptureTarget::from_buffers(&ctx, &program, &buffers, 2),
        Err(Error::CaptureMismatch { .. })
    ));

    set.destroy(&mut ctx).unwrap();
}
