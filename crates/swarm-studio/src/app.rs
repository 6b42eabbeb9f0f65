use std::time::Duration;

use anyhow::Context;
use glam::{Mat4, Vec2};
use rand::Rng;

use swarm_engine::capture::{StreamPipeline, StreamPipelineDesc};
use swarm_engine::core::{App, AppControl, FrameCtx};
use swarm_engine::device::Gpu;
use swarm_engine::driver::{
    camera_position_for, chase_target_for, pointer_ndc, Camera, DebugParams, FrameDriver,
    FrameInputs, InstanceBinding,
};
use swarm_engine::input::Key;
use swarm_engine::shader::{Program, ProgramDesc, Uniforms};
use swarm_engine::time::FpsMeter;
use swarm_engine::vertex::{AttributeDesc, AttributeSet};

use crate::config::StudioConfig;
use crate::controls::{self, ATTRACT_RATE, FPS, SPEED};
use crate::geometry::BoxGeometry;

const SIMULATE_WGSL: &str = include_str!("../shaders/simulate.wgsl");
const BOX_WGSL: &str = include_str!("../shaders/box.wgsl");

/// Boxes chasing the pointer.
pub struct SwarmApp {
    config: StudioConfig,
    params: DebugParams,
    camera: Camera,
    fps: FpsMeter,
    driver: Option<FrameDriver>,
    sim_uniforms: Uniforms,
    render_uniforms: Uniforms,
}

impl SwarmApp {
    pub fn new(config: StudioConfig) -> Self {
        let params = controls::default_params(config.max_instances, config.initial_instances);
        let fps = FpsMeter::new(Duration::from_secs_f32(config.report_interval.max(0.1)));
        Self {
            config,
            params,
            camera: Camera::default(),
            fps,
            driver: None,
            sim_uniforms: Uniforms::new(),
            render_uniforms: Uniforms::new(),
        }
    }

    fn build_driver(&self, gpu: &mut Gpu<'_>) -> anyhow::Result<FrameDriver> {
        let capacity = self.config.max_instances.max(1);
        let records = capacity as usize * 3;
        let mut rng = rand::rng();

        let positions: Vec<f32> = (0..records).map(|_| rng.random_range(-1.0..1.0)).collect();
        let colors: Vec<f32> = (0..records).map(|_| rng.random::<f32>()).collect();

        let ctx = gpu.context_mut();
        let pipeline = StreamPipeline::new(
            ctx,
            StreamPipelineDesc {
                label: "swarm simulate",
                vertex: SIMULATE_WGSL,
                fragment: SIMULATE_WGSL,
                capture_outputs: &["vPosition", "vVelocity"],
                attributes: vec![
                    AttributeDesc::float("position", 3, positions),
                    AttributeDesc::float("velocity", 3, Vec::new()),
                ],
                capacity,
            },
        )
        .context("failed to build the simulation pipeline")?;

        let geometry = BoxGeometry::unit();
        let mesh = AttributeSet::new(
            ctx,
            "box",
            &[
                AttributeDesc::float("position", 3, geometry.positions).at_location(0),
                AttributeDesc::float("normal", 3, geometry.normals).at_location(1),
                AttributeDesc::float("instancePosition", 3, vec![0.0; records])
                    .per_instance()
                    .at_location(2),
                AttributeDesc::float("instanceVelocity", 3, vec![0.0; records])
                    .per_instance()
                    .at_location(3),
                AttributeDesc::float("instanceColor", 3, colors)
                    .per_instance()
                    .at_location(4),
            ],
            Some(&geometry.indices),
        )
        .context("failed to upload the box mesh")?;

        let program = Program::compile(
            ctx.device(),
            &ProgramDesc {
                label: "box",
                vertex: BOX_WGSL,
                fragment: BOX_WGSL,
                capture_outputs: &[],
            },
        )
        .context("failed to compile the box shader")?;

        let driver = FrameDriver::new(
            ctx,
            pipeline,
            mesh,
            program,
            vec![
                InstanceBinding::new("instancePosition", "position"),
                InstanceBinding::new("instanceVelocity", "velocity"),
            ],
        )?;
        Ok(driver)
    }
}

impl App for SwarmApp {
    fn on_gpu_ready(&mut self, gpu: &mut Gpu<'_>) -> anyhow::Result<()> {
        let size = gpu.size();
        self.camera.set_viewport_size(size.width, size.height);
        self.driver = Some(self.build_driver(gpu)?);
        log::info!(
            "swarm ready: {} / {} instances (arrows: count/speed, brackets: attraction)",
            controls::instance_count(&self.params, self.config.max_instances),
            self.config.max_instances
        );
        Ok(())
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.pressed(Key::Escape) {
            return AppControl::Exit;
        }
        controls::apply_keys(&mut self.params, ctx.input_frame);

        let (width, height) = ctx.window.physical_size();
        self.camera.set_viewport_size(width, height);

        let ndc = ctx
            .input
            .pointer_pos
            .map_or(Vec2::ZERO, |(x, y)| pointer_ndc(x, y, width, height));
        self.camera.position = camera_position_for(ndc);

        self.sim_uniforms
            .set("uTime", ctx.time.elapsed)
            .set("uDeltaTime", ctx.time.dt)
            .set("uSpeed", self.params.get(SPEED).unwrap_or(0.0))
            .set("uAttractRate", self.params.get(ATTRACT_RATE).unwrap_or(0.0))
            .set("uChaseTarget", chase_target_for(ndc));
        self.render_uniforms.set("uBoxScale", self.config.box_scale);

        if let Some(fps) = self.fps.frame(ctx.time.now) {
            self.params.set_readout(FPS, format!("{fps:.1}"));
            log::info!(
                "fps {fps:.1}, {} instances",
                controls::instance_count(&self.params, self.config.max_instances)
            );
        }

        let Some(driver) = self.driver.as_mut() else {
            return AppControl::Continue;
        };
        let inputs = FrameInputs {
            sim_uniforms: &self.sim_uniforms,
            render_uniforms: &self.render_uniforms,
            camera: &self.camera,
            world: Mat4::IDENTITY,
            instance_count: controls::instance_count(&self.params, self.config.max_instances),
        };

        ctx.render(|gpu, target| driver.frame(gpu, target, &inputs))
    }

    fn on_exit(&mut self, gpu: &mut Gpu<'_>) {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.destroy(gpu.context_mut()) {
                log::warn!("failed to release swarm buffers: {e}");
            }
        }
    }
}
