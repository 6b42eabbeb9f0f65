use glam::Mat4;

use super::camera::Camera;
use crate::capture::StreamPipeline;
use crate::device::{GpuContext, RenderState};
use crate::error::{Error, Result};
use crate::render::RenderTarget;
use crate::shader::{Program, Uniforms};
use crate::vertex::AttributeSet;

/// Feeds a render-mesh attribute from a stream attribute.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct InstanceBinding {
    pub mesh_attribute: String,
    pub stream_attribute: String,
}

impl InstanceBinding {
    pub fn new(mesh_attribute: impl Into<String>, stream_attribute: impl Into<String>) -> Self {
        Self {
            mesh_attribute: mesh_attribute.into(),
            stream_attribute: stream_attribute.into(),
        }
    }
}

/// Per-frame values supplied by the host.
#[derive(Debug, Clone, Copy)]
pub struct FrameInputs<'a> {
    /// Uniforms for the capture pass (time, delta, simulation parameters).
    pub sim_uniforms: &'a Uniforms,

    /// Extra uniforms for the mesh draw, applied after the camera's.
    pub render_uniforms: &'a Uniforms,

    pub camera: &'a Camera,
    pub world: Mat4,
    pub instance_count: u32,
}

/// Runs one simulation step and draws the instanced mesh from its output.
pub struct FrameDriver {
    pipeline: StreamPipeline,
    mesh: AttributeSet,
    mesh_program: Program,
    bindings: Vec<InstanceBinding>,
    clear_color: wgpu::Color,
    render_state: RenderState,
}

impl FrameDriver {
    /// Checks every binding and points the mesh at the pipeline's current state.
    pub fn new(
        ctx: &GpuContext,
        pipeline: StreamPipeline,
        mut mesh: AttributeSet,
        mesh_program: Program,
        bindings: Vec<InstanceBinding>,
    ) -> Result<Self> {
        rebind(ctx, &pipeline, &mut mesh, &bindings)?;

        let capacity = mesh.instance_capacity(ctx)?;
        if capacity < pipeline.capacity() {
            return Err(Error::CapacityExceeded {
                requested: pipeline.capacity(),
                capacity,
            });
        }

        Ok(Self {
            pipeline,
            mesh,
            mesh_program,
            bindings,
            clear_color: wgpu::Color::BLACK,
            render_state: RenderState::opaque(),
        })
    }

    pub fn with_clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_render_state(mut self, state: RenderState) -> Self {
        self.render_state = state;
        self
    }

    pub fn pipeline(&self) -> &StreamPipeline {
        &self.pipeline
    }

    pub fn mesh(&self) -> &AttributeSet {
        &self.mesh
    }

    pub fn bindings(&self) -> &[InstanceBinding] {
        &self.bindings
    }

    /// Records one frame into `target`.
    ///
    /// Order: clear, camera, capture pass, swap, rebind, draw. The caller
    /// submits the encoder afterwards. With an instance count of 0 only the
    /// clear is recorded and the simulation state stays where it was.
    pub fn frame(
        &mut self,
        ctx: &GpuContext,
        target: &mut RenderTarget<'_>,
        inputs: &FrameInputs<'_>,
    ) -> Result<()> {
        target.clear(self.clear_color);
        if inputs.instance_count == 0 {
            return Ok(());
        }

        let mut uniforms = inputs
            .camera
            .uniforms(inputs.world, self.mesh_program.uniform_layout());
        for (name, value) in inputs.render_uniforms.iter() {
            uniforms.set(name, value.clone());
        }

        self.pipeline.run_capture_pass(
            ctx,
            target.encoder,
            inputs.sim_uniforms,
            inputs.instance_count,
        )?;
        self.pipeline.swap();

        rebind(ctx, &self.pipeline, &mut self.mesh, &self.bindings)?;

        target.draw(
            ctx,
            &mut self.mesh_program,
            &self.mesh,
            &uniforms,
            self.render_state,
            inputs.instance_count,
        )
    }

    /// Releases the mesh's and the pipeline's buffers.
    pub fn destroy(self, ctx: &mut GpuContext) -> Result<()> {
        self.mesh.destroy(ctx)?;
        self.pipeline.destroy(ctx)
    }
}

fn rebind(
    ctx: &GpuContext,
    pipeline: &StreamPipeline,
    mesh: &mut AttributeSet,
    bindings: &[InstanceBinding],
) -> Result<()> {
    let source = pipeline.read().attribute_set;
    for binding in bindings {
        let buffer = source.find_buffer(&binding.stream_attribute)?;
        mesh.set_buffer(ctx, &binding.mesh_attribute, buffer)?;
    }
    Ok(())
}
