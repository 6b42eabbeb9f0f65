use super::ctx::RenderTarget;
use crate::device::{GpuContext, RenderState};
use crate::error::{Error, Result};
use crate::shader::{PipelineKey, Program, Uniforms};
use crate::vertex::AttributeSet;

impl RenderTarget<'_> {
    /// Draws `set` with `program` under `state`.
    ///
    /// Indexed sets draw their whole index buffer, others every vertex.
    /// `instance_count` of 0 draws a single, non-instanced copy.
    pub fn draw(
        &mut self,
        ctx: &GpuContext,
        program: &mut Program,
        set: &AttributeSet,
        uniforms: &Uniforms,
        state: RenderState,
        instance_count: u32,
    ) -> Result<()> {
        let capacity = set.instance_capacity(ctx)?;
        if instance_count > capacity {
            return Err(Error::CapacityExceeded {
                requested: instance_count,
                capacity,
            });
        }

        let key = PipelineKey {
            vertex: set.vertex_layout(),
            state,
            formats: self.formats,
        };
        program.set_uniforms(uniforms)?;
        let pipeline = program.pipeline(ctx.device(), &key)?;
        program.upload_uniforms(ctx.device(), self.encoder);

        let viewport = self.viewport();
        if viewport.is_empty() {
            return Ok(());
        }
        let instances = 0..instance_count.max(1);

        let mut pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("swarm draw"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_viewport(
            viewport.x,
            viewport.y,
            viewport.width,
            viewport.height,
            0.0,
            1.0,
        );
        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, program.uniform_bind_group(), &[]);
        set.bind(ctx, &mut pass)?;

        if set.has_indices() {
            pass.draw_indexed(0..set.index_count(), 0, instances);
        } else {
            pass.draw(0..set.vertex_count(ctx)?, instances);
        }
        Ok(())
    }
}
