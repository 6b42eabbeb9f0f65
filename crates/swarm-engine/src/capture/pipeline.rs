use super::ping_pong::PingPong;
use super::target::CaptureTarget;
use crate::device::{BufferHandle, GpuContext, RenderState, TargetFormats};
use crate::error::{Error, Result};
use crate::shader::{PipelineKey, Program, ProgramDesc, UniformValue, Uniforms};
use crate::vertex::{AttributeData, AttributeDesc, AttributeSet, AttributeUsage};

/// Inputs for [`StreamPipeline::new`].
#[derive(Debug, Clone)]
pub struct StreamPipelineDesc<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,

    /// Output `i` is fed back into attribute `i`.
    pub capture_outputs: &'a [&'a str],

    /// Float attributes holding the initial state; shorter data is
    /// zero-filled up to `capacity`.
    pub attributes: Vec<AttributeDesc>,

    /// Number of records each buffer holds.
    pub capacity: u32,
}

#[derive(Debug)]
struct StreamRecord {
    attributes: AttributeSet,
    capture: CaptureTarget,
}

/// Borrowed view of one record.
#[derive(Debug, Copy, Clone)]
pub struct StreamView<'p> {
    pub attribute_set: &'p AttributeSet,
    pub capture_target: &'p CaptureTarget,
}

/// Two attribute sets whose buffers take turns being simulation input and
/// capture destination.
///
/// Record 0 reads set A and captures into set B's buffers; record 1 reads B
/// and captures into A's. `read()` is always the record holding the latest
/// state, so a capture pass followed by [`swap`](Self::swap) advances the
/// simulation without copying anything.
pub struct StreamPipeline {
    program: Program,
    records: PingPong<StreamRecord>,
    capacity: u32,

    /// 1x1 depth attachment the capture pass renders against.
    discard_view: wgpu::TextureView,
}

impl StreamPipeline {
    pub fn new(ctx: &mut GpuContext, desc: StreamPipelineDesc<'_>) -> Result<Self> {
        if desc.capacity == 0 {
            return Err(Error::capture("stream capacity must be at least 1"));
        }
        if desc.capture_outputs.len() != desc.attributes.len() {
            return Err(Error::capture(format!(
                "{} capture outputs for {} stream attributes",
                desc.capture_outputs.len(),
                desc.attributes.len()
            )));
        }

        let program = Program::compile(
            ctx.device(),
            &ProgramDesc {
                label: desc.label,
                vertex: desc.vertex,
                fragment: desc.fragment,
                capture_outputs: desc.capture_outputs,
            },
        )?;

        let attributes = stream_attributes(desc.attributes, desc.capacity)?;

        let a = AttributeSet::new(ctx, &format!("{} A", desc.label), &attributes, None)?;
        let b = match AttributeSet::new(ctx, &format!("{} B", desc.label), &attributes, None) {
            Ok(b) => b,
            Err(e) => {
                a.destroy(ctx)?;
                return Err(e);
            }
        };

        let targets = cross_targets(ctx, &program, &a, &b, desc.capacity);
        let (into_b, into_a) = match targets {
            Ok(targets) => targets,
            Err(e) => {
                a.destroy(ctx)?;
                b.destroy(ctx)?;
                return Err(e);
            }
        };

        log::info!(
            "stream pipeline `{}`: {} attributes x {} records",
            desc.label,
            attributes.len(),
            desc.capacity
        );

        Ok(Self {
            program,
            records: PingPong::new(
                StreamRecord {
                    attributes: a,
                    capture: into_b,
                },
                StreamRecord {
                    attributes: b,
                    capture: into_a,
                },
            ),
            capacity: desc.capacity,
            discard_view: ctx.create_depth_view(1, 1),
        })
    }

    /// The record holding the latest simulation state.
    pub fn read(&self) -> StreamView<'_> {
        view(self.records.read())
    }

    /// The record whose attribute buffers the next capture pass fills.
    pub fn write(&self) -> StreamView<'_> {
        view(self.records.write())
    }

    /// Flips the roles of the two records. No GPU work.
    pub fn swap(&mut self) {
        self.records.swap();
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        self.program.set_uniform(name, value)
    }

    /// Records one capture pass into `encoder`.
    ///
    /// Runs the vertex stage once per record over `read()`'s attributes and
    /// stores the outputs into `write()`'s buffers. Call [`swap`](Self::swap)
    /// afterwards to make them the new input.
    pub fn run_capture_pass(
        &mut self,
        ctx: &GpuContext,
        encoder: &mut wgpu::CommandEncoder,
        uniforms: &Uniforms,
        instance_count: u32,
    ) -> Result<()> {
        if instance_count > self.capacity {
            return Err(Error::CapacityExceeded {
                requested: instance_count,
                capacity: self.capacity,
            });
        }

        let source = self.records.read();
        let key = PipelineKey {
            vertex: source.attributes.vertex_layout(),
            state: RenderState::capture(),
            formats: TargetFormats::capture(),
        };

        self.program.set_uniforms(uniforms)?;
        let pipeline = self.program.pipeline(ctx.device(), &key)?;
        self.program.upload_uniforms(ctx.device(), encoder);

        if instance_count == 0 {
            return Ok(());
        }

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("swarm capture pass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &self.discard_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Discard,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        pass.set_pipeline(&pipeline);
        pass.set_bind_group(0, self.program.uniform_bind_group(), &[]);
        pass.set_bind_group(1, source.capture.bind_group(), &[]);
        source.attributes.bind(ctx, &mut pass)?;
        pass.draw(0..instance_count, 0..1);

        log::trace!("capture pass: {instance_count} records");
        Ok(())
    }

    /// Releases both attribute sets' buffers.
    pub fn destroy(self, ctx: &mut GpuContext) -> Result<()> {
        let [first, second] = self.records.into_inner();
        first.attributes.destroy(ctx)?;
        second.attributes.destroy(ctx)
    }
}

fn view(record: &StreamRecord) -> StreamView<'_> {
    StreamView {
        attribute_set: &record.attributes,
        capture_target: &record.capture,
    }
}

fn handles(set: &AttributeSet) -> Vec<BufferHandle> {
    set.buffers().into_iter().map(|(_, h)| h).collect()
}

/// `(into B, into A)`: each target writes the other set's buffers.
fn cross_targets(
    ctx: &GpuContext,
    program: &Program,
    a: &AttributeSet,
    b: &AttributeSet,
    capacity: u32,
) -> Result<(CaptureTarget, CaptureTarget)> {
    let into_b = CaptureTarget::from_buffers(ctx, program, &handles(b), capacity)?;
    let into_a = CaptureTarget::from_buffers(ctx, program, &handles(a), capacity)?;
    Ok((into_b, into_a))
}

/// Normalizes stream attributes: slot `i`, per-vertex, dynamic, `capacity` records.
fn stream_attributes(descs: Vec<AttributeDesc>, capacity: u32) -> Result<Vec<AttributeDesc>> {
    descs
        .into_iter()
        .enumerate()
        .map(|(i, mut desc)| {
            if !matches!(desc.data, AttributeData::Float32(_)) {
                return Err(Error::invalid_attribute(
                    &desc.name,
                    "stream attributes must hold f32 data",
                ));
            }
            desc.validate()?;

            let records = desc.element_count();
            if records > capacity {
                return Err(Error::CapacityExceeded {
                    requested: records,
                    capacity,
                });
            }

            desc.data
                .zero_extend(capacity as usize * desc.components as usize);
            desc.location = Some(i as u32);
            desc.divisor = 0;
            desc.usage = AttributeUsage::Dynamic;
            Ok(desc)
        })
        .collect()
}
