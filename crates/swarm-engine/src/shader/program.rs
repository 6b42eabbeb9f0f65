use std::borrow::Cow;
use std::collections::HashMap;

use wgpu::util::DeviceExt;

use super::error::ShaderStage;
use super::reflect::{self, CaptureSlot, IoType, LinkedProgram};
use super::uniform::{UniformBlock, UniformLayout, UniformValue, Uniforms};
use crate::device::{RenderState, TargetFormats};
use crate::error::{Error, Result};
use crate::vertex::VertexLayout;

/// Sources for [`Program::compile`].
#[derive(Debug, Clone, Copy)]
pub struct ProgramDesc<'a> {
    pub label: &'a str,
    pub vertex: &'a str,
    pub fragment: &'a str,

    /// Vertex-stage storage arrays written during capture passes, in the
    /// order their destination buffers are supplied. Empty for draw-only
    /// programs.
    pub capture_outputs: &'a [&'a str],
}

/// Everything that selects a distinct render pipeline for one program.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PipelineKey {
    pub vertex: VertexLayout,
    pub state: RenderState,
    pub formats: TargetFormats,
}

/// A compiled and linked vertex + fragment pair.
///
/// Owns its uniform buffer and a cache of render pipelines, one per vertex
/// layout / render state / target combination it has been drawn with.
pub struct Program {
    label: String,
    vertex_module: wgpu::ShaderModule,
    fragment_module: wgpu::ShaderModule,
    linked: LinkedProgram,

    uniforms: UniformBlock,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    capture_layout: Option<wgpu::BindGroupLayout>,
    pipeline_layout: wgpu::PipelineLayout,

    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
}

impl Program {
    pub fn compile(device: &wgpu::Device, desc: &ProgramDesc<'_>) -> Result<Self> {
        let vertex = reflect::parse_stage(ShaderStage::Vertex, desc.vertex)?;
        let fragment = reflect::parse_stage(ShaderStage::Fragment, desc.fragment)?;
        let linked = reflect::link(&vertex, &fragment, desc.capture_outputs)?;

        let vertex_module = create_module(device, desc.label, "vs", desc.vertex);
        let fragment_module = create_module(device, desc.label, "fs", desc.fragment);

        let uniforms = UniformBlock::new(linked.uniforms.clone());
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{} uniforms", desc.label)),
            size: linked.uniforms.buffer_size(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} uniform bgl", desc.label)),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} uniform bg", desc.label)),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let capture_layout = (!linked.captures.is_empty()).then(|| {
            let entries: Vec<_> = linked
                .captures
                .iter()
                .map(|slot| wgpu::BindGroupLayoutEntry {
                    binding: slot.binding,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                })
                .collect();

            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("{} capture bgl", desc.label)),
                entries: &entries,
            })
        });

        let mut layouts = vec![&uniform_layout];
        if let Some(capture) = capture_layout.as_ref() {
            layouts.push(capture);
        }
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(&format!("{} pipeline layout", desc.label)),
            bind_group_layouts: &layouts,
            immediate_size: 0,
        });

        log::debug!(
            "program `{}` linked: {} uniforms, {} capture outputs",
            desc.label,
            linked.uniforms.members().len(),
            linked.captures.len()
        );

        Ok(Self {
            label: desc.label.to_string(),
            vertex_module,
            fragment_module,
            linked,
            uniforms,
            uniform_buffer,
            uniform_bind_group,
            capture_layout,
            pipeline_layout,
            pipelines: HashMap::new(),
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Capture outputs in declaration order.
    pub fn capture_outputs(&self) -> &[CaptureSlot] {
        &self.linked.captures
    }

    pub fn uniform_layout(&self) -> &UniformLayout {
        &self.linked.uniforms
    }

    pub fn set_uniform(&mut self, name: &str, value: impl Into<UniformValue>) -> Result<()> {
        self.uniforms.set(name, &value.into())
    }

    pub fn set_uniforms(&mut self, uniforms: &Uniforms) -> Result<()> {
        self.uniforms.apply(uniforms)
    }

    /// Number of pipelines built so far.
    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    /// Records a copy of the current uniform values into `encoder`.
    ///
    /// Going through the encoder (rather than `Queue::write_buffer`) keeps
    /// each pass's values in command-stream order.
    pub(crate) fn upload_uniforms(
        &self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
    ) {
        let bytes = self.uniforms.bytes();
        let staging = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("swarm uniform staging"),
            contents: bytes,
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        encoder.copy_buffer_to_buffer(&staging, 0, &self.uniform_buffer, 0, bytes.len() as u64);
    }

    pub(crate) fn uniform_bind_group(&self) -> &wgpu::BindGroup {
        &self.uniform_bind_group
    }

    pub(crate) fn capture_layout(&self) -> Option<&wgpu::BindGroupLayout> {
        self.capture_layout.as_ref()
    }

    /// Every location the vertex stage reads must be fed with a matching kind.
    pub(crate) fn check_vertex_layout(&self, layout: &VertexLayout) -> Result<()> {
        for &(location, input) in &self.linked.vertex_inputs {
            let slot = layout
                .slots
                .iter()
                .find(|s| s.location == location)
                .ok_or(Error::MissingVertexInput { location })?;

            if !accepts(input, slot.format) {
                return Err(Error::VertexInputMismatch {
                    location,
                    format: slot.format,
                });
            }
        }
        Ok(())
    }

    /// Pipeline for `key`, built on first use.
    pub(crate) fn pipeline(
        &mut self,
        device: &wgpu::Device,
        key: &PipelineKey,
    ) -> Result<wgpu::RenderPipeline> {
        if let Some(pipeline) = self.pipelines.get(key) {
            return Ok(pipeline.clone());
        }
        self.check_vertex_layout(&key.vertex)?;

        let attributes: Vec<[wgpu::VertexAttribute; 1]> = key
            .vertex
            .slots
            .iter()
            .map(|slot| {
                [wgpu::VertexAttribute {
                    format: slot.format,
                    offset: 0,
                    shader_location: slot.location,
                }]
            })
            .collect();

        let buffers: Vec<wgpu::VertexBufferLayout<'_>> = key
            .vertex
            .slots
            .iter()
            .zip(&attributes)
            .map(|(slot, attribute)| wgpu::VertexBufferLayout {
                array_stride: slot.stride,
                step_mode: slot.step_mode,
                attributes: attribute,
            })
            .collect();

        let targets = [key.formats.color.map(|f| key.state.color_target(f))];
        let fragment = (!key.state.rasterizer_discard).then(|| wgpu::FragmentState {
            module: &self.fragment_module,
            entry_point: Some(&self.linked.fragment_entry),
            compilation_options: Default::default(),
            targets: if key.formats.color.is_some() { &targets } else { &[] },
        });

        let label = format!("{} pipeline #{}", self.label, self.pipelines.len());
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&label),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.vertex_module,
                entry_point: Some(&self.linked.vertex_entry),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment,
            primitive: key.state.primitive_state(),
            depth_stencil: key.state.depth_stencil_state(key.formats.depth),
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        log::debug!("built {label} ({:?})", key.state.topology);
        self.pipelines.insert(key.clone(), pipeline.clone());
        Ok(pipeline)
    }
}

fn create_module(
    device: &wgpu::Device,
    label: &str,
    stage: &str,
    source: &str,
) -> wgpu::ShaderModule {
    device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{label} {stage}")),
        source: wgpu::ShaderSource::Wgsl(Cow::Owned(source.to_string())),
    })
}

fn accepts(input: IoType, format: wgpu::VertexFormat) -> bool {
    use wgpu::VertexFormat as F;

    let kind = match format {
        F::Uint16x2 | F::Uint16x4 => naga::ScalarKind::Uint,
        _ => naga::ScalarKind::Float,
    };
    kind == input.kind
}
