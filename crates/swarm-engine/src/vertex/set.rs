use std::collections::HashSet;

use super::attribute::{AttributeDesc, AttributeLayout, AttributeUsage, NumericKind};
use crate::device::{BufferHandle, BufferInfo, GpuContext};
use crate::error::{Error, Result};

/// One vertex buffer as the pipeline sees it.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct VertexSlot {
    pub location: u32,
    pub format: wgpu::VertexFormat,
    pub stride: u64,
    pub step_mode: wgpu::VertexStepMode,
}

/// Vertex input layout of an attribute set, one buffer per attribute.
#[derive(Debug, Clone, Default, Eq, PartialEq, Hash)]
pub struct VertexLayout {
    pub slots: Vec<VertexSlot>,
}

#[derive(Debug, Clone)]
struct BoundAttribute {
    name: String,
    layout: AttributeLayout,
    format: wgpu::VertexFormat,
    location: u32,
    step_mode: wgpu::VertexStepMode,

    /// Buffer this set allocated and must release.
    owned: BufferHandle,

    /// Buffer currently feeding the slot; differs from `owned` after `set_buffer`.
    current: BufferHandle,
}

#[derive(Debug, Copy, Clone)]
struct IndexBuffer {
    handle: BufferHandle,
    count: u32,
}

/// Named per-vertex / per-instance buffers bound to fixed shader locations,
/// plus an optional `u16` index buffer.
///
/// Locations are assigned once at construction. The buffer behind a location
/// can be replaced with [`set_buffer`](Self::set_buffer) as long as the
/// replacement carries the same layout.
#[derive(Debug)]
pub struct AttributeSet {
    label: String,
    attributes: Vec<BoundAttribute>,
    indices: Option<IndexBuffer>,
}

impl AttributeSet {
    pub fn new(
        ctx: &mut GpuContext,
        label: &str,
        descs: &[AttributeDesc],
        indices: Option<&[u16]>,
    ) -> Result<Self> {
        let locations = assign_locations(descs)?;

        // Validate everything before the first allocation.
        let mut formats = Vec::with_capacity(descs.len());
        for desc in descs {
            formats.push(desc.validate()?);
        }

        let mut attributes = Vec::with_capacity(descs.len());
        for ((desc, format), location) in descs.iter().zip(formats).zip(locations) {
            let layout = desc.layout();
            let bytes = desc.data.as_bytes();
            let info = BufferInfo {
                size: bytes.len() as u64,
                layout: Some(layout),
                capturable: desc.usage == AttributeUsage::Dynamic
                    && layout.kind == NumericKind::Float32,
            };
            let handle = ctx.create_buffer(
                &format!("{label}/{}", desc.name),
                bytes,
                desc.usage.buffer_usages(),
                info,
            );

            attributes.push(BoundAttribute {
                name: desc.name.clone(),
                layout,
                format,
                location,
                step_mode: desc.step_mode(),
                owned: handle,
                current: handle,
            });
        }

        let indices = indices.map(|data| {
            let bytes: &[u8] = bytemuck::cast_slice(data);
            let handle = ctx.create_buffer(
                &format!("{label}/indices"),
                bytes,
                wgpu::BufferUsages::INDEX
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                BufferInfo {
                    size: bytes.len() as u64,
                    layout: None,
                    capturable: false,
                },
            );
            IndexBuffer {
                handle,
                count: data.len() as u32,
            }
        });

        log::debug!(
            "attribute set `{label}`: {} attributes{}",
            attributes.len(),
            if indices.is_some() { ", indexed" } else { "" }
        );

        Ok(Self {
            label: label.to_string(),
            attributes,
            indices,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn has_indices(&self) -> bool {
        self.indices.is_some()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.map_or(0, |i| i.count)
    }

    pub fn index_buffer(&self) -> Option<BufferHandle> {
        self.indices.map(|i| i.handle)
    }

    fn attribute(&self, name: &str) -> Result<&BoundAttribute> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::AttributeNotFound {
                name: name.to_string(),
            })
    }

    /// Buffer currently bound to `name`.
    pub fn find_buffer(&self, name: &str) -> Result<BufferHandle> {
        self.attribute(name).map(|a| a.current)
    }

    pub fn location(&self, name: &str) -> Result<u32> {
        self.attribute(name).map(|a| a.location)
    }

    pub fn layout(&self, name: &str) -> Result<AttributeLayout> {
        self.attribute(name).map(|a| a.layout)
    }

    /// `(name, buffer)` pairs in descriptor order.
    pub fn buffers(&self) -> Vec<(&str, BufferHandle)> {
        self.attributes
            .iter()
            .map(|a| (a.name.as_str(), a.current))
            .collect()
    }

    /// Points `name` at another existing buffer.
    ///
    /// The location and step mode stay as they were. The set does not take
    /// ownership: a foreign buffer must outlive its use here.
    pub fn set_buffer(
        &mut self,
        ctx: &GpuContext,
        name: &str,
        buffer: BufferHandle,
    ) -> Result<()> {
        let info = ctx.buffer_info(buffer)?;
        let attr = self
            .attributes
            .iter_mut()
            .find(|a| a.name == name)
            .ok_or_else(|| Error::AttributeNotFound {
                name: name.to_string(),
            })?;

        if info.layout != Some(attr.layout) {
            return Err(Error::AttributeLayoutMismatch {
                name: name.to_string(),
                expected: attr.layout,
                found: info.layout,
            });
        }

        attr.current = buffer;
        Ok(())
    }

    pub fn vertex_layout(&self) -> VertexLayout {
        VertexLayout {
            slots: self
                .attributes
                .iter()
                .map(|a| VertexSlot {
                    location: a.location,
                    format: a.format,
                    stride: a.layout.stride(),
                    step_mode: a.step_mode,
                })
                .collect(),
        }
    }

    fn min_elements(
        &self,
        ctx: &GpuContext,
        step_mode: wgpu::VertexStepMode,
    ) -> Result<Option<u32>> {
        let mut min: Option<u32> = None;
        for attr in self.attributes.iter().filter(|a| a.step_mode == step_mode) {
            let count = ctx.buffer_info(attr.current)?.element_count().unwrap_or(0);
            min = Some(min.map_or(count, |m| m.min(count)));
        }
        Ok(min)
    }

    /// Vertices available to a non-indexed draw.
    pub fn vertex_count(&self, ctx: &GpuContext) -> Result<u32> {
        Ok(self
            .min_elements(ctx, wgpu::VertexStepMode::Vertex)?
            .unwrap_or(0))
    }

    /// Instances the per-instance buffers can feed; unbounded without any.
    pub fn instance_capacity(&self, ctx: &GpuContext) -> Result<u32> {
        Ok(self
            .min_elements(ctx, wgpu::VertexStepMode::Instance)?
            .unwrap_or(u32::MAX))
    }

    /// Binds every attribute buffer (and the index buffer) on `pass`.
    pub(crate) fn bind(&self, ctx: &GpuContext, pass: &mut wgpu::RenderPass<'_>) -> Result<()> {
        for (slot, attr) in self.attributes.iter().enumerate() {
            let buffer = ctx.buffer(attr.current)?;
            pass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        if let Some(indices) = self.indices {
            let buffer = ctx.buffer(indices.handle)?;
            pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint16);
        }
        Ok(())
    }

    /// Releases the buffers this set allocated. Foreign buffers are untouched.
    pub fn destroy(self, ctx: &mut GpuContext) -> Result<()> {
        for attr in &self.attributes {
            ctx.release_buffer(attr.owned)?;
        }
        if let Some(indices) = self.indices {
            ctx.release_buffer(indices.handle)?;
        }
        log::debug!("attribute set `{}` destroyed", self.label);
        Ok(())
    }
}

/// Pinned locations first, then the rest fill the lowest free slots in order.
fn assign_locations(descs: &[AttributeDesc]) -> Result<Vec<u32>> {
    let mut names = HashSet::new();
    let mut taken = HashSet::new();

    for desc in descs {
        if !names.insert(desc.name.as_str()) {
            return Err(Error::DuplicateAttribute {
                name: desc.name.clone(),
            });
        }
        if let Some(location) = desc.location {
            if !taken.insert(location) {
                return Err(Error::DuplicateLocation { location });
            }
        }
    }

    let mut next = 0;
    let mut locations = Vec::with_capacity(descs.len());
    for desc in descs {
        let location = match desc.location {
            Some(location) => location,
            None => {
                while taken.contains(&next) {
                    next += 1;
                }
                taken.insert(next);
                next
            }
        };
        locations.push(location);
    }
    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_are_sequential_by_default() {
        let descs = [
            AttributeDesc::float("a", 3, vec![]),
            AttributeDesc::float("b", 3, vec![]),
            AttributeDesc::float("c", 2, vec![]),
        ];
        assert_eq!(assign_locations(&descs).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn pinned_locations_are_skipped() {
        let descs = [
            AttributeDesc::float("a", 3, vec![]),
            AttributeDesc::float("b", 3, vec![]).at_location(0),
            AttributeDesc::float("c", 3, vec![]),
        ];
        assert_eq!(assign_locations(&descs).unwrap(), vec![1, 0, 2]);
    }

    #[test]
    fn duplicate_names_fail() {
        let descs = [
            AttributeDesc::float("a", 3, vec![]),
            AttributeDesc::float("a", 2, vec![]),
        ];
        assert_eq!(
            assign_locations(&descs),
            Err(Error::DuplicateAttribute { name: "a".into() })
        );
    }

    #[test]
    fn duplicate_pins_fail() {
        let descs = [
            AttributeDesc::float("a", 3, vec![]).at_location(2),
            AttributeDesc::float("b", 3, vec![]).at_location(2),
        ];
        assert_eq!(
            assign_locations(&descs),
            Err(Error::DuplicateLocation { location: 2 })
        );
    }
}
