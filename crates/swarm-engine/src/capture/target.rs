use std::collections::HashSet;

use crate::device::{BufferHandle, GpuContext};
use crate::error::{Error, Result};
use crate::shader::Program;
use crate::vertex::NumericKind;

/// Destination buffers for one program's capture outputs.
///
/// Each buffer is bound at the storage binding the program reflected for its
/// output name. The target only references its buffers; whoever created them
/// releases them.
#[derive(Debug)]
pub struct CaptureTarget {
    /// `(output name, buffer)` in the program's declaration order.
    entries: Vec<(String, BufferHandle)>,
    bind_group: wgpu::BindGroup,
}

impl CaptureTarget {
    /// Binds `destinations` by capture-output name.
    ///
    /// Every output of `program` must be named exactly once, and every buffer
    /// must be a capturable float buffer holding at least `capacity` records.
    pub fn new(
        ctx: &GpuContext,
        program: &Program,
        destinations: &[(&str, BufferHandle)],
        capacity: u32,
    ) -> Result<Self> {
        let layout = program.capture_layout().ok_or_else(|| {
            Error::capture(format!(
                "program `{}` declares no capture outputs",
                program.label()
            ))
        })?;
        let slots = program.capture_outputs();

        let mut seen = HashSet::new();
        for (name, _) in destinations {
            if !seen.insert(*name) {
                return Err(Error::capture(format!("`{name}` is bound twice")));
            }
            if !slots.iter().any(|s| s.name == *name) {
                return Err(Error::capture(format!(
                    "program `{}` has no capture output `{name}`",
                    program.label()
                )));
            }
        }

        let mut entries = Vec::with_capacity(slots.len());
        for slot in slots {
            let (_, handle) = destinations
                .iter()
                .find(|(name, _)| *name == slot.name)
                .ok_or_else(|| {
                    Error::capture(format!("no buffer for capture output `{}`", slot.name))
                })?;

            let info = ctx.buffer_info(*handle)?;
            if !info.capturable {
                return Err(Error::capture(format!(
                    "buffer {handle} for `{}` was not created as a dynamic float attribute",
                    slot.name
                )));
            }
            let layout = info
                .layout
                .filter(|l| {
                    l.kind == NumericKind::Float32 && slot.scalar == naga::ScalarKind::Float
                })
                .ok_or_else(|| {
                    Error::capture(format!("`{}` must capture into f32 storage", slot.name))
                })?;

            let records = (info.size / layout.stride()) as u32;
            if records < capacity {
                return Err(Error::capture(format!(
                    "buffer for `{}` holds {records} records, {capacity} required",
                    slot.name
                )));
            }

            entries.push((slot.name.clone(), *handle));
        }

        let mut bindings = Vec::with_capacity(entries.len());
        for (slot, (_, handle)) in slots.iter().zip(&entries) {
            bindings.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: ctx.buffer(*handle)?.as_entire_binding(),
            });
        }

        let bind_group = ctx.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} capture bg", program.label())),
            layout,
            entries: &bindings,
        });

        Ok(Self {
            entries,
            bind_group,
        })
    }

    /// Positional form: `buffers[i]` receives capture output `i`.
    pub fn from_buffers(
        ctx: &GpuContext,
        program: &Program,
        buffers: &[BufferHandle],
        capacity: u32,
    ) -> Result<Self> {
        let slots = program.capture_outputs();
        if buffers.len() != slots.len() {
            return Err(Error::capture(format!(
                "{} buffers for {} capture outputs",
                buffers.len(),
                slots.len()
            )));
        }

        let named: Vec<(&str, BufferHandle)> = slots
            .iter()
            .zip(buffers)
            .map(|(slot, handle)| (slot.name.as_str(), *handle))
            .collect();
        Self::new(ctx, program, &named, capacity)
    }

    /// Destination handles in capture-output order.
    pub fn buffers(&self) -> Vec<BufferHandle> {
        self.entries.iter().map(|(_, h)| *h).collect()
    }

    pub fn buffer(&self, name: &str) -> Option<BufferHandle> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, h)| *h)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}
