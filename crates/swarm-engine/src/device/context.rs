use anyhow::Context as _;
use wgpu::util::DeviceExt;

use super::arena::{BufferArena, BufferHandle, BufferInfo};
use super::init::GpuInit;
use crate::error::{Error, Result};

/// Logical connection to the graphics device.
///
/// Owns the device/queue pair and the arena every engine buffer lives in.
/// One context drives one command stream; nothing here is shared across
/// threads.
pub struct GpuContext {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,
    buffers: BufferArena,
}

impl GpuContext {
    /// Creates a context with no surface.
    ///
    /// Used by tests and offline tools; the window runtime goes through
    /// [`Gpu::new`](super::Gpu::new) instead.
    pub async fn headless(init: &GpuInit) -> anyhow::Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: None,
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        Self::from_adapter(adapter, init).await
    }

    pub(crate) async fn from_adapter(
        adapter: wgpu::Adapter,
        init: &GpuInit,
    ) -> anyhow::Result<Self> {
        let info = adapter.get_info();
        let missing = init.required_features - adapter.features();
        anyhow::ensure!(
            missing.is_empty(),
            "adapter `{}` ({:?}) lacks required features: {missing:?}",
            info.name,
            info.backend
        );

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("swarm-engine device"),
                required_features: init.required_features,
                required_limits: init.required_limits.clone(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        log::info!("using adapter `{}` ({:?})", info.name, info.backend);

        Ok(Self {
            adapter,
            device,
            queue,
            buffers: BufferArena::new(),
        })
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn buffers(&self) -> &BufferArena {
        &self.buffers
    }

    /// Allocates a buffer initialized with `contents` and registers it.
    pub fn create_buffer(
        &mut self,
        label: &str,
        contents: &[u8],
        usage: wgpu::BufferUsages,
        info: BufferInfo,
    ) -> BufferHandle {
        let buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage,
            });
        self.buffers.insert(buffer, info)
    }

    pub fn buffer(&self, handle: BufferHandle) -> Result<&wgpu::Buffer> {
        self.buffers.buffer(handle)
    }

    pub fn buffer_info(&self, handle: BufferHandle) -> Result<BufferInfo> {
        self.buffers.info(handle)
    }

    pub fn release_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        self.buffers.release(handle)
    }

    /// Depth attachment in [`TargetFormats::DEPTH_FORMAT`](super::TargetFormats::DEPTH_FORMAT).
    pub fn create_depth_view(&self, width: u32, height: u32) -> wgpu::TextureView {
        super::surface::create_depth_view(&self.device, width, height)
    }

    pub fn create_encoder(&self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    /// Submits everything recorded into `encoder`.
    pub fn flush(&self, encoder: wgpu::CommandEncoder) -> wgpu::SubmissionIndex {
        self.queue.submit(std::iter::once(encoder.finish()))
    }

    /// Copies a buffer back to host memory and blocks until it arrives.
    ///
    /// Tests and tooling only; the frame loop never reads simulation state
    /// back.
    pub fn read_buffer(&self, handle: BufferHandle) -> Result<Vec<u8>> {
        let info = self.buffers.info(handle)?;
        let source = self.buffers.buffer(handle)?;

        // Allocation size is already padded to COPY_BUFFER_ALIGNMENT.
        let padded = source.size();
        let staging = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("swarm readback staging"),
            size: padded,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let mut encoder = self.create_encoder("swarm readback");
        encoder.copy_buffer_to_buffer(source, 0, &staging, 0, padded);
        self.flush(encoder);

        let mut bytes = self.map_read(&staging)?;
        bytes.truncate(info.size as usize);
        Ok(bytes)
    }

    /// Maps a `MAP_READ` buffer whose copy has been submitted and returns its contents.
    pub(crate) fn map_read(&self, staging: &wgpu::Buffer) -> Result<Vec<u8>> {
        let slice = staging.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });

        self.device
            .poll(wgpu::PollType::Wait {
                submission_index: None,
                timeout: None,
            })
            .map_err(|e| Error::Readback {
                reason: e.to_string(),
            })?;

        receiver
            .recv()
            .map_err(|e| Error::Readback {
                reason: e.to_string(),
            })?
            .map_err(|e| Error::Readback {
                reason: e.to_string(),
            })?;

        let bytes = slice.get_mapped_range().to_vec();
        staging.unmap();
        Ok(bytes)
    }

    pub fn read_f32(&self, handle: BufferHandle) -> Result<Vec<f32>> {
        let bytes = self.read_buffer(handle)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    pub fn read_u16(&self, handle: BufferHandle) -> Result<Vec<u16>> {
        let bytes = self.read_buffer(handle)?;
        Ok(bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect())
    }
}
