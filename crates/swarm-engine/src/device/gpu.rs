use std::ops::{Deref, DerefMut};

use anyhow::{Context, Result};
use wgpu::SurfaceError;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::context::GpuContext;
use super::state::TargetFormats;
use super::surface;
use super::GpuInit;

/// One acquired swapchain image plus the encoder recording into it.
///
/// Holding the surface texture blocks acquisition of the next one, so a
/// frame is submitted (or dropped) within the same redraw.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// What the runtime should do after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

/// Window-bound GPU context.
///
/// Adds the surface (swapchain) and a matching depth target on top of a
/// [`GpuContext`], which it derefs to.
pub struct Gpu<'w> {
    /// Kept alive for the surface.
    _instance: wgpu::Instance,

    /// Surface bound to the window.
    surface: wgpu::Surface<'w>,

    ctx: GpuContext,

    /// Active surface configuration.
    config: wgpu::SurfaceConfiguration,

    /// Current drawable size in physical pixels.
    size: PhysicalSize<u32>,

    /// Depth attachment sized like the surface.
    depth_view: wgpu::TextureView,
}

impl<'w> Gpu<'w> {
    /// Creates a GPU context bound to a window.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu.
    pub async fn new(window: &'w Window, init: GpuInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: init.power_preference,
                compatible_surface: Some(&surface),
                force_fallback_adapter: init.force_fallback_adapter,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let ctx = GpuContext::from_adapter(adapter, &init).await?;

        let surface_caps = surface.get_capabilities(ctx.adapter());
        let format = surface::choose_surface_format(&surface_caps, init.prefer_srgb)
            .context("no supported surface formats")?;
        let alpha_mode = surface::choose_alpha_mode(&surface_caps, init.alpha_mode);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: init.present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        surface.configure(ctx.device(), &config);
        let depth_view = surface::create_depth_view(ctx.device(), config.width, config.height);

        log::debug!("surface configured: {format:?} {}x{}", config.width, config.height);

        Ok(Self {
            _instance: instance,
            surface,
            ctx,
            config,
            size,
            depth_view,
        })
    }

    /// Returns the active surface format.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    pub fn target_formats(&self) -> TargetFormats {
        TargetFormats::new(self.config.format)
    }

    /// Returns the current drawable size (physical pixels).
    pub fn size(&self) -> PhysicalSize<u32> {
        self.size
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut GpuContext {
        &mut self.ctx
    }

    /// Reconfigures the surface and rebuilds the depth target after a resize.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        let applied = surface::apply_resize(
            &self.surface,
            self.ctx.device(),
            &mut self.config,
            &mut self.size,
            new_size,
        );
        if applied {
            let (width, height) = (self.config.width, self.config.height);
            self.depth_view = surface::create_depth_view(self.ctx.device(), width, height);
        }
    }

    /// Acquires the next surface texture and creates an encoder.
    pub fn begin_frame(&self) -> std::result::Result<GpuFrame, SurfaceError> {
        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self.ctx.create_encoder("swarm frame encoder");

        Ok(GpuFrame {
            surface_texture,
            view,
            encoder,
        })
    }

    pub fn depth_view(&self) -> &wgpu::TextureView {
        &self.depth_view
    }

    /// Submits the recorded commands for the given frame and presents it.
    pub fn submit(&self, frame: GpuFrame) {
        self.ctx.flush(frame.encoder);
        drop(frame.view);
        frame.surface_texture.present();
    }

    /// Converts a `SurfaceError` into a higher-level action.
    pub fn handle_surface_error(&mut self, err: SurfaceError) -> SurfaceErrorAction {
        surface::map_surface_error(&self.surface, self.ctx.device(), &self.config, self.size, err)
    }
}

impl Deref for Gpu<'_> {
    type Target = GpuContext;

    fn deref(&self) -> &GpuContext {
        &self.ctx
    }
}

impl DerefMut for Gpu<'_> {
    fn deref_mut(&mut self) -> &mut GpuContext {
        &mut self.ctx
    }
}
