/// Initialization parameters for the GPU layer.
///
/// The same struct drives both the window-bound [`Gpu`](super::Gpu) and the
/// headless [`GpuContext`](super::GpuContext); surface fields are ignored
/// when there is no surface.
#[derive(Debug, Clone)]
pub struct GpuInit {
    /// Prefer an sRGB surface format when available.
    pub prefer_srgb: bool,

    /// Present mode (swap behavior).
    pub present_mode: wgpu::PresentMode,

    /// Optional alpha mode preference for the surface.
    ///
    /// If provided but unsupported on the current surface, a supported mode is selected.
    pub alpha_mode: Option<wgpu::CompositeAlphaMode>,

    /// Required wgpu features.
    ///
    /// Capture passes write storage buffers from the vertex stage, so
    /// `VERTEX_WRITABLE_STORAGE` is part of the default set.
    pub required_features: wgpu::Features,

    /// Limits requested from the adapter/device.
    pub required_limits: wgpu::Limits,

    pub power_preference: wgpu::PowerPreference,

    /// Ask for a software adapter (useful on CI machines without a GPU).
    pub force_fallback_adapter: bool,

    /// Desired maximum frame latency for the surface.
    ///
    /// This value is a hint; support depends on platform/backend.
    pub desired_maximum_frame_latency: u32,
}

impl Default for GpuInit {
    fn default() -> Self {
        Self {
            prefer_srgb: true,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: None,
            required_features: wgpu::Features::VERTEX_WRITABLE_STORAGE,
            required_limits: wgpu::Limits::default(),
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            desired_maximum_frame_latency: 2,
        }
    }
}
