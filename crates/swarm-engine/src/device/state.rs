/// Depth test configuration for one draw.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DepthState {
    pub compare: wgpu::CompareFunction,
    pub write: bool,
}

/// Fixed-function state for a single draw or capture pass.
///
/// Every pass states the full set it needs; nothing carries over from the
/// previous pass. Pipelines are cached per distinct value.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RenderState {
    pub topology: wgpu::PrimitiveTopology,
    pub front_face: wgpu::FrontFace,
    pub cull_mode: Option<wgpu::Face>,

    /// `None` disables the depth test (compare always, no writes).
    pub depth: Option<DepthState>,

    /// `None` disables blending.
    pub blend: Option<wgpu::BlendState>,

    /// Skip the fragment stage entirely. Vertex side effects still happen.
    pub rasterizer_discard: bool,
}

impl RenderState {
    /// Back-face culled, depth-tested triangles with blending off.
    pub const fn opaque() -> Self {
        Self {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            depth: Some(DepthState {
                compare: wgpu::CompareFunction::LessEqual,
                write: true,
            }),
            blend: None,
            rasterizer_discard: false,
        }
    }

    /// One point per vertex, nothing rasterized.
    pub const fn capture() -> Self {
        Self {
            topology: wgpu::PrimitiveTopology::PointList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            depth: None,
            blend: None,
            rasterizer_discard: true,
        }
    }

    pub const fn with_topology(mut self, topology: wgpu::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub const fn with_cull_mode(mut self, cull_mode: Option<wgpu::Face>) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    pub const fn with_depth(mut self, depth: Option<DepthState>) -> Self {
        self.depth = depth;
        self
    }

    pub const fn with_blend(mut self, blend: Option<wgpu::BlendState>) -> Self {
        self.blend = blend;
        self
    }

    pub(crate) fn primitive_state(&self) -> wgpu::PrimitiveState {
        wgpu::PrimitiveState {
            topology: self.topology,
            strip_index_format: None,
            front_face: self.front_face,
            cull_mode: self.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        }
    }

    /// Depth state for a target with the given depth format.
    ///
    /// wgpu requires the pipeline to describe any depth attachment the pass
    /// has, so a disabled test still yields `Some` when the target has depth.
    pub(crate) fn depth_stencil_state(
        &self,
        format: Option<wgpu::TextureFormat>,
    ) -> Option<wgpu::DepthStencilState> {
        let format = format?;
        let (compare, write) = match self.depth {
            Some(depth) => (depth.compare, depth.write),
            None => (wgpu::CompareFunction::Always, false),
        };

        Some(wgpu::DepthStencilState {
            format,
            depth_write_enabled: write,
            depth_compare: compare,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        })
    }

    pub(crate) fn color_target(&self, format: wgpu::TextureFormat) -> wgpu::ColorTargetState {
        wgpu::ColorTargetState {
            format,
            blend: self.blend,
            write_mask: wgpu::ColorWrites::ALL,
        }
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self::opaque()
    }
}

/// Attachment formats a pipeline is built against.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct TargetFormats {
    pub color: Option<wgpu::TextureFormat>,
    pub depth: Option<wgpu::TextureFormat>,
}

impl TargetFormats {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub const fn new(color: wgpu::TextureFormat) -> Self {
        Self {
            color: Some(color),
            depth: Some(Self::DEPTH_FORMAT),
        }
    }

    /// Depth-only 1x1 target used by capture passes.
    pub const fn capture() -> Self {
        Self {
            color: None,
            depth: Some(Self::DEPTH_FORMAT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_matches_classic_draw_state() {
        let s = RenderState::opaque();
        assert_eq!(s.cull_mode, Some(wgpu::Face::Back));
        assert_eq!(s.front_face, wgpu::FrontFace::Ccw);
        assert!(s.blend.is_none());

        let ds = s
            .depth_stencil_state(Some(TargetFormats::DEPTH_FORMAT))
            .unwrap();
        assert!(ds.depth_write_enabled);
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::LessEqual);
    }

    #[test]
    fn capture_state_never_writes_depth() {
        let s = RenderState::capture();
        assert!(s.rasterizer_discard);
        assert_eq!(s.topology, wgpu::PrimitiveTopology::PointList);

        let ds = s
            .depth_stencil_state(TargetFormats::capture().depth)
            .unwrap();
        assert!(!ds.depth_write_enabled);
        assert_eq!(ds.depth_compare, wgpu::CompareFunction::Always);
    }

    #[test]
    fn no_depth_attachment_means_no_depth_state() {
        assert!(RenderState::opaque().depth_stencil_state(None).is_none());
    }
}
