use crate::device::TargetFormats;

/// Pixel rectangle draws are mapped into.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Intersects the rectangle with a `width` x `height` target.
    fn clamped(self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        let x = self.x.clamp(0.0, w);
        let y = self.y.clamp(0.0, h);
        Self {
            x,
            y,
            width: (self.x + self.width).clamp(x, w) - x,
            height: (self.y + self.height).clamp(y, h) - y,
        }
    }
}

/// Color + depth attachments for one frame, plus the encoder recording into them.
///
/// Draws load what is already there; [`clear`](Self::clear) is the only
/// operation that discards previous contents.
pub struct RenderTarget<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub(crate) color_view: &'a wgpu::TextureView,
    pub(crate) depth_view: &'a wgpu::TextureView,
    pub(crate) formats: TargetFormats,
    size: (u32, u32),
    viewport: Viewport,
}

impl<'a> RenderTarget<'a> {
    pub fn new(
        encoder: &'a mut wgpu::CommandEncoder,
        color_view: &'a wgpu::TextureView,
        depth_view: &'a wgpu::TextureView,
        color_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        Self {
            encoder,
            color_view,
            depth_view,
            formats: TargetFormats::new(color_format),
            size: (width, height),
            viewport: Viewport::full(width, height),
        }
    }

    pub fn formats(&self) -> TargetFormats {
        self.formats
    }

    /// `(width, height)` in physical pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Sets the rectangle later draws render into, clipped to the target.
    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.viewport = Viewport {
            x,
            y,
            width,
            height,
        }
        .clamped(self.size.0, self.size.1);
    }

    /// Clears color to `color` and depth to 1.0.
    pub fn clear(&mut self, color: wgpu::Color) {
        let _pass = self.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("swarm clear"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: self.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_is_clipped_to_the_target() {
        let v = Viewport {
            x: -10.0,
            y: 50.0,
            width: 100.0,
            height: 100.0,
        }
        .clamped(64, 120);
        assert_eq!(
            v,
            Viewport {
                x: 0.0,
                y: 50.0,
                width: 64.0,
                height: 70.0
            }
        );
    }

    #[test]
    fn viewport_outside_the_target_is_empty() {
        let v = Viewport {
            x: 200.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        }
        .clamped(100, 100);
        assert!(v.is_empty());
    }
}
