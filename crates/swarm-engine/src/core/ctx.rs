use winit::window::Window;

use super::app::AppControl;
use crate::device::{Gpu, GpuContext, SurfaceErrorAction};
use crate::input::{InputFrame, InputState};
use crate::render::RenderTarget;
use crate::time::FrameTime;
use crate::window::RuntimeCtx;

/// The window being drawn.
pub struct WindowCtx<'a> {
    pub window: &'a Window,
}

impl WindowCtx<'_> {
    /// `(width, height)` in physical pixels.
    pub fn physical_size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }
}

/// Per-frame context passed to [`App::on_frame`](super::App::on_frame).
///
/// `'a` is the callback, `'w` the window borrow carried by `Gpu<'w>`.
pub struct FrameCtx<'a, 'w> {
    pub window: WindowCtx<'a>,
    pub gpu: &'a mut Gpu<'w>,
    pub input: &'a InputState,
    pub input_frame: &'a InputFrame,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl FrameCtx<'_, '_> {
    /// Acquires the next surface image, records `draw` into it and presents.
    ///
    /// A surface error skips the frame (or exits when fatal). An error from
    /// `draw` is logged and ends the run.
    pub fn render<F>(&mut self, draw: F) -> AppControl
    where
        F: FnOnce(&GpuContext, &mut RenderTarget<'_>) -> crate::Result<()>,
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                let action = self.gpu.handle_surface_error(err);
                log::debug!("surface error: {action:?}");
                if action == SurfaceErrorAction::Fatal {
                    return AppControl::Exit;
                }
                return AppControl::Continue;
            }
        };

        let size = self.gpu.size();
        let result = {
            let mut target = RenderTarget::new(
                &mut frame.encoder,
                &frame.view,
                self.gpu.depth_view(),
                self.gpu.surface_format(),
                size.width,
                size.height,
            );
            draw(self.gpu.context(), &mut target)
        };

        if let Err(e) = result {
            log::error!("frame failed: {e}");
            return AppControl::Exit;
        }

        self.window.window.pre_present_notify();
        self.gpu.submit(frame);
        AppControl::Continue
    }
}
