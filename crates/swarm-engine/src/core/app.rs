use winit::event::WindowEvent;

use super::ctx::FrameCtx;
use crate::device::Gpu;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract driven by [`Runtime`](crate::window::Runtime).
pub trait App {
    /// Called once after the window and GPU exist. An error stops the runtime
    /// and is returned from `Runtime::run`.
    fn on_gpu_ready(&mut self, gpu: &mut Gpu<'_>) -> anyhow::Result<()>;

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;

    /// Called before the window and GPU are dropped.
    fn on_exit(&mut self, gpu: &mut Gpu<'_>) {
        let _ = gpu;
    }
}
