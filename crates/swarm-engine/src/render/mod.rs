//! Render targets and draw submission.
//!
//! A [`RenderTarget`] wraps one frame's attachments. Draws take an explicit
//! [`RenderState`](crate::device::RenderState) and load the previous
//! contents; only `clear` discards them.

mod ctx;
mod draw;
mod offscreen;

pub use ctx::{RenderTarget, Viewport};
pub use offscreen::OffscreenTarget;
