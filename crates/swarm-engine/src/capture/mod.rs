//! Stream-out: capture targets and the double-buffered stream pipeline.

mod ping_pong;
mod pipeline;
mod target;

pub use ping_pong::PingPong;
pub use pipeline::{StreamPipeline, StreamPipelineDesc, StreamView};
pub use target::CaptureTarget;
