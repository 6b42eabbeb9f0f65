//! WGSL programs: compilation, link-time reflection and uniforms.

mod error;
mod program;
mod reflect;
mod uniform;

pub use error::{ShaderCompileError, ShaderLinkError, ShaderStage};
pub use program::{PipelineKey, Program, ProgramDesc};
pub use reflect::{CaptureSlot, CAPTURE_GROUP, UNIFORM_GROUP};
pub use uniform::{UniformBlock, UniformKind, UniformLayout, UniformMember, UniformValue, Uniforms};
