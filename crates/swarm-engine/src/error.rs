use std::fmt;

use crate::device::BufferHandle;
use crate::shader::{ShaderCompileError, ShaderLinkError, UniformKind};
use crate::vertex::AttributeLayout;

/// Result alias used by the engine core.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised by the stream-out core.
///
/// Every variant is detected synchronously at the call that triggers it.
/// None of them are retried; callers are expected to treat them as fatal for
/// the operation (setup errors abort startup, draw errors abort the draw).
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A shader stage failed to parse or validate.
    ShaderCompile(ShaderCompileError),

    /// The two stages (or the capture outputs) do not fit together.
    ShaderLink(ShaderLinkError),

    /// A uniform block member uses a type with no `UniformValue` counterpart.
    UnsupportedUniformType { name: String, ty: String },

    /// The program declares no uniform with this name.
    UniformNotFound { name: String },

    /// The supplied value does not match the declared uniform kind.
    UniformTypeMismatch {
        name: String,
        expected: UniformKind,
        found: &'static str,
    },

    /// The attribute set has no attribute with this name.
    AttributeNotFound { name: String },

    /// Two descriptors in one attribute set share a name.
    DuplicateAttribute { name: String },

    /// Two descriptors in one attribute set pin the same slot.
    DuplicateLocation { location: u32 },

    /// A descriptor is malformed (bad component count, ragged data, ...).
    InvalidAttribute { name: String, reason: String },

    /// The backend has no vertex format for this component count / kind.
    UnsupportedVertexFormat {
        name: String,
        layout: AttributeLayout,
    },

    /// Instance divisors other than 0 and 1 cannot be expressed.
    UnsupportedDivisor { name: String, divisor: u32 },

    /// `set_buffer` was handed a buffer whose layout differs from the slot's.
    AttributeLayoutMismatch {
        name: String,
        expected: AttributeLayout,
        found: Option<AttributeLayout>,
    },

    /// The vertex stage reads a location no attribute provides.
    MissingVertexInput { location: u32 },

    /// The attribute bound at `location` has the wrong numeric kind.
    VertexInputMismatch {
        location: u32,
        format: wgpu::VertexFormat,
    },

    /// Capture destinations do not line up with the program's capture outputs.
    CaptureMismatch { reason: String },

    /// More instances were requested than the buffers were sized for.
    CapacityExceeded { requested: u32, capacity: u32 },

    /// The handle was released (or never belonged to this arena).
    StaleBuffer(BufferHandle),

    /// Host readback failed.
    Readback { reason: String },
}

impl Error {
    pub(crate) fn capture(reason: impl Into<String>) -> Self {
        Self::CaptureMismatch {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_attribute(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShaderCompile(e) => write!(f, "{e}"),
            Self::ShaderLink(e) => write!(f, "{e}"),
            Self::UnsupportedUniformType { name, ty } => {
                write!(f, "invalid uniform - name: {name}, type: {ty}")
            }
            Self::UniformNotFound { name } => write!(f, "uniform `{name}` is not declared"),
            Self::UniformTypeMismatch {
                name,
                expected,
                found,
            } => write!(f, "uniform `{name}` is {expected}, got a {found} value"),
            Self::AttributeNotFound { name } => write!(f, "attribute `{name}` not found"),
            Self::DuplicateAttribute { name } => write!(f, "attribute `{name}` declared twice"),
            Self::DuplicateLocation { location } => {
                write!(f, "attribute location {location} assigned twice")
            }
            Self::InvalidAttribute { name, reason } => {
                write!(f, "attribute `{name}` is invalid: {reason}")
            }
            Self::UnsupportedVertexFormat { name, layout } => {
                write!(f, "attribute `{name}` has no vertex format for {layout}")
            }
            Self::UnsupportedDivisor { name, divisor } => write!(
                f,
                "attribute `{name}` uses divisor {divisor}; \
                 only 0 (per-vertex) and 1 (per-instance) are supported"
            ),
            Self::AttributeLayoutMismatch {
                name,
                expected,
                found,
            } => match found {
                Some(found) => write!(
                    f,
                    "buffer bound to `{name}` is {found}, attribute expects {expected}"
                ),
                None => write!(
                    f,
                    "buffer bound to `{name}` carries no attribute layout, \
                     attribute expects {expected}"
                ),
            },
            Self::MissingVertexInput { location } => {
                write!(f, "vertex stage reads location {location} but no attribute is bound there")
            }
            Self::VertexInputMismatch { location, format } => write!(
                f,
                "vertex stage input at location {location} does not accept {format:?} data"
            ),
            Self::CaptureMismatch { reason } => write!(f, "capture mismatch: {reason}"),
            Self::CapacityExceeded {
                requested,
                capacity,
            } => write!(
                f,
                "requested {requested} instances but buffers hold {capacity}"
            ),
            Self::StaleBuffer(handle) => write!(f, "buffer handle {handle} is no longer live"),
            Self::Readback { reason } => write!(f, "buffer readback failed: {reason}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ShaderCompile(e) => Some(e),
            Self::ShaderLink(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShaderCompileError> for Error {
    fn from(e: ShaderCompileError) -> Self {
        Self::ShaderCompile(e)
    }
}

impl From<ShaderLinkError> for Error {
    fn from(e: ShaderLinkError) -> Self {
        Self::ShaderLink(e)
    }
}
