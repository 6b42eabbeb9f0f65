//! Vertex attribute sets.
//!
//! Each attribute owns one non-interleaved buffer in the context's arena and
//! is bound to a fixed shader location.

mod attribute;
mod set;

pub use attribute::{AttributeData, AttributeDesc, AttributeLayout, AttributeUsage, NumericKind};
pub use set::{AttributeSet, VertexLayout, VertexSlot};
