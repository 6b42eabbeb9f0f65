use std::fmt;

use crate::error::{Error, Result};

/// Element type of an attribute buffer.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum NumericKind {
    /// Read by the shader as `f32` components.
    Float32,
    /// Read by the shader as `u32` components (no normalization).
    Uint16,
}

impl NumericKind {
    pub const fn size(self) -> u64 {
        match self {
            Self::Float32 => 4,
            Self::Uint16 => 2,
        }
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Float32 => "f32",
            Self::Uint16 => "u16",
        })
    }
}

/// Element count and numeric kind of one attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct AttributeLayout {
    pub components: u32,
    pub kind: NumericKind,
}

impl AttributeLayout {
    pub const fn new(components: u32, kind: NumericKind) -> Self {
        Self { components, kind }
    }

    pub const fn float(components: u32) -> Self {
        Self::new(components, NumericKind::Float32)
    }

    /// Bytes per element.
    pub const fn stride(self) -> u64 {
        self.components as u64 * self.kind.size()
    }

    /// Matching wgpu vertex format, if the backend has one.
    ///
    /// Vertex strides must be multiples of 4 bytes, which rules out u16 with
    /// 1 or 3 components.
    pub fn vertex_format(self) -> Option<wgpu::VertexFormat> {
        use wgpu::VertexFormat as F;

        match (self.kind, self.components) {
            (NumericKind::Float32, 1) => Some(F::Float32),
            (NumericKind::Float32, 2) => Some(F::Float32x2),
            (NumericKind::Float32, 3) => Some(F::Float32x3),
            (NumericKind::Float32, 4) => Some(F::Float32x4),
            (NumericKind::Uint16, 2) => Some(F::Uint16x2),
            (NumericKind::Uint16, 4) => Some(F::Uint16x4),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.kind, self.components)
    }
}

/// Initial contents of an attribute buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeData {
    Float32(Vec<f32>),
    Uint16(Vec<u16>),
}

impl AttributeData {
    pub fn kind(&self) -> NumericKind {
        match self {
            Self::Float32(_) => NumericKind::Float32,
            Self::Uint16(_) => NumericKind::Uint16,
        }
    }

    /// Number of scalar values.
    pub fn len(&self) -> usize {
        match self {
            Self::Float32(v) => v.len(),
            Self::Uint16(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Float32(v) => bytemuck::cast_slice(v),
            Self::Uint16(v) => bytemuck::cast_slice(v),
        }
    }

    /// Pads with zeros up to `len` scalars.
    pub(crate) fn zero_extend(&mut self, len: usize) {
        match self {
            Self::Float32(v) if v.len() < len => v.resize(len, 0.0),
            Self::Uint16(v) if v.len() < len => v.resize(len, 0),
            _ => {}
        }
    }
}

/// Buffer usage hint.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum AttributeUsage {
    /// Uploaded once, only read as a vertex buffer.
    #[default]
    Static,
    /// Rewritten on the GPU; may also be bound as a capture destination.
    Dynamic,
}

impl AttributeUsage {
    pub(crate) fn buffer_usages(self) -> wgpu::BufferUsages {
        let base = wgpu::BufferUsages::VERTEX
            | wgpu::BufferUsages::COPY_SRC
            | wgpu::BufferUsages::COPY_DST;
        match self {
            Self::Static => base,
            Self::Dynamic => base | wgpu::BufferUsages::STORAGE,
        }
    }
}

/// One named attribute of an [`AttributeSet`](super::AttributeSet).
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDesc {
    pub name: String,

    /// Components per element (1..=4).
    pub components: u32,

    pub data: AttributeData,

    /// 0 advances per vertex, 1 advances per instance.
    pub divisor: u32,

    pub usage: AttributeUsage,

    /// Explicit shader location. Unpinned attributes take the next free slot.
    pub location: Option<u32>,
}

impl AttributeDesc {
    pub fn float(name: impl Into<String>, components: u32, data: Vec<f32>) -> Self {
        Self::new(name, components, AttributeData::Float32(data))
    }

    pub fn uint16(name: impl Into<String>, components: u32, data: Vec<u16>) -> Self {
        Self::new(name, components, AttributeData::Uint16(data))
    }

    pub fn new(name: impl Into<String>, components: u32, data: AttributeData) -> Self {
        Self {
            name: name.into(),
            components,
            data,
            divisor: 0,
            usage: AttributeUsage::Static,
            location: None,
        }
    }

    pub fn per_instance(self) -> Self {
        self.with_divisor(1)
    }

    pub fn with_divisor(mut self, divisor: u32) -> Self {
        self.divisor = divisor;
        self
    }

    pub fn at_location(mut self, location: u32) -> Self {
        self.location = Some(location);
        self
    }

    pub fn dynamic(mut self) -> Self {
        self.usage = AttributeUsage::Dynamic;
        self
    }

    pub fn layout(&self) -> AttributeLayout {
        AttributeLayout::new(self.components, self.data.kind())
    }

    /// Number of whole elements in `data`.
    pub fn element_count(&self) -> u32 {
        if self.components == 0 {
            return 0;
        }
        (self.data.len() / self.components as usize) as u32
    }

    pub(crate) fn step_mode(&self) -> wgpu::VertexStepMode {
        if self.divisor == 0 {
            wgpu::VertexStepMode::Vertex
        } else {
            wgpu::VertexStepMode::Instance
        }
    }

    pub(crate) fn validate(&self) -> Result<wgpu::VertexFormat> {
        if !(1..=4).contains(&self.components) {
            return Err(Error::invalid_attribute(
                &self.name,
                format!("component count {} is outside 1..=4", self.components),
            ));
        }
        if self.data.len() % self.components as usize != 0 {
            return Err(Error::invalid_attribute(
                &self.name,
                format!(
                    "{} values do not divide into {}-component elements",
                    self.data.len(),
                    self.components
                ),
            ));
        }
        if self.divisor > 1 {
            return Err(Error::UnsupportedDivisor {
                name: self.name.clone(),
                divisor: self.divisor,
            });
        }

        self.layout()
            .vertex_format()
            .ok_or_else(|| Error::UnsupportedVertexFormat {
                name: self.name.clone(),
                layout: self.layout(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stride_follows_kind() {
        assert_eq!(AttributeLayout::float(3).stride(), 12);
        assert_eq!(AttributeLayout::new(2, NumericKind::Uint16).stride(), 4);
    }

    #[test]
    fn float_attributes_validate() {
        let desc = AttributeDesc::float("p", 3, vec![1., 2., 3., 4., 5., 6.]);
        assert_eq!(desc.validate(), Ok(wgpu::VertexFormat::Float32x3));
        assert_eq!(desc.element_count(), 2);
        assert_eq!(desc.step_mode(), wgpu::VertexStepMode::Vertex);
    }

    #[test]
    fn odd_stride_u16_has_no_format() {
        for components in [1, 3] {
            let desc = AttributeDesc::uint16("id", components, vec![0; components as usize * 2]);
            assert_eq!(
                desc.validate(),
                Err(Error::UnsupportedVertexFormat {
                    name: "id".into(),
                    layout: AttributeLayout::new(components, NumericKind::Uint16),
                })
            );
        }
        let desc = AttributeDesc::uint16("id", 2, vec![0; 4]);
        assert_eq!(desc.validate(), Ok(wgpu::VertexFormat::Uint16x2));
    }

    #[test]
    fn ragged_data_is_rejected() {
        let desc = AttributeDesc::float("p", 3, vec![0.0; 4]);
        assert!(matches!(
            desc.validate(),
            Err(Error::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn component_count_is_bounded() {
        let desc = AttributeDesc::float("p", 5, vec![0.0; 5]);
        assert!(matches!(
            desc.validate(),
            Err(Error::InvalidAttribute { .. })
        ));
    }

    #[test]
    fn divisor_above_one_is_rejected() {
        let desc = AttributeDesc::float("c", 3, vec![0.0; 3]).with_divisor(2);
        assert_eq!(
            desc.validate(),
            Err(Error::UnsupportedDivisor {
                name: "c".into(),
                divisor: 2
            })
        );
        let desc = AttributeDesc::float("c", 3, vec![0.0; 3]).per_instance();
        assert_eq!(desc.step_mode(), wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn dynamic_buffers_are_storage_capable() {
        assert!(
            AttributeUsage::Dynamic
                .buffer_usages()
                .contains(wgpu::BufferUsages::STORAGE)
        );
        assert!(
            !AttributeUsage::Static
                .buffer_usages()
                .contains(wgpu::BufferUsages::STORAGE)
        );
    }

    #[test]
    fn zero_extend_pads_short_data() {
        let mut data = AttributeData::Float32(vec![1.0]);
        data.zero_extend(3);
        assert_eq!(data, AttributeData::Float32(vec![1.0, 0.0, 0.0]));
    }
}
