use std::fmt;

use glam::{Mat4, Vec3};

use crate::error::{Error, Result};

/// Declared type of a uniform block member.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Vec3,
    Mat4,
    /// Fixed-length `array<mat4x4<f32>, N>`.
    Mat4Array(u32),
}

impl UniformKind {
    /// Bytes occupied inside the block.
    pub const fn size(self) -> u64 {
        match self {
            Self::Int | Self::Float => 4,
            Self::Vec3 => 12,
            Self::Mat4 => 64,
            Self::Mat4Array(n) => 64 * n as u64,
        }
    }
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("i32"),
            Self::Float => f.write_str("f32"),
            Self::Vec3 => f.write_str("vec3<f32>"),
            Self::Mat4 => f.write_str("mat4x4<f32>"),
            Self::Mat4Array(n) => write!(f, "array<mat4x4<f32>, {n}>"),
        }
    }
}

/// Value assigned to a uniform.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
    Mat4(Mat4),
    Mat4Array(Vec<Mat4>),
}

impl UniformValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "i32",
            Self::Float(_) => "f32",
            Self::Vec3(_) => "vec3<f32>",
            Self::Mat4(_) => "mat4x4<f32>",
            Self::Mat4Array(_) => "mat4x4<f32> array",
        }
    }

    fn fits(&self, kind: UniformKind) -> bool {
        match (self, kind) {
            (Self::Int(_), UniformKind::Int)
            | (Self::Float(_), UniformKind::Float)
            | (Self::Vec3(_), UniformKind::Vec3)
            | (Self::Mat4(_), UniformKind::Mat4) => true,
            (Self::Mat4Array(v), UniformKind::Mat4Array(n)) => v.len() <= n as usize,
            _ => false,
        }
    }

    fn write_to(&self, dst: &mut [u8]) {
        match self {
            Self::Int(v) => dst[..4].copy_from_slice(&v.to_le_bytes()),
            Self::Float(v) => dst[..4].copy_from_slice(&v.to_le_bytes()),
            Self::Vec3(v) => dst[..12].copy_from_slice(bytemuck::cast_slice(&v.to_array())),
            Self::Mat4(m) => dst[..64].copy_from_slice(bytemuck::cast_slice(&m.to_cols_array())),
            Self::Mat4Array(ms) => {
                for (chunk, m) in dst.chunks_exact_mut(64).zip(ms) {
                    chunk.copy_from_slice(bytemuck::cast_slice(&m.to_cols_array()));
                }
            }
        }
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        Self::Vec3(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        Self::Mat4(v)
    }
}

impl From<Vec<Mat4>> for UniformValue {
    fn from(v: Vec<Mat4>) -> Self {
        Self::Mat4Array(v)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UniformMember {
    pub name: String,
    pub kind: UniformKind,
    pub offset: u32,
}

/// Reflected layout of the `@group(0) @binding(0)` uniform struct.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct UniformLayout {
    members: Vec<UniformMember>,
    size: u64,
}

impl UniformLayout {
    pub fn new(members: Vec<UniformMember>, size: u64) -> Self {
        Self { members, size }
    }

    pub fn members(&self) -> &[UniformMember] {
        &self.members
    }

    pub fn find(&self, name: &str) -> Option<&UniformMember> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Size of the GPU buffer backing the block: at least 16 bytes, 16-aligned.
    pub fn buffer_size(&self) -> u64 {
        self.size.max(16).next_multiple_of(16)
    }
}

/// CPU-side copy of a program's uniform block.
///
/// Values persist until overwritten; each pass uploads the whole block.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let bytes = vec![0; layout.buffer_size() as usize];
        Self { layout, bytes }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn set(&mut self, name: &str, value: &UniformValue) -> Result<()> {
        let member = self
            .layout
            .find(name)
            .ok_or_else(|| Error::UniformNotFound {
                name: name.to_string(),
            })?;

        if !value.fits(member.kind) {
            return Err(Error::UniformTypeMismatch {
                name: name.to_string(),
                expected: member.kind,
                found: value.type_name(),
            });
        }

        let start = member.offset as usize;
        let end = start + member.kind.size() as usize;
        value.write_to(&mut self.bytes[start..end]);
        Ok(())
    }

    pub fn apply(&mut self, uniforms: &Uniforms) -> Result<()> {
        for (name, value) in uniforms.iter() {
            self.set(name, value)?;
        }
        Ok(())
    }
}

/// Named values handed to a pass.
///
/// Setting a name twice keeps the latest value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uniforms {
    values: Vec<(String, UniformValue)>,
}

impl Uniforms {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: impl Into<UniformValue>) -> &mut Self {
        let value = value.into();
        match self.values.iter_mut().find(|(n, _)| n.as_str() == name) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((name.to_string(), value)),
        }
        self
    }

    pub fn with(mut self, name: &str, value: impl Into<UniformValue>) -> Self {
        self.set(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&UniformValue> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &UniformValue)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
