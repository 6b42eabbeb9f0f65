use std::fmt;

/// Programmable stage a diagnostic belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// A stage failed to parse or validate.
///
/// `Display` renders the block printed at startup:
///
/// ```text
/// [Shader] vertex shader has error
///
/// ---
///
/// <compiler log>
///
/// ---
///
/// 1: first source line
/// 2: ...
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderCompileError {
    pub stage: ShaderStage,
    pub log: String,
    pub source: String,
}

impl ShaderCompileError {
    pub fn new(stage: ShaderStage, log: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            stage,
            log: log.into(),
            source: source.into(),
        }
    }

    /// Source with 1-indexed `"{n}: "` prefixes.
    pub fn annotated_source(&self) -> String {
        annotate_source(&self.source)
    }
}

pub(crate) fn annotate_source(source: &str) -> String {
    source
        .split('\n')
        .enumerate()
        .map(|(i, line)| format!("{}: {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

impl fmt::Display for ShaderCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[Shader] {} shader has error\n\n---\n\n{}\n\n---\n\n{}",
            self.stage,
            self.log.trim_end(),
            self.annotated_source()
        )
    }
}

impl std::error::Error for ShaderCompileError {}

/// The stages compiled but do not form a usable program.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderLinkError {
    pub log: String,
}

impl ShaderLinkError {
    pub fn new(log: impl Into<String>) -> Self {
        Self { log: log.into() }
    }
}

impl fmt::Display for ShaderLinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Shader] program link failed: {}", self.log)
    }
}

impl std::error::Error for ShaderLinkError {}
