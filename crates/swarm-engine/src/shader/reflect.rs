//! WGSL front-end and interface checks.
//!
//! Compilation is parse + validate per stage. Linking walks both modules and
//! checks that they agree on the stage interface, the uniform block and the
//! capture outputs.

use std::fmt;

use naga::valid::{Capabilities, GlobalUse, ModuleInfo, ValidationFlags, Validator};
use naga::{AddressSpace, ArraySize, Binding, Module, Scalar, ScalarKind, StorageAccess, TypeInner};

use super::error::{ShaderCompileError, ShaderLinkError, ShaderStage};
use super::uniform::{UniformKind, UniformLayout, UniformMember};
use crate::error::{Error, Result};

/// Bind group holding the uniform block.
pub const UNIFORM_GROUP: u32 = 0;
/// Bind group holding capture destinations.
pub const CAPTURE_GROUP: u32 = 1;

pub(crate) struct ParsedStage {
    stage: ShaderStage,
    module: Module,
    info: ModuleInfo,
}

pub(crate) fn parse_stage(
    stage: ShaderStage,
    source: &str,
) -> std::result::Result<ParsedStage, ShaderCompileError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| ShaderCompileError::new(stage, e.emit_to_string(source), source))?;

    let info = Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|e| ShaderCompileError::new(stage, e.emit_to_string(source), source))?;

    Ok(ParsedStage {
        stage,
        module,
        info,
    })
}

impl ParsedStage {
    fn entry_point(&self) -> std::result::Result<(usize, &naga::EntryPoint), ShaderLinkError> {
        let mut found = self
            .module
            .entry_points
            .iter()
            .enumerate()
            .filter(|(_, ep)| ep.stage == self.stage.naga());

        match (found.next(), found.next()) {
            (Some(ep), None) => Ok(ep),
            (None, _) => Err(ShaderLinkError::new(format!(
                "{} source declares no @{} entry point",
                self.stage, self.stage
            ))),
            (Some(_), Some(_)) => Err(ShaderLinkError::new(format!(
                "{} source declares more than one @{} entry point",
                self.stage, self.stage
            ))),
        }
    }
}

/// Scalar or vector type crossing a stage boundary.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct IoType {
    pub(crate) kind: ScalarKind,
    pub(crate) components: u32,
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scalar = scalar_name(Scalar {
            kind: self.kind,
            width: 4,
        });
        match self.components {
            1 => f.write_str(&scalar),
            n => write!(f, "vec{n}<{scalar}>"),
        }
    }
}

/// A capture output resolved against the vertex module.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct CaptureSlot {
    pub name: String,
    pub binding: u32,
    pub(crate) scalar: ScalarKind,
}

/// Everything pipeline creation needs to know about a linked program.
pub(crate) struct LinkedProgram {
    pub(crate) vertex_entry: String,
    pub(crate) fragment_entry: String,
    pub(crate) vertex_inputs: Vec<(u32, IoType)>,
    pub(crate) uniforms: UniformLayout,
    pub(crate) captures: Vec<CaptureSlot>,
}

pub(crate) fn link(
    vertex: &ParsedStage,
    fragment: &ParsedStage,
    capture_outputs: &[&str],
) -> Result<LinkedProgram> {
    let (vs_index, vs) = vertex.entry_point()?;
    let (fs_index, fs) = fragment.entry_point()?;

    let mut vertex_inputs = Vec::new();
    let mut vertex_outputs = Vec::new();
    for arg in &vs.function.arguments {
        collect_locations(&vertex.module, arg.ty, arg.binding.as_ref(), &mut vertex_inputs);
    }
    if let Some(result) = &vs.function.result {
        collect_locations(&vertex.module, result.ty, result.binding.as_ref(), &mut vertex_outputs);
    }

    let mut fragment_inputs = Vec::new();
    for arg in &fs.function.arguments {
        collect_locations(&fragment.module, arg.ty, arg.binding.as_ref(), &mut fragment_inputs);
    }

    for (location, wanted) in &fragment_inputs {
        match vertex_outputs.iter().find(|(l, _)| l == location) {
            None => {
                return Err(ShaderLinkError::new(format!(
                    "fragment input at location {location} is not written by the vertex stage"
                ))
                .into());
            }
            Some((_, written)) if written != wanted => {
                return Err(ShaderLinkError::new(format!(
                    "location {location}: vertex stage writes {written}, \
                     fragment stage reads {wanted}"
                ))
                .into());
            }
            Some(_) => {}
        }
    }

    let vs_uniforms = uniform_layout(&vertex.module)?;
    let fs_uniforms = uniform_layout(&fragment.module)?;
    let uniforms = match (vs_uniforms, fs_uniforms) {
        (Some(a), Some(b)) if a != b => {
            return Err(ShaderLinkError::new(
                "vertex and fragment stages declare different uniform blocks",
            )
            .into());
        }
        (Some(a), _) => a,
        (None, Some(b)) => b,
        (None, None) => UniformLayout::default(),
    };

    let captures = capture_slots(vertex, vs_index, capture_outputs)?;
    check_resource_groups(vertex, vs_index, &captures)?;
    check_resource_groups(fragment, fs_index, &[])?;

    Ok(LinkedProgram {
        vertex_entry: vs.name.clone(),
        fragment_entry: fs.name.clone(),
        vertex_inputs,
        uniforms,
        captures,
    })
}

fn collect_locations(
    module: &Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&Binding>,
    out: &mut Vec<(u32, IoType)>,
) {
    match binding {
        Some(Binding::Location { location, .. }) => {
            if let Some(io) = io_type(module, ty) {
                out.push((*location, io));
            }
        }
        Some(Binding::BuiltIn(_)) => {}
        None => {
            if let TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    collect_locations(module, member.ty, member.binding.as_ref(), out);
                }
            }
        }
    }
}

fn io_type(module: &Module, ty: naga::Handle<naga::Type>) -> Option<IoType> {
    match module.types[ty].inner {
        TypeInner::Scalar(scalar) => Some(IoType {
            kind: scalar.kind,
            components: 1,
        }),
        TypeInner::Vector { size, scalar } => Some(IoType {
            kind: scalar.kind,
            components: size as u32,
        }),
        _ => None,
    }
}

fn uniform_layout(module: &Module) -> Result<Option<UniformLayout>> {
    let mut layout = None;

    for (_, var) in module.global_variables.iter() {
        if var.space != AddressSpace::Uniform {
            continue;
        }
        let name = var.name.as_deref().unwrap_or("<unnamed>");

        let at_slot = matches!(
            var.binding,
            Some(naga::ResourceBinding {
                group: UNIFORM_GROUP,
                binding: 0
            })
        );
        if !at_slot {
            return Err(ShaderLinkError::new(format!(
                "uniform `{name}` must be bound at @group(0) @binding(0)"
            ))
            .into());
        }
        if layout.is_some() {
            return Err(ShaderLinkError::new("only one uniform block is supported").into());
        }

        let TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
            return Err(ShaderLinkError::new(format!(
                "uniform `{name}` must be a struct of named members"
            ))
            .into());
        };

        let mut reflected = Vec::with_capacity(members.len());
        for member in members {
            let member_name = member.name.clone().unwrap_or_default();
            let kind = uniform_kind(module, member.ty).ok_or_else(|| {
                Error::UnsupportedUniformType {
                    name: member_name.clone(),
                    ty: type_name(module, member.ty),
                }
            })?;
            reflected.push(UniformMember {
                name: member_name,
                kind,
                offset: member.offset,
            });
        }

        layout = Some(UniformLayout::new(reflected, u64::from(*span)));
    }

    Ok(layout)
}

fn is_mat4(module: &Module, ty: naga::Handle<naga::Type>) -> bool {
    matches!(
        module.types[ty].inner,
        TypeInner::Matrix {
            columns: naga::VectorSize::Quad,
            rows: naga::VectorSize::Quad,
            scalar,
        } if scalar == Scalar::F32
    )
}

fn uniform_kind(module: &Module, ty: naga::Handle<naga::Type>) -> Option<UniformKind> {
    match module.types[ty].inner {
        TypeInner::Scalar(s) if s == Scalar::I32 => Some(UniformKind::Int),
        TypeInner::Scalar(s) if s == Scalar::F32 => Some(UniformKind::Float),
        TypeInner::Vector {
            size: naga::VectorSize::Tri,
            scalar,
        } if scalar == Scalar::F32 => Some(UniformKind::Vec3),
        TypeInner::Matrix { .. } if is_mat4(module, ty) => Some(UniformKind::Mat4),
        TypeInner::Array {
            base,
            size: ArraySize::Constant(n),
            ..
        } if is_mat4(module, base) => Some(UniformKind::Mat4Array(n.get())),
        _ => None,
    }
}

fn scalar_name(scalar: Scalar) -> String {
    let prefix = match scalar.kind {
        ScalarKind::Sint => "i",
        ScalarKind::Uint => "u",
        ScalarKind::Float => "f",
        ScalarKind::Bool => return "bool".to_string(),
        _ => return "abstract".to_string(),
    };
    format!("{prefix}{}", u32::from(scalar.width) * 8)
}

/// WGSL-like spelling of a type, for diagnostics.
fn type_name(module: &Module, ty: naga::Handle<naga::Type>) -> String {
    let ty = &module.types[ty];
    match ty.inner {
        TypeInner::Scalar(s) => scalar_name(s),
        TypeInner::Vector { size, scalar } => {
            format!("vec{}<{}>", size as u32, scalar_name(scalar))
        }
        TypeInner::Matrix {
            columns,
            rows,
            scalar,
        } => format!(
            "mat{}x{}<{}>",
            columns as u32,
            rows as u32,
            scalar_name(scalar)
        ),
        TypeInner::Array { base, size, .. } => match size {
            ArraySize::Constant(n) => format!("array<{}, {n}>", type_name(module, base)),
            _ => format!("array<{}>", type_name(module, base)),
        },
        TypeInner::Struct { .. } => ty.name.clone().unwrap_or_else(|| "struct".to_string()),
        _ => "opaque".to_string(),
    }
}

fn capture_slots(
    vertex: &ParsedStage,
    entry_index: usize,
    names: &[&str],
) -> Result<Vec<CaptureSlot>> {
    let module = &vertex.module;
    let uses = vertex.info.get_entry_point(entry_index);
    let mut slots: Vec<CaptureSlot> = Vec::with_capacity(names.len());

    for &name in names {
        let fail = |why: &str| ShaderLinkError::new(format!("capture output `{name}` {why}"));

        if slots.iter().any(|s| s.name == name) {
            return Err(fail("is listed twice").into());
        }

        let (handle, var) = module
            .global_variables
            .iter()
            .find(|(_, v)| v.name.as_deref() == Some(name))
            .ok_or_else(|| fail("is not declared in the vertex stage"))?;

        let writable = matches!(
            var.space,
            AddressSpace::Storage { access } if access.contains(StorageAccess::STORE)
        );
        if !writable {
            return Err(fail("must be a var<storage, read_write>").into());
        }

        let binding = match var.binding {
            Some(rb) if rb.group == CAPTURE_GROUP => rb.binding,
            _ => return Err(fail("must be bound in @group(1)").into()),
        };

        let scalar = match module.types[var.ty].inner {
            TypeInner::Array {
                base,
                size: ArraySize::Dynamic,
                ..
            } => match module.types[base].inner {
                TypeInner::Scalar(s)
                    if s.width == 4
                        && matches!(
                            s.kind,
                            ScalarKind::Float | ScalarKind::Uint | ScalarKind::Sint
                        ) =>
                {
                    s.kind
                }
                _ => return Err(fail("must be an array of 32-bit scalars").into()),
            },
            _ => return Err(fail("must be a runtime-sized array").into()),
        };

        if !uses[handle].contains(GlobalUse::WRITE) {
            return Err(fail("is never written by the vertex entry point").into());
        }

        slots.push(CaptureSlot {
            name: name.to_string(),
            binding,
            scalar,
        });
    }

    Ok(slots)
}

/// Rejects bindings the pipeline layout cannot provide.
///
/// Only globals the entry point touches count, so one source file can carry
/// both stages.
fn check_resource_groups(
    stage: &ParsedStage,
    entry_index: usize,
    captures: &[CaptureSlot],
) -> Result<()> {
    let uses = stage.info.get_entry_point(entry_index);
    for (handle, var) in stage.module.global_variables.iter() {
        let Some(rb) = var.binding else { continue };
        if uses[handle].is_empty() {
            continue;
        }
        let name = var.name.as_deref().unwrap_or("<unnamed>");

        let ok = match rb.group {
            UNIFORM_GROUP => var.space == AddressSpace::Uniform && rb.binding == 0,
            CAPTURE_GROUP => captures
                .iter()
                .any(|c| c.binding == rb.binding && Some(c.name.as_str()) == var.name.as_deref()),
            _ => false,
        };

        if !ok {
            return Err(ShaderLinkError::new(format!(
                "binding `{name}` at @group({}) @binding({}) is neither the uniform block \
                 nor a listed capture output",
                rb.group, rb.binding
            ))
            .into());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMULATE: &str = r#"
struct Params {
    uTime: f32,
    uSteps: i32,
    uTarget: vec3<f32>,
}

@group(0) @binding(0) var<uniform> params: Params;
@group(1) @binding(0) var<storage, read_write> a: array<f32>;
@group(1) @binding(1) var<storage, read_write> b: array<f32>;

@vertex
fn vs_main(@builtin(vertex_index) i: u32, @location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
    a[i] = p.x + params.uTime;
    b[i] = p.y;
    return vec4<f32>(0.0, 0.0, 2.0, 1.0);
}

@fragment
fn fs_main() {}
"#;

    const EMPTY_FRAGMENT: &str = "@fragment\nfn fs_main() {}\n";

    fn stages(vs: &str, fs: &str) -> (ParsedStage, ParsedStage) {
        (
            parse_stage(ShaderStage::Vertex, vs).unwrap(),
            parse_stage(ShaderStage::Fragment, fs).unwrap(),
        )
    }

    fn link_err(result: Result<LinkedProgram>) -> String {
        match result {
            Err(Error::ShaderLink(e)) => e.log,
            Err(other) => panic!("expected a link error, got {other}"),
            Ok(_) => panic!("expected a link error"),
        }
    }

    // ── compile ─────────────────────────────────────────────────────────────

    #[test]
    fn syntax_errors_carry_stage_and_source() {
        let src = "@vertex\nfn vs_main( -> {\n";
        let err = parse_stage(ShaderStage::Vertex, src).err().unwrap();
        assert_eq!(err.stage, ShaderStage::Vertex);
        assert!(!err.log.is_empty());
        assert!(err.to_string().starts_with("[Shader] vertex shader has error"));
        assert!(err.to_string().ends_with("1: @vertex\n2: fn vs_main( -> {\n3: "));
    }

    #[test]
    fn validation_errors_are_compile_errors() {
        let src = "@fragment\nfn fs_main() -> @location(0) vec4<f32> { return 1.0; }\n";
        let err = parse_stage(ShaderStage::Fragment, src).err().unwrap();
        assert_eq!(err.stage, ShaderStage::Fragment);
    }

    // ── link ────────────────────────────────────────────────────────────────

    #[test]
    fn reflects_uniforms_and_captures() {
        let (vs, fs) = stages(SIMULATE, SIMULATE);
        let linked = link(&vs, &fs, &["a", "b"]).unwrap();

        assert_eq!(linked.vertex_entry, "vs_main");
        assert_eq!(linked.fragment_entry, "fs_main");
        assert_eq!(
            linked.vertex_inputs,
            vec![(
                0,
                IoType {
                    kind: ScalarKind::Float,
                    components: 3
                }
            )]
        );

        let target = linked.uniforms.find("uTarget").unwrap();
        assert_eq!(target.kind, UniformKind::Vec3);
        assert_eq!(target.offset, 16);
        assert_eq!(linked.uniforms.find("uSteps").unwrap().kind, UniformKind::Int);
        assert_eq!(linked.uniforms.buffer_size(), 32);

        let names: Vec<_> = linked.captures.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(linked.captures[1].binding, 1);
    }

    #[test]
    fn capture_order_follows_the_list() {
        let (vs, fs) = stages(SIMULATE, EMPTY_FRAGMENT);
        let linked = link(&vs, &fs, &["b", "a"]).unwrap();
        assert_eq!(linked.captures[0].name, "b");
        assert_eq!(linked.captures[0].binding, 1);
    }

    #[test]
    fn unknown_capture_output_fails() {
        let (vs, fs) = stages(SIMULATE, EMPTY_FRAGMENT);
        let log = link_err(link(&vs, &fs, &["a", "b", "c"]));
        assert!(log.contains("`c`"), "{log}");
    }

    #[test]
    fn unlisted_capture_binding_fails() {
        let (vs, fs) = stages(SIMULATE, EMPTY_FRAGMENT);
        let log = link_err(link(&vs, &fs, &["a"]));
        assert!(log.contains("`b`"), "{log}");
    }

    #[test]
    fn unwritten_capture_output_fails() {
        let src = r#"
@group(1) @binding(0) var<storage, read_write> a: array<f32>;
@vertex
fn vs_main(@builtin(vertex_index) i: u32) -> @builtin(position) vec4<f32> {
    let x = a[i];
    return vec4<f32>(x, 0.0, 2.0, 1.0);
}
"#;
        let (vs, fs) = stages(src, EMPTY_FRAGMENT);
        let log = link_err(link(&vs, &fs, &["a"]));
        assert!(log.contains("never written"), "{log}");
    }

    #[test]
    fn fragment_input_must_be_produced() {
        let vs = r#"
@vertex
fn vs_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {
    return vec4<f32>(p, 1.0);
}
"#;
        let fs = r#"
@fragment
fn fs_main(@location(0) c: vec3<f32>) -> @location(0) vec4<f32> {
    return vec4<f32>(c, 1.0);
}
"#;
        let (vs, fs) = stages(vs, fs);
        let log = link_err(link(&vs, &fs, &[]));
        assert!(log.contains("location 0"), "{log}");
    }

    #[test]
    fn missing_entry_point_fails() {
        let (vs, fs) = stages(SIMULATE, "fn helper() -> f32 { return 1.0; }\n");
        let log = link_err(link(&vs, &fs, &["a", "b"]));
        assert!(log.contains("no @fragment entry point"), "{log}");
    }

    #[test]
    fn shared_source_does_not_leak_captures_into_fragment() {
        let (vs, fs) = stages(SIMULATE, SIMULATE);
        assert!(link(&vs, &fs, &["a", "b"]).is_ok());
    }

    #[test]
    fn unsupported_uniform_type_is_named() {
        let src = r#"
struct U { uColor: vec4<f32> }
@group(0) @binding(0) var<uniform> u: U;
@vertex
fn vs_main() -> @builtin(position) vec4<f32> {
    return u.uColor;
}
"#;
        let (vs, fs) = stages(src, EMPTY_FRAGMENT);
        match link(&vs, &fs, &[]) {
            Err(Error::UnsupportedUniformType { name, ty }) => {
                assert_eq!(name, "uColor");
                assert_eq!(ty, "vec4<f32>");
            }
            Err(other) => panic!("unexpected error {other}"),
            Ok(_) => panic!("vec4 uniforms are not supported"),
        }
    }

    #[test]
    fn matrix_arrays_are_reflected() {
        let src = r#"
struct U { uBones: array<mat4x4<f32>, 4>, uWorld: mat4x4<f32> }
@group(0) @binding(0) var<uniform> u: U;
@vertex
fn vs_main() -> @builtin(position) vec4<f32> {
    return u.uWorld * u.uBones[1][0];
}
"#;
        let (vs, fs) = stages(src, EMPTY_FRAGMENT);
        let linked = link(&vs, &fs, &[]).unwrap();
        assert_eq!(
            linked.uniforms.find("uBones").unwrap().kind,
            UniformKind::Mat4Array(4)
        );
        assert_eq!(linked.uniforms.find("uWorld").unwrap().offset, 256);
    }
}
