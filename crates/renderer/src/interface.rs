//! Static check of a WGSL program against the uniform contract.
//!
//! The harness binds exactly one 24-byte uniform buffer at
//! `@group(0) @binding(0)` and calls `vs_main` / `fs_main`. A shader that
//! disagrees with that layout still compiles, but renders garbage or fails
//! pipeline creation with an opaque driver message, so the mismatch is
//! reported here first with the offending declaration.

use std::fmt;

use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Module, ScalarKind, ShaderStage, TypeInner};
use thiserror::Error;
use tracing::{debug, warn};

use crate::gpu::uniforms::{FRAME_UNIFORMS_SIZE, PADDING_OFFSET, UNIFORM_SLOTS};
use crate::types::{FRAGMENT_ENTRY_POINT, VERTEX_ENTRY_POINT};

#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("failed to parse WGSL:\n{0}")]
    Parse(String),
    #[error("shader failed validation:\n{0}")]
    Invalid(String),
    #[error("missing {stage} entry point `{name}`")]
    MissingEntryPoint { stage: &'static str, name: &'static str },
    #[error("no `var<uniform>` declared at @group(0) @binding(0)")]
    MissingUniform,
    #[error("unexpected resource binding at @group({group}) @binding({binding})")]
    UnexpectedBinding { group: u32, binding: u32 },
    #[error("uniform block is {span} bytes but only {available} are written each frame")]
    UniformTooLarge { span: u32, available: u32 },
    #[error("uniform member `{member}` at offset {offset} is not f32 data")]
    NonFloatMember { member: String, offset: u32 },
}

/// One `f32` the shader reads from the uniform block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSlot {
    pub member: String,
    pub offset: u32,
}

/// What the shader declares, for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInterface {
    pub uniform_name: Option<String>,
    pub uniform_size: u32,
    pub slots: Vec<DeclaredSlot>,
    /// Names of payload slots no declaration covers.
    pub unused: Vec<&'static str>,
}

impl ShaderInterface {
    /// True when the shader maps a value over the always-zero padding slot.
    ///
    /// Members whose name starts with `_` are treated as deliberate padding.
    pub fn reads_padding(&self) -> bool {
        self.slots.iter().any(|slot| {
            let leaf = slot.member.rsplit('.').next().unwrap_or(&slot.member);
            slot.offset == PADDING_OFFSET && !leaf.starts_with('_')
        })
    }
}

impl fmt::Display for ShaderInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "uniform {} ({} of {} bytes)",
            self.uniform_name.as_deref().unwrap_or("<unnamed>"),
            self.uniform_size,
            FRAME_UNIFORMS_SIZE
        )?;
        for slot in &self.slots {
            let payload = UNIFORM_SLOTS
                .iter()
                .find(|candidate| candidate.offset == slot.offset)
                .map(|candidate| candidate.name)
                .unwrap_or("?");
            writeln!(f, "  +{:<2} {:<24} <- {}", slot.offset, slot.member, payload)?;
        }
        if !self.unused.is_empty() {
            writeln!(f, "  unused: {}", self.unused.join(", "))?;
        }
        Ok(())
    }
}

/// Parses and validates `source`, then checks it against the uniform contract.
pub fn check_source(source: &str) -> Result<ShaderInterface, InterfaceError> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|err| InterfaceError::Parse(err.emit_to_string(source)))?;
    Validator::new(ValidationFlags::all(), Capabilities::all())
        .validate(&module)
        .map_err(|err| InterfaceError::Invalid(err.emit_to_string(source)))?;
    check_module(&module)
}

/// Checks an already parsed module.
pub fn check_module(module: &Module) -> Result<ShaderInterface, InterfaceError> {
    require_entry_point(module, ShaderStage::Vertex, "vertex", VERTEX_ENTRY_POINT)?;
    require_entry_point(module, ShaderStage::Fragment, "fragment", FRAGMENT_ENTRY_POINT)?;

    let mut uniform = None;
    for (_, global) in module.global_variables.iter() {
        let Some(binding) = global.binding.as_ref() else {
            continue;
        };
        let is_frame_uniform = binding.group == 0
            && binding.binding == 0
            && matches!(global.space, AddressSpace::Uniform);
        if !is_frame_uniform {
            return Err(InterfaceError::UnexpectedBinding {
                group: binding.group,
                binding: binding.binding,
            });
        }
        uniform = Some(global);
    }
    let uniform = uniform.ok_or(InterfaceError::MissingUniform)?;

    let ty = &module.types[uniform.ty];
    let mut slots = Vec::new();
    let uniform_size = match &ty.inner {
        TypeInner::Struct { members, span } => {
            for member in members {
                let name = member
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("member@{}", member.offset));
                flatten(module, &module.types[member.ty].inner, name, member.offset, &mut slots)?;
            }
            *span
        }
        inner => {
            let name = uniform.name.clone().unwrap_or_else(|| "uniform".to_string());
            flatten(module, inner, name, 0, &mut slots)?;
            inner.size(module.to_ctx())
        }
    };

    let available = FRAME_UNIFORMS_SIZE as u32;
    if uniform_size > available {
        return Err(InterfaceError::UniformTooLarge {
            span: uniform_size,
            available,
        });
    }

    let unused: Vec<&'static str> = UNIFORM_SLOTS
        .iter()
        .filter(|slot| slot.offset != PADDING_OFFSET)
        .filter(|slot| !slots.iter().any(|declared| declared.offset == slot.offset))
        .map(|slot| slot.name)
        .collect();

    let interface = ShaderInterface {
        uniform_name: uniform.name.clone(),
        uniform_size,
        slots,
        unused,
    };

    if interface.reads_padding() {
        warn!(
            offset = PADDING_OFFSET,
            "shader reads the padding slot, which is always zero"
        );
    }
    for name in &interface.unused {
        debug!(slot = *name, "uniform slot is not declared by the shader");
    }

    Ok(interface)
}

fn require_entry_point(
    module: &Module,
    stage: ShaderStage,
    stage_name: &'static str,
    name: &'static str,
) -> Result<(), InterfaceError> {
    let found = module
        .entry_points
        .iter()
        .any(|entry| entry.stage == stage && entry.name == name);
    if found {
        Ok(())
    } else {
        Err(InterfaceError::MissingEntryPoint {
            stage: stage_name,
            name,
        })
    }
}

fn flatten(
    module: &Module,
    inner: &TypeInner,
    name: String,
    offset: u32,
    slots: &mut Vec<DeclaredSlot>,
) -> Result<(), InterfaceError> {
    match inner {
        TypeInner::Scalar(scalar) if is_f32(scalar.kind, scalar.width) => {
            slots.push(DeclaredSlot {
                member: name,
                offset,
            });
            Ok(())
        }
        TypeInner::Vector { size, scalar } if is_f32(scalar.kind, scalar.width) => {
            for lane in 0..*size as u32 {
                slots.push(DeclaredSlot {
                    member: format!("{name}[{lane}]"),
                    offset: offset + lane * 4,
                });
            }
            Ok(())
        }
        TypeInner::Struct { members, .. } => {
            for member in members {
                let child = match &member.name {
                    Some(child) => format!("{name}.{child}"),
                    None => format!("{name}@{}", member.offset),
                };
                flatten(
                    module,
                    &module.types[member.ty].inner,
                    child,
                    offset + member.offset,
                    slots,
                )?;
            }
            Ok(())
        }
        _ => Err(InterfaceError::NonFloatMember {
            member: name,
            offset,
        }),
    }
}

fn is_f32(kind: ScalarKind, width: u8) -> bool {
    kind == ScalarKind::Float && width == 4
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFERENCE: &str = r#"
struct Uniforms {
    resolution: vec2<f32>,
    time: f32,
    _pad: f32,
    mouse: vec2<f32>,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0), vec2<f32>(1.0, -1.0), vec2<f32>(-1.0, 1.0),
        vec2<f32>(-1.0, 1.0), vec2<f32>(1.0, -1.0), vec2<f32>(1.0, 1.0),
    );
    return vec4<f32>(corners[index], 0.0, 1.0);
}

@fragment
fn fs_main(@builtin(position) position: vec4<f32>) -> @location(0) vec4<f32> {
    let uv = position.xy / u.resolution;
    return vec4<f32>(uv, 0.5 + 0.5 * sin(u.time), 1.0) + vec4<f32>(u.mouse, 0.0, 0.0);
}
"#;

    fn shader(uniform_decl: &str, vertex: &str, fragment: &str) -> String {
        format!(
            r#"
{uniform_decl}

@vertex
fn {vertex}(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {{
    return vec4<f32>(f32(index), 0.0, 0.0, 1.0);
}}

@fragment
fn {fragment}() -> @location(0) vec4<f32> {{
    return vec4<f32>(1.0);
}}
"#
        )
    }

    #[test]
    fn reference_layout_is_accepted() {
        let interface = check_source(REFERENCE).expect("reference shader should pass");
        assert_eq!(interface.uniform_size, 24);
        assert_eq!(interface.uniform_name.as_deref(), Some("u"));
        let offsets: Vec<u32> = interface.slots.iter().map(|slot| slot.offset).collect();
        assert_eq!(offsets, vec![0, 4, 8, 12, 16, 20]);
        assert!(!interface.reads_padding());
        assert!(interface.unused.is_empty());
    }

    #[test]
    fn vector_over_the_padding_slot_is_flagged() {
        let source = shader(
            "struct U { resolution: vec2<f32>, clock: vec2<f32>, mouse: vec2<f32>, };\n@group(0) @binding(0) var<uniform> u: U;",
            "vs_main",
            "fs_main",
        );
        let interface = check_source(&source).unwrap();
        assert!(interface.reads_padding());
        let padding = interface
            .slots
            .iter()
            .find(|slot| slot.offset == 12)
            .map(|slot| slot.member.as_str());
        assert_eq!(padding, Some("clock[1]"));
    }

    #[test]
    fn partial_layout_reports_unused_slots() {
        let source = shader(
            "struct U { resolution: vec2<f32>, time: f32, };\n@group(0) @binding(0) var<uniform> u: U;",
            "vs_main",
            "fs_main",
        );
        let interface = check_source(&source).unwrap();
        assert_eq!(interface.uniform_size, 16);
        assert!(!interface.reads_padding());
        assert_eq!(interface.unused, vec!["pointer_x", "pointer_y"]);
    }

    #[test]
    fn missing_fragment_entry_point_is_rejected() {
        let source = shader(
            "@group(0) @binding(0) var<uniform> u: vec4<f32>;",
            "vs_main",
            "main",
        );
        let err = check_source(&source).unwrap_err();
        assert!(matches!(
            err,
            InterfaceError::MissingEntryPoint { name: "fs_main", .. }
        ));
    }

    #[test]
    fn uniform_on_the_wrong_binding_is_rejected() {
        let source = shader(
            "@group(0) @binding(1) var<uniform> u: vec4<f32>;",
            "vs_main",
            "fs_main",
        );
        let err = check_source(&source).unwrap_err();
        assert!(matches!(
            err,
            InterfaceError::UnexpectedBinding { group: 0, binding: 1 }
        ));
    }

    #[test]
    fn shader_without_uniform_is_rejected() {
        let source = shader("", "vs_main", "fs_main");
        assert!(matches!(
            check_source(&source),
            Err(InterfaceError::MissingUniform)
        ));
    }

    #[test]
    fn integer_members_are_rejected() {
        let source = shader(
            "struct U { resolution: vec2<f32>, frame: u32, };\n@group(0) @binding(0) var<uniform> u: U;",
            "vs_main",
            "fs_main",
        );
        match check_source(&source).unwrap_err() {
            InterfaceError::NonFloatMember { member, offset } => {
                assert_eq!(member, "frame");
                assert_eq!(offset, 8);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn oversized_uniform_is_rejected() {
        let source = shader(
            "struct U { a: vec4<f32>, b: vec4<f32>, };\n@group(0) @binding(0) var<uniform> u: U;",
            "vs_main",
            "fs_main",
        );
        assert!(matches!(
            check_source(&source),
            Err(InterfaceError::UniformTooLarge { span: 32, available: 24 })
        ));
    }

    #[test]
    fn bundled_shader_matches_the_layout() {
        let interface = check_source(include_str!("../../../shader/shader.wgsl")).unwrap();
        assert_eq!(interface.uniform_size, 24);
        assert!(!interface.reads_padding());
        assert!(interface.unused.is_empty());
    }

    #[test]
    fn vertex_stage_without_position_fails_validation() {
        let source = r#"
struct Uniforms {
    resolution: vec2<f32>,
    time: f32,
};

@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @location(0) vec4<f32> {
    return vec4<f32>(f32(index), u.time, 0.0, 1.0);
}

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return vec4<f32>(u.resolution, 0.0, 1.0);
}
"#;
        let err = check_source(source).unwrap_err();
        assert!(matches!(err, InterfaceError::Invalid(_)), "{err:?}");
    }

    #[test]
    fn syntax_errors_surface_as_parse_errors() {
        let err = check_source("fn broken( {").unwrap_err();
        assert!(matches!(err, InterfaceError::Parse(_)));
    }
}
