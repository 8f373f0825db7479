//! Reflection extraction, per `spec.md` §4.9: walks reachable declarations
//! of an analyzed [`Program`] and summarizes the bindings a host application
//! needs to wire up a compiled shader — textures, constant buffers,
//! samplers, fragment targets, the macros that were ever defined, and the
//! entry point's stage layout.
//!
//! Runs whenever semantic analysis succeeded, per the Open Question
//! resolution recorded in `DESIGN.md`: never on a failed analysis (there is
//! no reachability-marked, bound AST to walk), but regardless of whether
//! code generation itself produced output.

use std::rc::Rc;

use crate::api::ShaderTarget;
use crate::ast::{DeclKind, NodeFlags, ParamDir, Program, StageLayouts, TypeDenoter};
use crate::preprocessor::MacroSnapshot;

/// A bound texture/buffer object (`Texture2D`, `RWStructuredBuffer<T>`, ...).
#[derive(Debug, Clone)]
pub struct TextureBinding {
    pub name: Rc<str>,
    pub location: Option<u32>,
}

/// A `cbuffer`/`tbuffer` block and the member names it carries.
#[derive(Debug, Clone)]
pub struct ConstantBufferBinding {
    pub name: Rc<str>,
    pub location: Option<u32>,
    pub members: Vec<Rc<str>>,
}

/// A standalone `SamplerState`/`SamplerComparisonState` object.
#[derive(Debug, Clone)]
pub struct SamplerBinding {
    pub name: Rc<str>,
    pub location: Option<u32>,
}

/// One `SV_TargetN`-bound fragment output, meaningful only when compiling
/// for `ShaderTarget::Fragment`.
#[derive(Debug, Clone)]
pub struct FragmentTargetBinding {
    pub name: Rc<str>,
    pub location: Option<u32>,
}

/// The full reflection summary produced by [`extract`].
#[derive(Debug, Clone, Default)]
pub struct ReflectionData {
    pub macros: Vec<MacroSnapshot>,
    pub textures: Vec<TextureBinding>,
    pub constant_buffers: Vec<ConstantBufferBinding>,
    pub samplers: Vec<SamplerBinding>,
    pub fragment_targets: Vec<FragmentTargetBinding>,
    pub stages: StageLayouts,
}

impl ReflectionData {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Reads a `register(...)` decorator's slot, if present.
fn register_slot(decorators: &crate::ast::Decorators) -> Option<u32> {
    decorators.register.as_ref().map(|r| r.slot)
}

/// Walks `program`'s reachable declarations and builds a [`ReflectionData`].
/// `macros` is the preprocessor's ever-defined snapshot list (`spec.md`
/// §4.3/§4.9); `auto_binding` sequentially assigns a location to any
/// reachable binding that lacks an explicit `register()`, per `spec.md`
/// §6's `autoBinding` option.
pub fn extract(program: &Program, macros: &[MacroSnapshot], target: ShaderTarget, auto_binding: bool) -> ReflectionData {
    let mut data = ReflectionData {
        macros: macros.to_vec(),
        stages: program.stages.clone(),
        ..ReflectionData::default()
    };

    let mut next_texture_slot = 0u32;
    let mut next_sampler_slot = 0u32;
    let mut next_cbuffer_slot = 0u32;

    for id in program.globals.iter().copied() {
        let decl = program.decl(id);
        if !decl.flags.contains(NodeFlags::REACHABLE) {
            continue;
        }
        match &decl.kind {
            DeclKind::Buffer(b) => {
                let location = register_slot(&b.decorators).or_else(|| {
                    if auto_binding {
                        let slot = next_texture_slot;
                        next_texture_slot += 1;
                        Some(slot)
                    } else {
                        None
                    }
                });
                data.textures.push(TextureBinding { name: b.name.clone(), location });
            }
            DeclKind::Sampler(s) => {
                let location = register_slot(&s.decorators).or_else(|| {
                    if auto_binding {
                        let slot = next_sampler_slot;
                        next_sampler_slot += 1;
                        Some(slot)
                    } else {
                        None
                    }
                });
                data.samplers.push(SamplerBinding { name: s.name.clone(), location });
            }
            DeclKind::UniformBuffer(cb) => {
                let location = register_slot(&cb.decorators).or_else(|| {
                    if auto_binding {
                        let slot = next_cbuffer_slot;
                        next_cbuffer_slot += 1;
                        Some(slot)
                    } else {
                        None
                    }
                });
                data.constant_buffers.push(ConstantBufferBinding {
                    name: cb.name.clone(),
                    location,
                    members: cb.members.iter().map(|m| m.name.clone()).collect(),
                });
            }
            _ => {}
        }
    }

    if matches!(target, ShaderTarget::Fragment) {
        data.fragment_targets = fragment_targets(program);
    }

    data
}

/// Fragment-output bindings named by an `SV_TargetN` semantic, read either
/// from the flattened IO globals (GLSL-family outputs) or directly off the
/// un-flattened entry point's return semantic/struct fields (HLSL
/// re-emission, where `semantic::entry_point::flatten_io` never ran).
fn fragment_targets(program: &Program) -> Vec<FragmentTargetBinding> {
    if program.entry_point_io.wrapper.is_some() {
        return program
            .entry_point_io
            .vars
            .iter()
            .filter(|v| matches!(v.dir, ParamDir::Out | ParamDir::InOut))
            .filter(|v| v.semantic.name.to_ascii_lowercase().starts_with("sv_target"))
            .map(|v| FragmentTargetBinding {
                name: program.decl(v.global).name().into(),
                location: v.semantic.index,
            })
            .collect();
    }

    let Some(entry_id) = program.entry_point else { return Vec::new() };
    let Some(f) = program.decl(entry_id).as_function() else { return Vec::new() };

    match f.return_type.get_aliased() {
        TypeDenoter::Struct(struct_id, _) => program
            .decl(*struct_id)
            .as_struct()
            .into_iter()
            .flat_map(|s| s.fields.iter())
            .filter_map(|field| {
                let sem = field.decorators.semantic.as_ref()?;
                if !sem.name.to_ascii_lowercase().starts_with("sv_target") {
                    return None;
                }
                Some(FragmentTargetBinding { name: field.name.clone(), location: sem.index })
            })
            .collect(),
        _ => f
            .return_semantic
            .as_ref()
            .filter(|sem| sem.name.to_ascii_lowercase().starts_with("sv_target"))
            .map(|sem| FragmentTargetBinding { name: f.name.clone(), location: sem.index })
            .into_iter()
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BaseType, Decorators, RegisterDecorator, VariableDecl, Semantic, StorageClass, Interpolation};
    use crate::source::SourceRange;

    fn dummy_range() -> SourceRange {
        let pos = crate::source::SourcePosition::new(crate::source::FileId(0), 1, 1);
        SourceRange::new(pos, pos)
    }

    #[test]
    fn extracts_texture_binding_with_explicit_register() {
        let mut program = Program::new();
        let decl_id = program.alloc_decl(
            dummy_range(),
            DeclKind::Buffer(crate::ast::BufferDecl {
                name: Rc::from("tex"),
                type_denoter: Rc::new(TypeDenoter::Buffer(crate::ast::BufferKind::Texture2D, None)),
                decorators: Decorators {
                    register: Some(RegisterDecorator { register_class: 't', slot: 3, space: None }),
                    ..Decorators::default()
                },
            }),
        );
        program.decl_mut(decl_id).flags.insert(NodeFlags::REACHABLE);
        program.globals.push(decl_id);

        let data = extract(&program, &[], ShaderTarget::Fragment, false);
        assert_eq!(data.textures.len(), 1);
        assert_eq!(data.textures[0].name.as_ref(), "tex");
        assert_eq!(data.textures[0].location, Some(3));
    }

    #[test]
    fn auto_binding_assigns_sequential_slots_when_register_absent() {
        let mut program = Program::new();
        for name in ["a", "b"] {
            let decl_id = program.alloc_decl(
                dummy_range(),
                DeclKind::Sampler(crate::ast::SamplerDecl {
                    name: Rc::from(name),
                    type_denoter: Rc::new(TypeDenoter::Sampler(crate::ast::SamplerKind::SamplerState)),
                    decorators: Decorators::default(),
                }),
            );
            program.decl_mut(decl_id).flags.insert(NodeFlags::REACHABLE);
            program.globals.push(decl_id);
        }

        let data = extract(&program, &[], ShaderTarget::Vertex, true);
        assert_eq!(data.samplers[0].location, Some(0));
        assert_eq!(data.samplers[1].location, Some(1));
    }

    #[test]
    fn unreachable_declarations_are_excluded() {
        let mut program = Program::new();
        let decl_id = program.alloc_decl(
            dummy_range(),
            DeclKind::Variable(VariableDecl {
                name: Rc::from("dead"),
                storage: StorageClass::default(),
                interpolation: Interpolation::Default,
                type_denoter: Rc::new(TypeDenoter::Base(BaseType::Float)),
                array_dims: Vec::new(),
                decorators: Decorators::default(),
                initializer: None,
                owner_cbuffer: None,
            }),
        );
        program.globals.push(decl_id);

        let data = extract(&program, &[], ShaderTarget::Vertex, false);
        assert!(data.textures.is_empty());
        assert!(data.constant_buffers.is_empty());
        let _ = Semantic { name: Rc::from(""), index: None };
    }
}
