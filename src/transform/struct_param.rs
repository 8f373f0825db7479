//! `StructParameterAnalyzer`, per `spec.md` §4.6/§4.7: once entry-point IO
//! flattening has replaced a struct-typed parameter or return value with
//! synthesized globals, the struct type itself may no longer need to exist
//! as a nominal type in the emitted source. It is suppressed only if nothing
//! else in the program still references it.

use std::collections::HashSet;

use crate::ast::{DeclId, DeclKind, NodeFlags, Program, TypeDenoter};

/// Marks [`NodeFlags::IO_ONLY_STRUCT`] on every struct declaration that
/// appeared only in the original entry point's parameter/return types and is
/// not referenced from anywhere else reachable in the program. A no-op when
/// no flattening occurred (`program.entry_point_io.wrapper` is `None`):
/// HLSL re-emission keeps struct parameters as-is.
pub fn mark_io_only_structs(program: &mut Program) {
    if program.entry_point_io.wrapper.is_none() {
        return;
    }
    let Some(original_entry) = program.entry_point else {
        return;
    };

    let candidates = entry_signature_structs(program, original_entry);
    if candidates.is_empty() {
        return;
    }

    let still_used = structs_used_elsewhere(program, original_entry, &candidates);

    for id in candidates {
        if !still_used.contains(&id) {
            program.decl_mut(id).flags.insert(NodeFlags::IO_ONLY_STRUCT);
        }
    }
}

fn struct_id_of(ty: &TypeDenoter) -> Option<DeclId> {
    match ty.get_aliased() {
        TypeDenoter::Struct(id, _) => Some(*id),
        TypeDenoter::Array(elem, _) => struct_id_of(elem),
        _ => None,
    }
}

fn entry_signature_structs(program: &Program, entry: DeclId) -> HashSet<DeclId> {
    let mut out = HashSet::new();
    let Some(f) = program.decl(entry).as_function() else {
        return out;
    };
    if let Some(id) = struct_id_of(&f.return_type) {
        out.insert(id);
    }
    for p in &f.params {
        if let Some(id) = struct_id_of(&p.type_denoter) {
            out.insert(id);
        }
    }
    out
}

/// Scans every declaration in the program except `entry` itself for a
/// reference to one of `candidates`, stopping early once all candidates are
/// confirmed still-used.
fn structs_used_elsewhere(
    program: &Program,
    entry: DeclId,
    candidates: &HashSet<DeclId>,
) -> HashSet<DeclId> {
    let mut used = HashSet::new();

    for id in program.decl_ids() {
        if used.len() == candidates.len() {
            break;
        }
        if id == entry {
            continue;
        }
        let decl = program.decl(id);
        match &decl.kind {
            DeclKind::Function(f) => {
                check_type(&f.return_type, candidates, &mut used);
                for p in &f.params {
                    check_type(&p.type_denoter, candidates, &mut used);
                }
            }
            DeclKind::Variable(v) => check_type(&v.type_denoter, candidates, &mut used),
            DeclKind::Buffer(b) => check_type(&b.type_denoter, candidates, &mut used),
            DeclKind::Struct(s) => {
                // A candidate struct nested as a field of another struct
                // still counts as "used elsewhere" only if that other
                // struct is itself not one of the candidates (a struct
                // containing only itself never happens; guards recursion).
                if !candidates.contains(&id) {
                    for field in &s.fields {
                        check_type(&field.type_denoter, candidates, &mut used);
                    }
                }
            }
            DeclKind::UniformBuffer(cb) => {
                for m in &cb.members {
                    check_type(&m.type_denoter, candidates, &mut used);
                }
            }
            DeclKind::Sampler(_) | DeclKind::Alias(_) => {}
        }
    }

    used
}

fn check_type(ty: &TypeDenoter, candidates: &HashSet<DeclId>, used: &mut HashSet<DeclId>) {
    if let Some(id) = struct_id_of(ty) {
        if candidates.contains(&id) {
            used.insert(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BaseType, FunctionDecl, StructDecl, StructField, Interpolation};
    use crate::source::{FileId, SourcePosition, SourceRange};
    use std::rc::Rc;

    fn range() -> SourceRange {
        SourceRange::point(SourcePosition::new(FileId(0), 1, 1))
    }

    #[test]
    fn struct_used_only_in_entry_signature_is_flagged() {
        let mut program = Program::new();
        let vs_output = program.alloc_decl(
            range(),
            DeclKind::Struct(StructDecl {
                name: Rc::from("VsOutput"),
                fields: vec![StructField {
                    name: Rc::from("position"),
                    type_denoter: Rc::new(TypeDenoter::Vector(BaseType::Float, 4)),
                    array_dims: Vec::new(),
                    interpolation: Interpolation::Default,
                    decorators: Default::default(),
                }],
            }),
        );
        let entry = program.alloc_decl(
            range(),
            DeclKind::Function(FunctionDecl {
                name: Rc::from("main"),
                mangled_name: None,
                return_type: Rc::new(TypeDenoter::Struct(vs_output, Rc::from("VsOutput"))),
                return_semantic: None,
                params: Vec::new(),
                body: None,
                annotations: Vec::new(),
                is_entry_point_candidate: true,
            }),
        );
        program.globals = vec![vs_output, entry];
        program.entry_point = Some(entry);
        program.entry_point_io.wrapper = Some(entry); // stand-in: flattening ran

        mark_io_only_structs(&mut program);

        assert!(program.decl(vs_output).flags.contains(NodeFlags::IO_ONLY_STRUCT));
    }

    #[test]
    fn struct_also_used_as_cbuffer_member_is_not_flagged() {
        let mut program = Program::new();
        let shared = program.alloc_decl(
            range(),
            DeclKind::Struct(StructDecl {
                name: Rc::from("Shared"),
                fields: vec![StructField {
                    name: Rc::from("value"),
                    type_denoter: Rc::new(TypeDenoter::Base(BaseType::Float)),
                    array_dims: Vec::new(),
                    interpolation: Interpolation::Default,
                    decorators: Default::default(),
                }],
            }),
        );
        let other_var = program.alloc_decl(
            range(),
            DeclKind::Variable(crate::ast::VariableDecl {
                name: Rc::from("g_shared"),
                storage: Default::default(),
                interpolation: Interpolation::Default,
                type_denoter: Rc::new(TypeDenoter::Struct(shared, Rc::from("Shared"))),
                array_dims: Vec::new(),
                decorators: Default::default(),
                initializer: None,
                owner_cbuffer: None,
            }),
        );
        let entry = program.alloc_decl(
            range(),
            DeclKind::Function(FunctionDecl {
                name: Rc::from("main"),
                mangled_name: None,
                return_type: Rc::new(TypeDenoter::Struct(shared, Rc::from("Shared"))),
                return_semantic: None,
                params: Vec::new(),
                body: None,
                annotations: Vec::new(),
                is_entry_point_candidate: true,
            }),
        );
        program.globals = vec![shared, other_var, entry];
        program.entry_point = Some(entry);
        program.entry_point_io.wrapper = Some(entry);

        mark_io_only_structs(&mut program);

        assert!(!program.decl(shared).flags.contains(NodeFlags::IO_ONLY_STRUCT));
    }
}
