//! Target-version legality checks, per `spec.md` §4.6: "reject constructs
//! unsupported by the chosen output shader version (e.g., double-precision
//! on ESSL < 3.2)" and "reject invalid combinations [of storage class and
//! interpolation]  (e.g., `static` on parameters; `centroid` on
//! non-varying)".

use crate::api::ShaderVersion;
use crate::ast::{DeclKind, Interpolation, Program, TypeDenoter};
use crate::diagnostics::{Log, Report};

/// Runs every legality check over `program`'s global declarations. Does not
/// stop at the first failure — per `spec.md` §4.6, "the analyzer still
/// attempts to continue so that multiple errors are reported per run".
pub fn check(program: &Program, version: ShaderVersion, log: &mut dyn Log) {
    check_double_precision(program, version, log);
    check_interpolation_on_non_entry(program, log);
}

fn uses_double(ty: &TypeDenoter) -> bool {
    matches!(ty.base_type(), Some(crate::ast::BaseType::Double))
}

/// `spec.md` §4.6's example construct: double precision is unsupported on
/// ESSL.
fn check_double_precision(program: &Program, version: ShaderVersion, log: &mut dyn Log) {
    if version.supports_double_precision() {
        return;
    }
    for id in program.globals.iter().copied() {
        let decl = program.decl(id);
        let range = decl.range;
        match &decl.kind {
            DeclKind::Variable(v) if uses_double(&v.type_denoter) => {
                log.report(
                    Report::error(format!(
                        "'{}' uses double precision, unsupported by {version:?}",
                        v.name
                    ))
                    .at(range),
                );
            }
            DeclKind::Function(f) => {
                if uses_double(&f.return_type) {
                    log.report(
                        Report::error(format!(
                            "function '{}' returns double precision, unsupported by {version:?}",
                            f.name
                        ))
                        .at(range),
                    );
                }
                for p in &f.params {
                    if uses_double(&p.type_denoter) {
                        log.report(
                            Report::error(format!(
                                "parameter '{}' of '{}' uses double precision, unsupported by {version:?}",
                                p.name, f.name
                            ))
                            .at(p.range),
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

/// Interpolation modifiers (`centroid`, `linear`, `nointerpolation`,
/// `noperspective`, `sample`) only make sense on entry-point IO — a varying
/// crossing a pipeline stage boundary. Anywhere else (an ordinary function's
/// parameter, a local variable) they are a legality error.
fn check_interpolation_on_non_entry(program: &Program, log: &mut dyn Log) {
    for id in program.globals.iter().copied() {
        let decl = program.decl(id);
        let is_entry = Some(id) == program.entry_point;
        if let DeclKind::Function(f) = &decl.kind {
            if !is_entry {
                for p in &f.params {
                    if p.interpolation != Interpolation::Default {
                        log.report(
                            Report::error(format!(
                                "interpolation modifier on parameter '{}' of non-entry-point function '{}'",
                                p.name, f.name
                            ))
                            .at(p.range),
                        );
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BaseType, Decorators, FunctionDecl, VariableDecl, StorageClass};
    use crate::diagnostics::CollectingLog;
    use crate::source::{FileId, SourcePosition, SourceRange};
    use std::rc::Rc;

    fn range() -> SourceRange {
        SourceRange::point(SourcePosition::new(FileId(0), 1, 1))
    }

    #[test]
    fn double_precision_rejected_on_essl() {
        let mut program = Program::new();
        let id = program.alloc_decl(
            range(),
            DeclKind::Variable(VariableDecl {
                name: Rc::from("d"),
                storage: StorageClass::default(),
                interpolation: Interpolation::Default,
                type_denoter: Rc::new(TypeDenoter::Base(BaseType::Double)),
                array_dims: Vec::new(),
                decorators: Decorators::default(),
                initializer: None,
                owner_cbuffer: None,
            }),
        );
        program.globals.push(id);
        let mut log = CollectingLog::new();
        check(&program, ShaderVersion::Essl310, &mut log);
        assert!(log.has_errors());
    }

    #[test]
    fn double_precision_allowed_on_glsl450() {
        let mut program = Program::new();
        let id = program.alloc_decl(
            range(),
            DeclKind::Variable(VariableDecl {
                name: Rc::from("d"),
                storage: StorageClass::default(),
                interpolation: Interpolation::Default,
                type_denoter: Rc::new(TypeDenoter::Base(BaseType::Double)),
                array_dims: Vec::new(),
                decorators: Decorators::default(),
                initializer: None,
                owner_cbuffer: None,
            }),
        );
        program.globals.push(id);
        let mut log = CollectingLog::new();
        check(&program, ShaderVersion::Glsl450, &mut log);
        assert!(!log.has_errors());
    }

    #[test]
    fn centroid_on_plain_function_parameter_is_rejected() {
        let mut program = Program::new();
        let id = program.alloc_decl(
            range(),
            DeclKind::Function(FunctionDecl {
                name: Rc::from("helper"),
                mangled_name: None,
                return_type: Rc::new(TypeDenoter::Void),
                return_semantic: None,
                params: vec![crate::ast::Param {
                    name: Rc::from("x"),
                    dir: crate::ast::ParamDir::In,
                    interpolation: Interpolation::Centroid,
                    type_denoter: Rc::new(TypeDenoter::Base(BaseType::Float)),
                    array_dims: Vec::new(),
                    decorators: Decorators::default(),
                    default_value: None,
                    range: range(),
                    resolved_field_of: None,
                    shadow_decl: None,
                }],
                body: None,
                annotations: Vec::new(),
                is_entry_point_candidate: false,
            }),
        );
        program.globals.push(id);
        let mut log = CollectingLog::new();
        check(&program, ShaderVersion::Glsl450, &mut log);
        assert!(log.has_errors());
    }
}
