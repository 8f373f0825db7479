//! `TypeConverter`, per `spec.md` §4.7: makes implicit scalar-to-vector/
//! matrix broadcast explicit, since GLSL-family dialects do not implicitly
//! broadcast a scalar initializer across a wider declared type the way this
//! HLSL dialect does.

use crate::ast::{DeclKind, ExprId, ExprKind, Program, TypeDenoter};

/// Wraps every initializer/assignment right-hand side whose computed type is
/// scalar but whose target type is vector or matrix in an explicit
/// constructor call (`float4(1.0)` rather than relying on `1.0` broadcasting
/// on its own). Must run after `semantic::types` has populated
/// `Expr::type_denoter` on every node, and before code generation.
pub fn make_broadcasts_explicit(program: &mut Program) {
    let rewrites = collect_rewrites(program);
    for (id, target_ty) in rewrites {
        wrap_in_constructor(program, id, &target_ty);
    }
}

fn collect_rewrites(program: &Program) -> Vec<(ExprId, TypeDenoter)> {
    let mut out = Vec::new();
    for id in program.expr_ids() {
        if let ExprKind::Assign(_, target, value) = &program.expr(id).kind {
            if let Some(target_ty) = target_expects(program, *target, *value) {
                out.push((*value, target_ty));
            }
        }
    }
    for id in program.decl_ids() {
        if let DeclKind::Variable(v) = &program.decl(id).kind {
            if let Some(init) = v.initializer {
                if let Some(init_ty) = program.expr(init).type_denoter.as_deref() {
                    if init_ty.is_scalar() {
                        if let ty @ (TypeDenoter::Vector(..) | TypeDenoter::Matrix(..)) =
                            v.type_denoter.get_aliased()
                        {
                            out.push((init, ty.clone()));
                        }
                    }
                }
            }
        }
    }
    out
}

/// If `value`'s computed type is scalar and `target`'s is vector/matrix,
/// returns the target type `value` should be broadcast up to.
fn target_expects(program: &Program, target: ExprId, value: ExprId) -> Option<TypeDenoter> {
    let target_ty = program.expr(target).type_denoter.as_deref()?;
    let value_ty = program.expr(value).type_denoter.as_deref()?;
    if !value_ty.is_scalar() {
        return None;
    }
    match target_ty.get_aliased() {
        TypeDenoter::Vector(..) | TypeDenoter::Matrix(..) => Some(target_ty.get_aliased().clone()),
        _ => None,
    }
}

fn wrap_in_constructor(program: &mut Program, id: ExprId, target_ty: &TypeDenoter) {
    let range = program.expr(id).range;
    let original_kind = program.expr(id).kind.clone();
    let inner = program.alloc_expr(range, original_kind);
    program.expr_mut(inner).type_denoter = program.expr(id).type_denoter.clone();

    let callee = match target_ty {
        TypeDenoter::Vector(b, n) => format!("{}{}", b.name(), n),
        TypeDenoter::Matrix(b, r, c) => format!("{}{}x{}", b.name(), r, c),
        _ => unreachable!("wrap_in_constructor only called with vector/matrix targets"),
    };

    program.expr_mut(id).kind = ExprKind::Call {
        callee: std::rc::Rc::from(callee.as_str()),
        args: vec![inner],
        resolved: None,
    };
    program.expr_mut(id).type_denoter = Some(std::rc::Rc::new(target_ty.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BaseType;
    use crate::lexer::{Literal, NumericSuffix};
    use crate::source::{FileId, SourcePosition, SourceRange};
    use std::rc::Rc;

    fn range() -> SourceRange {
        SourceRange::point(SourcePosition::new(FileId(0), 1, 1))
    }

    #[test]
    fn scalar_assigned_to_vector_gets_wrapped() {
        let mut program = Program::new();
        let target = program.alloc_expr(
            range(),
            ExprKind::Object { base: None, member: Rc::from("color"), resolved: None },
        );
        program.expr_mut(target).type_denoter = Some(Rc::new(TypeDenoter::Vector(BaseType::Float, 4)));

        let value = program.alloc_expr(range(), ExprKind::Literal(Literal::Float(1.0, NumericSuffix::None)));
        program.expr_mut(value).type_denoter = Some(Rc::new(TypeDenoter::Base(BaseType::Float)));

        let assign = program.alloc_expr(
            range(),
            ExprKind::Assign(crate::ast::AssignOp::Assign, target, value),
        );
        program.expr_mut(assign).type_denoter = Some(Rc::new(TypeDenoter::Vector(BaseType::Float, 4)));

        make_broadcasts_explicit(&mut program);

        match &program.expr(value).kind {
            ExprKind::Call { callee, args, .. } => {
                assert_eq!(callee.as_ref(), "float4");
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected wrapped constructor call, got {other:?}"),
        }
    }

    #[test]
    fn vector_to_vector_assignment_is_untouched() {
        let mut program = Program::new();
        let target = program.alloc_expr(
            range(),
            ExprKind::Object { base: None, member: Rc::from("color"), resolved: None },
        );
        program.expr_mut(target).type_denoter = Some(Rc::new(TypeDenoter::Vector(BaseType::Float, 4)));

        let value = program.alloc_expr(
            range(),
            ExprKind::Object { base: None, member: Rc::from("other"), resolved: None },
        );
        program.expr_mut(value).type_denoter = Some(Rc::new(TypeDenoter::Vector(BaseType::Float, 4)));

        let assign = program.alloc_expr(
            range(),
            ExprKind::Assign(crate::ast::AssignOp::Assign, target, value),
        );
        program.expr_mut(assign).type_denoter = Some(Rc::new(TypeDenoter::Vector(BaseType::Float, 4)));

        make_broadcasts_explicit(&mut program);

        assert!(matches!(&program.expr(value).kind, ExprKind::Object { .. }));
    }
}
