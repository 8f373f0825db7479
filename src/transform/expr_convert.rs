//! `ExprConverter`, per `spec.md` §4.7: rewrites dialect-specific expression
//! idioms that have no literal equivalent in the output dialect. The only
//! rewrite this dialect needs is `mul(a, b)`: HLSL's row-major intrinsic
//! taking its vector argument on the left has no GLSL counterpart, since
//! GLSL's `*` operator already does the right matrix/vector product under
//! its column-major convention with the arguments swapped.

use crate::ast::{BinaryOp, ExprKind, Program};

/// Rewrites every `mul(a, b)` call (unresolved — it is never a user-defined
/// overload, since `mul` is reserved as a dialect intrinsic by the binder)
/// into `b * a`, matching GLSL's column-major product order. Three-or-more
/// argument calls named `mul` do not occur in this dialect and are left
/// alone (the binder would already have reported an arity error for them).
pub fn convert_mul_calls(program: &mut Program) {
    for id in program.expr_ids() {
        let rewritten = match &program.expr(id).kind {
            ExprKind::Call { callee, args, resolved: None } if callee.as_ref() == "mul" && args.len() == 2 => {
                Some((args[0], args[1]))
            }
            _ => None,
        };
        if let Some((a, b)) = rewritten {
            program.expr_mut(id).kind = ExprKind::Binary(BinaryOp::Mul, b, a);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BaseType, Program, TypeDenoter};
    use crate::lexer::{Literal, NumericSuffix};
    use crate::source::{FileId, SourcePosition, SourceRange};

    fn range() -> SourceRange {
        SourceRange::point(SourcePosition::new(FileId(0), 1, 1))
    }

    #[test]
    fn mul_call_becomes_reversed_binary_multiply() {
        let mut program = Program::new();
        let a = program.alloc_expr(range(), ExprKind::Literal(Literal::Float(1.0, NumericSuffix::None)));
        let b = program.alloc_expr(range(), ExprKind::Literal(Literal::Float(2.0, NumericSuffix::None)));
        let call = program.alloc_expr(
            range(),
            ExprKind::Call { callee: std::rc::Rc::from("mul"), args: vec![a, b], resolved: None },
        );

        convert_mul_calls(&mut program);

        match &program.expr(call).kind {
            ExprKind::Binary(BinaryOp::Mul, lhs, rhs) => {
                assert_eq!(*lhs, b);
                assert_eq!(*rhs, a);
            }
            other => panic!("expected rewritten Binary(Mul), got {other:?}"),
        }
    }

    #[test]
    fn resolved_user_function_named_mul_is_left_alone() {
        let mut program = Program::new();
        let dummy_fn = program.alloc_decl(
            range(),
            crate::ast::DeclKind::Function(crate::ast::FunctionDecl {
                name: std::rc::Rc::from("mul"),
                mangled_name: None,
                return_type: std::rc::Rc::new(TypeDenoter::Base(BaseType::Float)),
                return_semantic: None,
                params: Vec::new(),
                body: None,
                annotations: Vec::new(),
                is_entry_point_candidate: false,
            }),
        );
        let a = program.alloc_expr(range(), ExprKind::Literal(Literal::Float(1.0, NumericSuffix::None)));
        let b = program.alloc_expr(range(), ExprKind::Literal(Literal::Float(2.0, NumericSuffix::None)));
        let call = program.alloc_expr(
            range(),
            ExprKind::Call { callee: std::rc::Rc::from("mul"), args: vec![a, b], resolved: Some(dummy_fn) },
        );

        convert_mul_calls(&mut program);

        assert!(matches!(&program.expr(call).kind, ExprKind::Call { .. }));
    }
}
