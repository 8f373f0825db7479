//! Type denoter computation, per `spec.md` §4.6: "bottom-up over
//! expressions. Literals produce base types; operators propagate per a
//! dialect-specific promotion table ... calls take the return type of the
//! resolved overload."

use std::rc::Rc;

use crate::ast::{BaseType, BinaryOp, ExprId, ExprKind, Program, TypeDenoter};
use crate::diagnostics::{Log, Report};
use crate::lexer::{Literal, NumericSuffix};
use crate::symbol_table::SymbolTable;

/// The type a literal token denotes on its own, before any binary promotion.
pub fn literal_type(lit: &Literal) -> TypeDenoter {
    match lit {
        Literal::Bool(_) => TypeDenoter::Base(BaseType::Bool),
        Literal::Char(_) => TypeDenoter::Base(BaseType::Int),
        Literal::String(_) => TypeDenoter::Base(BaseType::Int), // strings have no runtime type in HLSL expr position
        Literal::Int(_, NumericSuffix::Unsigned) => TypeDenoter::Base(BaseType::Uint),
        Literal::Int(..) => TypeDenoter::Base(BaseType::Int),
        Literal::Float(_, NumericSuffix::Half) => TypeDenoter::Base(BaseType::Half),
        Literal::Float(..) => TypeDenoter::Base(BaseType::Float),
    }
}

/// The wider of two base types under the dialect's implicit-promotion
/// ordering (`BaseType`'s declaration order *is* the promotion rank, per its
/// doc comment).
pub fn promote_base(a: BaseType, b: BaseType) -> BaseType {
    a.max(b)
}

/// Computes the result type of a binary operator over two already-computed
/// operand types, applying scalar/vector/matrix promotion. Returns `None` if
/// the combination has no defined result (an analyzer-reported type error).
pub fn compute_binary_type(op: BinaryOp, lhs: &TypeDenoter, rhs: &TypeDenoter) -> Option<TypeDenoter> {
    use BinaryOp::*;
    let lhs = lhs.get_aliased();
    let rhs = rhs.get_aliased();

    match op {
        Eq | Ne | Lt | Gt | Le | Ge => {
            // Relational/equality operators apply to scalars only; vector
            // comparison is an intrinsic call (`all`/`any`) in this dialect,
            // not an operator overload.
            if lhs.is_numeric() && rhs.is_numeric() {
                Some(TypeDenoter::Base(BaseType::Bool))
            } else {
                None
            }
        }
        And | Or => {
            if lhs.is_numeric() && rhs.is_numeric() {
                Some(TypeDenoter::Base(BaseType::Bool))
            } else {
                None
            }
        }
        Mul => compute_mul_type(lhs, rhs),
        Add | Sub | Div | Mod | BitAnd | BitOr | BitXor | Shl | Shr => {
            compute_elementwise_type(lhs, rhs)
        }
    }
}

/// `*` has its own rule distinct from the other arithmetic operators:
/// matrix-by-matrix and matrix-by-vector multiplication are linear-algebra
/// products (dimension-checked), while everything else is componentwise,
/// same as `+`.
fn compute_mul_type(lhs: &TypeDenoter, rhs: &TypeDenoter) -> Option<TypeDenoter> {
    match (lhs, rhs) {
        (TypeDenoter::Matrix(b1, r1, c1), TypeDenoter::Matrix(b2, r2, c2)) if c1 == r2 => {
            Some(TypeDenoter::Matrix(promote_base(*b1, *b2), *r1, *c2))
        }
        (TypeDenoter::Matrix(b1, rows, cols), TypeDenoter::Vector(b2, n)) if cols == n => {
            Some(TypeDenoter::Vector(promote_base(*b1, *b2), *rows))
        }
        (TypeDenoter::Vector(b1, n), TypeDenoter::Matrix(b2, rows, cols)) if n == rows => {
            Some(TypeDenoter::Vector(promote_base(*b1, *b2), *cols))
        }
        _ => compute_elementwise_type(lhs, rhs),
    }
}

/// Componentwise arithmetic: scalar-with-scalar, scalar-broadcast-to-vector,
/// vector-with-same-size-vector, and the matrix analogues.
fn compute_elementwise_type(lhs: &TypeDenoter, rhs: &TypeDenoter) -> Option<TypeDenoter> {
    match (lhs, rhs) {
        (TypeDenoter::Base(b1), TypeDenoter::Base(b2)) => Some(TypeDenoter::Base(promote_base(*b1, *b2))),
        (TypeDenoter::Base(b1), TypeDenoter::Vector(b2, n)) | (TypeDenoter::Vector(b2, n), TypeDenoter::Base(b1)) => {
            Some(TypeDenoter::Vector(promote_base(*b1, *b2), *n))
        }
        (TypeDenoter::Base(b1), TypeDenoter::Matrix(b2, r, c)) | (TypeDenoter::Matrix(b2, r, c), TypeDenoter::Base(b1)) => {
            Some(TypeDenoter::Matrix(promote_base(*b1, *b2), *r, *c))
        }
        (TypeDenoter::Vector(b1, n1), TypeDenoter::Vector(b2, n2)) if n1 == n2 => {
            Some(TypeDenoter::Vector(promote_base(*b1, *b2), *n1))
        }
        (TypeDenoter::Matrix(b1, r1, c1), TypeDenoter::Matrix(b2, r2, c2)) if r1 == r2 && c1 == c2 => {
            Some(TypeDenoter::Matrix(promote_base(*b1, *b2), *r1, *c1))
        }
        _ => None,
    }
}

/// Indexes a vector/matrix/array denoter, returning the element type
/// `base[index]` yields.
pub fn index_result_type(base: &TypeDenoter) -> Option<TypeDenoter> {
    match base.get_aliased() {
        TypeDenoter::Vector(b, _) => Some(TypeDenoter::Base(*b)),
        TypeDenoter::Matrix(b, _, cols) => Some(TypeDenoter::Vector(*b, *cols)),
        TypeDenoter::Array(elem, _) => Some((**elem).clone()),
        _ => None,
    }
}

/// Computes (and caches on the node) the type of `id`, recursing into
/// subexpressions as needed. Binds `Object`/`Call` resolution is the job of
/// `semantic::binding`/`semantic::overload`; this function assumes resolution
/// already ran for the node's children and trusts their cached types.
pub fn compute_expr_type(
    program: &mut Program,
    symbols: &SymbolTable,
    id: ExprId,
    log: &mut dyn Log,
) -> Rc<TypeDenoter> {
    if let Some(ty) = &program.expr(id).type_denoter {
        return ty.clone();
    }
    let range = program.expr(id).range;
    let kind = program.expr(id).kind.clone();
    let ty: Rc<TypeDenoter> = match kind {
        ExprKind::Literal(lit) => Rc::new(literal_type(&lit)),
        ExprKind::Sequence(items) => {
            let mut last = Rc::new(TypeDenoter::Void);
            for item in items {
                last = compute_expr_type(program, symbols, item, log);
            }
            last
        }
        ExprKind::Binary(op, lhs, rhs) => {
            let lt = compute_expr_type(program, symbols, lhs, log);
            let rt = compute_expr_type(program, symbols, rhs, log);
            match compute_binary_type(op, &lt, &rt) {
                Some(t) => Rc::new(t),
                None => {
                    log.report(
                        Report::error(format!(
                            "no binary operator for '{}' and '{}'",
                            lt.display_name(),
                            rt.display_name()
                        ))
                        .at(range),
                    );
                    Rc::new(TypeDenoter::Void)
                }
            }
        }
        ExprKind::Unary(_, operand) | ExprKind::PostUnary(_, operand) => {
            compute_expr_type(program, symbols, operand, log)
        }
        ExprKind::Ternary(cond, then_b, else_b) => {
            compute_expr_type(program, symbols, cond, log);
            let then_ty = compute_expr_type(program, symbols, then_b, log);
            let else_ty = compute_expr_type(program, symbols, else_b, log);
            if *then_ty == *else_ty {
                then_ty
            } else if let Some(t) = compute_elementwise_type(&then_ty, &else_ty) {
                Rc::new(t)
            } else {
                then_ty
            }
        }
        ExprKind::Call { resolved, .. } => {
            if let Some(decl_id) = resolved {
                match &program.decl(decl_id).kind {
                    crate::ast::DeclKind::Function(f) => f.return_type.clone(),
                    crate::ast::DeclKind::Struct(_) => {
                        Rc::new(TypeDenoter::Struct(decl_id, Rc::from(program.decl(decl_id).name())))
                    }
                    _ => Rc::new(TypeDenoter::Void),
                }
            } else {
                Rc::new(TypeDenoter::Void)
            }
        }
        ExprKind::Bracket(base, index) => {
            let bt = compute_expr_type(program, symbols, base, log);
            compute_expr_type(program, symbols, index, log);
            match index_result_type(&bt) {
                Some(t) => Rc::new(t),
                None => {
                    log.report(Report::error(format!("'{}' cannot be indexed", bt.display_name())).at(range));
                    Rc::new(TypeDenoter::Void)
                }
            }
        }
        ExprKind::Object { base, resolved, member } => {
            if let Some(base_id) = base {
                // A qualified access's type comes from the field/swizzle it
                // names, not from `resolved` (which, for struct fields,
                // points at the *owning* struct decl for reachability
                // purposes only — see `semantic::binding`).
                let base_ty = compute_expr_type(program, symbols, base_id, log);
                field_or_swizzle_type(program, &base_ty, &member).unwrap_or_else(|| Rc::new(TypeDenoter::Void))
            } else if let Some(decl_id) = resolved {
                decl_type(program, decl_id)
            } else {
                Rc::new(TypeDenoter::Void)
            }
        }
        ExprKind::Initializer(elems) => {
            for e in &elems {
                compute_expr_type(program, symbols, *e, log);
            }
            Rc::new(TypeDenoter::Void)
        }
        ExprKind::Cast(ty, operand) => {
            compute_expr_type(program, symbols, operand, log);
            ty
        }
        ExprKind::TypeSpecifier(ty) => ty,
        ExprKind::Assign(_, target, value) => {
            compute_expr_type(program, symbols, value, log);
            compute_expr_type(program, symbols, target, log)
        }
    };
    program.expr_mut(id).type_denoter = Some(ty.clone());
    ty
}

/// The type of a field/base declaration a bound `Object` node resolved to.
fn decl_type(program: &Program, decl_id: crate::ast::DeclId) -> Rc<TypeDenoter> {
    match &program.decl(decl_id).kind {
        crate::ast::DeclKind::Variable(v) => wrap_array(v.type_denoter.clone(), &v.array_dims),
        crate::ast::DeclKind::Buffer(b) => b.type_denoter.clone(),
        crate::ast::DeclKind::Sampler(s) => s.type_denoter.clone(),
        _ => Rc::new(TypeDenoter::Void),
    }
}

fn wrap_array(base: Rc<TypeDenoter>, dims: &[Option<u32>]) -> Rc<TypeDenoter> {
    let mut ty = base;
    for dim in dims.iter().rev() {
        ty = Rc::new(TypeDenoter::Array(ty, *dim));
    }
    ty
}

/// `base.member`: either a swizzle (`v.xyz`) on a vector, or a struct field
/// looked up by name on a `Struct` denoter.
fn field_or_swizzle_type(program: &Program, base: &TypeDenoter, member: &str) -> Option<Rc<TypeDenoter>> {
    match base.get_aliased() {
        TypeDenoter::Vector(b, _) if is_swizzle(member) => {
            if member.len() == 1 {
                Some(Rc::new(TypeDenoter::Base(*b)))
            } else {
                Some(Rc::new(TypeDenoter::Vector(*b, member.len() as u8)))
            }
        }
        TypeDenoter::Struct(decl_id, _) => {
            let field = program.decl(*decl_id).as_struct()?.fields.iter().find(|f| f.name.as_ref() == member)?;
            Some(wrap_array(field.type_denoter.clone(), &field.array_dims))
        }
        _ => None,
    }
}

fn is_swizzle(member: &str) -> bool {
    !member.is_empty()
        && member.len() <= 4
        && member
            .chars()
            .all(|c| matches!(c, 'x' | 'y' | 'z' | 'w' | 'r' | 'g' | 'b' | 'a'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BaseType;

    #[test]
    fn scalar_broadcasts_to_vector() {
        let scalar = TypeDenoter::Base(BaseType::Float);
        let vector = TypeDenoter::Vector(BaseType::Float, 4);
        let result = compute_binary_type(BinaryOp::Add, &scalar, &vector).unwrap();
        assert_eq!(result, TypeDenoter::Vector(BaseType::Float, 4));
    }

    #[test]
    fn matrix_vector_product_reduces_to_vector() {
        let m = TypeDenoter::Matrix(BaseType::Float, 4, 4);
        let v = TypeDenoter::Vector(BaseType::Float, 4);
        let result = compute_binary_type(BinaryOp::Mul, &m, &v).unwrap();
        assert_eq!(result, TypeDenoter::Vector(BaseType::Float, 4));
    }

    #[test]
    fn mismatched_vector_sizes_have_no_common_type() {
        let a = TypeDenoter::Vector(BaseType::Float, 2);
        let b = TypeDenoter::Vector(BaseType::Float, 3);
        assert!(compute_binary_type(BinaryOp::Add, &a, &b).is_none());
    }

    #[test]
    fn relational_operators_yield_bool() {
        let a = TypeDenoter::Base(BaseType::Int);
        let b = TypeDenoter::Base(BaseType::Float);
        assert_eq!(
            compute_binary_type(BinaryOp::Lt, &a, &b),
            Some(TypeDenoter::Base(BaseType::Bool))
        );
    }
}
