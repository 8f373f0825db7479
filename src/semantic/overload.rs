//! Overload resolution, per `spec.md` §4.6: "rank candidates by an
//! implicit-conversion cost vector (exact, promotion, standard, user) and
//! pick minimum; ties → ambiguity error" (testable property 5, scenario S3).

use std::rc::Rc;

use crate::ast::{DeclId, Program, TypeDenoter};

/// One argument's conversion tier, ordered cheapest first so `Ord`
/// comparison is "lower is better" the way the spec's cost vector is meant
/// to be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionCost {
    Exact,
    Promotion,
    Standard,
}

/// Cost of converting a value of type `from` to a parameter of type `to`, or
/// `None` if no implicit conversion exists.
pub fn conversion_cost(from: &TypeDenoter, to: &TypeDenoter) -> Option<ConversionCost> {
    let from = from.get_aliased();
    let to = to.get_aliased();
    if from == to {
        return Some(ConversionCost::Exact);
    }
    match (from, to) {
        (TypeDenoter::Base(fb), TypeDenoter::Base(tb)) => {
            Some(if tb >= fb { ConversionCost::Promotion } else { ConversionCost::Standard })
        }
        (TypeDenoter::Vector(fb, fn_), TypeDenoter::Vector(tb, tn)) if fn_ == tn => {
            Some(if tb >= fb { ConversionCost::Promotion } else { ConversionCost::Standard })
        }
        (TypeDenoter::Matrix(fb, fr, fc), TypeDenoter::Matrix(tb, tr, tc)) if fr == tr && fc == tc => {
            Some(if tb >= fb { ConversionCost::Promotion } else { ConversionCost::Standard })
        }
        // Scalar-to-vector broadcast ("splat") is a standard conversion: it
        // is implicit in this dialect but never the cheapest candidate.
        (TypeDenoter::Base(_), TypeDenoter::Vector(..)) => Some(ConversionCost::Standard),
        _ => None,
    }
}

/// A candidate's total cost across all arguments; candidates are compared by
/// summed ordinal rank (0=Exact, 1=Promotion, 2=Standard) as a simple total
/// order. Two candidates with equal totals are ambiguous.
fn total_cost(costs: &[ConversionCost]) -> u32 {
    costs
        .iter()
        .map(|c| match c {
            ConversionCost::Exact => 0,
            ConversionCost::Promotion => 1,
            ConversionCost::Standard => 2,
        })
        .sum()
}

#[derive(Debug, Clone)]
pub enum OverloadError {
    /// No candidate with the right arity has a convertible argument list.
    NoMatch,
    /// Two or more candidates tied for the minimum cost.
    Ambiguous(Vec<DeclId>),
}

/// Picks the best-matching overload among `candidates` for a call with
/// `arg_types`, per `spec.md` §4.6/testable-property 5. `candidates` should
/// be the full overload set for the callee name, as returned by
/// `SymbolTable::find_all`.
pub fn resolve_overload(
    program: &Program,
    candidates: &[DeclId],
    arg_types: &[Rc<TypeDenoter>],
) -> Result<DeclId, OverloadError> {
    let mut ranked: Vec<(DeclId, u32)> = Vec::new();

    for &candidate in candidates {
        let Some(func) = program.decl(candidate).as_function() else { continue };
        if func.params.len() != arg_types.len() {
            continue;
        }
        let mut costs = Vec::with_capacity(arg_types.len());
        let mut ok = true;
        for (param, arg_ty) in func.params.iter().zip(arg_types) {
            match conversion_cost(arg_ty, &param.type_denoter) {
                Some(cost) => costs.push(cost),
                None => {
                    ok = false;
                    break;
                }
            }
        }
        if ok {
            ranked.push((candidate, total_cost(&costs)));
        }
    }

    if ranked.is_empty() {
        return Err(OverloadError::NoMatch);
    }

    let best_cost = ranked.iter().map(|(_, c)| *c).min().unwrap();
    let best: Vec<DeclId> = ranked.iter().filter(|(_, c)| *c == best_cost).map(|(id, _)| *id).collect();

    if best.len() == 1 {
        Ok(best[0])
    } else {
        Err(OverloadError::Ambiguous(best))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BaseType, DeclKind, FunctionDecl, Param, ParamDir, Interpolation, Decorators};
    use crate::source::{FileId, SourcePosition, SourceRange};

    fn dummy_range() -> SourceRange {
        SourceRange::point(SourcePosition::new(FileId(0), 1, 1))
    }

    fn make_fn(program: &mut Program, name: &str, param_ty: TypeDenoter) -> DeclId {
        program.alloc_decl(
            dummy_range(),
            DeclKind::Function(FunctionDecl {
                name: Rc::from(name),
                mangled_name: None,
                return_type: Rc::new(TypeDenoter::Base(BaseType::Float)),
                return_semantic: None,
                params: vec![Param {
                    name: Rc::from("x"),
                    dir: ParamDir::In,
                    interpolation: Interpolation::Default,
                    type_denoter: Rc::new(param_ty),
                    array_dims: Vec::new(),
                    decorators: Decorators::default(),
                    default_value: None,
                    range: dummy_range(),
                    resolved_field_of: None,
                    shadow_decl: None,
                }],
                body: None,
                annotations: Vec::new(),
                is_entry_point_candidate: false,
            }),
        )
    }

    #[test]
    fn picks_exact_match_over_promotion() {
        let mut program = Program::new();
        let f_float = make_fn(&mut program, "f", TypeDenoter::Base(BaseType::Float));
        let f_int = make_fn(&mut program, "f", TypeDenoter::Base(BaseType::Int));
        let candidates = vec![f_float, f_int];
        let arg_types = vec![Rc::new(TypeDenoter::Base(BaseType::Int))];
        let picked = resolve_overload(&program, &candidates, &arg_types).unwrap();
        assert_eq!(picked, f_int);
    }

    #[test]
    fn equal_cost_candidates_are_ambiguous() {
        let mut program = Program::new();
        let f_a = make_fn(&mut program, "f", TypeDenoter::Base(BaseType::Float));
        let f_b = make_fn(&mut program, "f", TypeDenoter::Base(BaseType::Uint));
        let candidates = vec![f_a, f_b];
        let arg_types = vec![Rc::new(TypeDenoter::Base(BaseType::Int))];
        let err = resolve_overload(&program, &candidates, &arg_types).unwrap_err();
        assert!(matches!(err, OverloadError::Ambiguous(_)));
    }
}
