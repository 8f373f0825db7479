//! AST transformers, per `spec.md` §4.7: passes that run after semantic
//! analysis succeeds and before code generation, rewriting the AST in place
//! rather than producing a new tree. Order matters: reachability must be
//! known before struct-parameter suppression or name mangling can decide
//! what's still alive, and the expression/type rewrites assume binding and
//! type computation already ran.

pub mod expr_convert;
pub mod name_mangle;
pub mod reference;
pub mod struct_param;
pub mod type_convert;

use crate::api::NameMangling;
use crate::ast::Program;

/// Runs every transform pass over `program` in the fixed order `spec.md`
/// §4.7 implies by describing them in sequence. Callers run this only after
/// `semantic::analyze` returned `true`.
pub fn run(program: &mut Program, mangling: &NameMangling) {
    reference::mark_reachable(program);
    struct_param::mark_io_only_structs(program);
    name_mangle::mangle_function_names(program, mangling);
    expr_convert::convert_mul_calls(program);
    type_convert::make_broadcasts_explicit(program);
}
