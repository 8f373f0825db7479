//! Name binding, per `spec.md` §4.6: "for every identifier occurrence,
//! resolve to a declaration reference (or record an unresolved-symbol
//! diagnostic). Qualified names (`a.b.c`) resolve left-to-right using the
//! computed type of the prefix."
//!
//! Interleaves type computation (delegated to [`crate::semantic::types`])
//! bottom-up with resolution, since overload ranking needs argument types
//! that in turn depend on their own children already being bound.

use std::rc::Rc;

use crate::ast::{
    BaseType, BufferKind, DeclId, DeclKind, ExprId, ExprKind, FunctionDecl, Program, SamplerKind,
    StmtId, StmtKind, TypeDenoter, VariableDecl,
};
use crate::diagnostics::{Hint, Log, Report};
use crate::semantic::overload::{resolve_overload, OverloadError};
use crate::semantic::types::compute_expr_type;
use crate::symbol_table::{reject_override, ScopeKind, SymbolTable};

/// Registers every top-level declaration's name into the global scope.
/// Functions share a name across overloads; everything else is exclusive.
pub fn register_globals(program: &mut Program, symbols: &mut SymbolTable, log: &mut dyn Log) {
    for id in program.globals.clone() {
        let name: Rc<str> = Rc::from(program.decl(id).name());
        let is_function = matches!(program.decl(id).kind, DeclKind::Function(_));
        if let Err(prior) = symbols.register(name, id, is_function, reject_override) {
            log.report(
                Report::error(format!("redefinition of '{}'", program.decl(id).name()))
                    .at(program.decl(id).range)
                    .with_hint(Hint::new(program.decl(prior).range, "previous declaration here")),
            );
        }
    }
}

/// Synthesizes a `DeclId` for each `cbuffer`/`tbuffer` member and registers
/// it directly into the global scope — members are referenced unqualified
/// (`spec.md` §8 S4: `cbuffer C { float4 x; }; ... return x;`), not as
/// `C.x`, so they need first-class declaration identity alongside ordinary
/// globals.
pub fn synthesize_cbuffer_members(program: &mut Program, symbols: &mut SymbolTable, log: &mut dyn Log) {
    for id in program.globals.clone() {
        let is_uniform_buffer = matches!(program.decl(id).kind, DeclKind::UniformBuffer(_));
        if !is_uniform_buffer {
            continue;
        }
        let range = program.decl(id).range;
        let members: Vec<VariableDecl> = match &program.decl(id).kind {
            DeclKind::UniformBuffer(cb) => cb.members.clone(),
            _ => unreachable!(),
        };
        let mut member_ids = Vec::with_capacity(members.len());
        for mut member in members {
            let name = member.name.clone();
            member.owner_cbuffer = Some(id);
            let member_id = program.alloc_decl(range, DeclKind::Variable(member));
            member_ids.push(member_id);
            if let Err(prior) = symbols.register(name.clone(), member_id, false, reject_override) {
                log.report(
                    Report::error(format!("redefinition of '{name}'"))
                        .at(range)
                        .with_hint(Hint::new(program.decl(prior).range, "previous declaration here")),
                );
            }
        }
        if let DeclKind::UniformBuffer(cb) = &mut program.decl_mut(id).kind {
            cb.member_decl_ids = member_ids;
        }
    }
}

/// Walks every global declaration's body/initializer, resolving names and
/// computing types. Must run after [`register_globals`] and
/// [`synthesize_cbuffer_members`] so forward references within the same
/// file resolve regardless of declaration order.
pub fn bind_program(program: &mut Program, symbols: &mut SymbolTable, log: &mut dyn Log) {
    for id in program.globals.clone() {
        bind_decl(program, symbols, id, log);
    }
}

fn bind_decl(program: &mut Program, symbols: &mut SymbolTable, id: DeclId, log: &mut dyn Log) {
    match program.decl(id).kind.clone() {
        DeclKind::Function(f) => bind_function(program, symbols, id, f, log),
        DeclKind::Variable(v) => {
            if let Some(init) = v.initializer {
                bind_expr(program, symbols, init, log);
            }
        }
        DeclKind::Buffer(b) => {
            bind_decorator_args(program, symbols, &b.decorators.annotations.clone(), log);
        }
        DeclKind::Sampler(s) => {
            bind_decorator_args(program, symbols, &s.decorators.annotations.clone(), log);
        }
        DeclKind::UniformBuffer(cb) => {
            for member_id in cb.member_decl_ids.clone() {
                if let DeclKind::Variable(v) = program.decl(member_id).kind.clone() {
                    if let Some(init) = v.initializer {
                        bind_expr(program, symbols, init, log);
                    }
                }
            }
        }
        DeclKind::Struct(_) | DeclKind::Alias(_) => {}
    }
}

fn bind_decorator_args(
    program: &mut Program,
    symbols: &mut SymbolTable,
    annotations: &[crate::ast::Annotation],
    log: &mut dyn Log,
) {
    for ann in annotations {
        for &arg in &ann.args {
            bind_expr(program, symbols, arg, log);
        }
    }
}

fn bind_function(
    program: &mut Program,
    symbols: &mut SymbolTable,
    fn_id: DeclId,
    f: FunctionDecl,
    log: &mut dyn Log,
) {
    symbols.push_scope(ScopeKind::FunctionBody);

    for i in 0..f.params.len() {
        let (name, type_denoter, array_dims, range) = {
            let p = &program.decl(fn_id).as_function().unwrap().params[i];
            (p.name.clone(), p.type_denoter.clone(), p.array_dims.clone(), p.range)
        };
        let shadow_id = program.alloc_decl(
            range,
            DeclKind::Variable(VariableDecl {
                name: name.clone(),
                storage: crate::ast::StorageClass::default(),
                interpolation: crate::ast::Interpolation::Default,
                type_denoter,
                array_dims,
                decorators: crate::ast::Decorators::default(),
                initializer: None,
                owner_cbuffer: None,
            }),
        );
        if let Err(prior) = symbols.register(name.clone(), shadow_id, false, reject_override) {
            log.report(
                Report::error(format!("redefinition of parameter '{name}'"))
                    .at(range)
                    .with_hint(Hint::new(program.decl(prior).range, "previous declaration here")),
            );
        }
        program.decl_mut(fn_id).as_function_mut().unwrap().params[i].shadow_decl = Some(shadow_id);
    }

    for param in &program.decl(fn_id).as_function().unwrap().params.clone() {
        if let Some(default) = param.default_value {
            bind_expr(program, symbols, default, log);
        }
    }

    if let Some(body) = f.body {
        bind_stmt(program, symbols, body, log);
    }

    symbols.pop_scope();
}

fn bind_stmt(program: &mut Program, symbols: &mut SymbolTable, id: StmtId, log: &mut dyn Log) {
    let kind = program.stmt(id).kind.clone();
    match kind {
        StmtKind::CodeBlock(stmts) => {
            symbols.push_scope(ScopeKind::CodeBlock);
            for s in stmts {
                bind_stmt(program, symbols, s, log);
            }
            symbols.pop_scope();
        }
        StmtKind::VarDecl(decl_id) => bind_local_var_decl(program, symbols, decl_id, log),
        StmtKind::For { init, condition, iteration, body } => {
            symbols.push_scope(ScopeKind::ForInit);
            if let Some(init) = init {
                bind_stmt(program, symbols, init, log);
            }
            if let Some(cond) = condition {
                bind_expr(program, symbols, cond, log);
            }
            if let Some(iter) = iteration {
                bind_expr(program, symbols, iter, log);
            }
            bind_stmt(program, symbols, body, log);
            symbols.pop_scope();
        }
        StmtKind::While { condition, body } => {
            bind_expr(program, symbols, condition, log);
            bind_stmt(program, symbols, body, log);
        }
        StmtKind::DoWhile { body, condition } => {
            bind_stmt(program, symbols, body, log);
            bind_expr(program, symbols, condition, log);
        }
        StmtKind::If { condition, then_branch, else_branch } => {
            bind_expr(program, symbols, condition, log);
            bind_stmt(program, symbols, then_branch, log);
            if let Some(else_b) = else_branch {
                bind_stmt(program, symbols, else_b, log);
            }
        }
        StmtKind::Switch { selector, cases } => {
            bind_expr(program, symbols, selector, log);
            symbols.push_scope(ScopeKind::CodeBlock);
            for case in cases {
                if let Some(v) = case.value {
                    bind_expr(program, symbols, v, log);
                }
                for s in case.body {
                    bind_stmt(program, symbols, s, log);
                }
            }
            symbols.pop_scope();
        }
        StmtKind::Return(expr) => {
            if let Some(e) = expr {
                bind_expr(program, symbols, e, log);
            }
        }
        StmtKind::ControlTransfer(_) | StmtKind::Null => {}
        StmtKind::Expr(e) => bind_expr(program, symbols, e, log),
    }
}

fn bind_local_var_decl(program: &mut Program, symbols: &mut SymbolTable, decl_id: DeclId, log: &mut dyn Log) {
    let (name, initializer, range) = match &program.decl(decl_id).kind {
        DeclKind::Variable(v) => (v.name.clone(), v.initializer, program.decl(decl_id).range),
        _ => return,
    };
    if let Some(init) = initializer {
        bind_expr(program, symbols, init, log);
    }
    if let Err(prior) = symbols.register(name.clone(), decl_id, false, reject_override) {
        log.report(
            Report::error(format!("redefinition of '{name}'"))
                .at(range)
                .with_hint(Hint::new(program.decl(prior).range, "previous declaration here")),
        );
    }
}

fn bind_expr(program: &mut Program, symbols: &mut SymbolTable, id: ExprId, log: &mut dyn Log) {
    let kind = program.expr(id).kind.clone();
    match kind {
        ExprKind::Literal(_) | ExprKind::TypeSpecifier(_) => {}
        ExprKind::Sequence(items) => {
            for item in items {
                bind_expr(program, symbols, item, log);
            }
        }
        ExprKind::Binary(_, lhs, rhs) => {
            bind_expr(program, symbols, lhs, log);
            bind_expr(program, symbols, rhs, log);
        }
        ExprKind::Unary(_, operand) | ExprKind::PostUnary(_, operand) => {
            bind_expr(program, symbols, operand, log);
        }
        ExprKind::Ternary(cond, then_b, else_b) => {
            bind_expr(program, symbols, cond, log);
            bind_expr(program, symbols, then_b, log);
            bind_expr(program, symbols, else_b, log);
        }
        ExprKind::Call { callee, args, .. } => {
            for &a in &args {
                bind_expr(program, symbols, a, log);
            }
            bind_call(program, symbols, id, &callee, &args, log);
        }
        ExprKind::Bracket(base, index) => {
            bind_expr(program, symbols, base, log);
            bind_expr(program, symbols, index, log);
        }
        ExprKind::Object { base: Some(base), member, .. } => {
            bind_expr(program, symbols, base, log);
            bind_member_access(program, symbols, id, base, &member, log);
        }
        ExprKind::Object { base: None, member, .. } => {
            bind_bare_name(program, symbols, id, &member, log);
        }
        ExprKind::Initializer(elems) => {
            for e in elems {
                bind_expr(program, symbols, e, log);
            }
        }
        ExprKind::Cast(_, operand) => bind_expr(program, symbols, operand, log),
        ExprKind::Assign(_, target, value) => {
            bind_expr(program, symbols, value, log);
            bind_expr(program, symbols, target, log);
            check_assignment_target(program, target, log);
        }
    }
    compute_expr_type(program, symbols, id, log);
}

fn bind_bare_name(program: &mut Program, symbols: &SymbolTable, id: ExprId, member: &str, log: &mut dyn Log) {
    let range = program.expr(id).range;
    match symbols.find(member) {
        Some(decl_id) => set_object_resolved(program, id, decl_id),
        None => {
            log.report(Report::error(format!("use of undeclared identifier '{member}'")).at(range));
        }
    }
}

fn bind_member_access(
    program: &mut Program,
    symbols: &SymbolTable,
    id: ExprId,
    base: ExprId,
    member: &str,
    log: &mut dyn Log,
) {
    let range = program.expr(id).range;
    let base_ty = compute_expr_type(program, symbols, base, log);
    match base_ty.get_aliased() {
        TypeDenoter::Struct(struct_id, name) => {
            let has_field = program
                .decl(*struct_id)
                .as_struct()
                .map(|s| s.fields.iter().any(|f| f.name.as_ref() == member))
                .unwrap_or(false);
            if has_field {
                set_object_resolved(program, id, *struct_id);
            } else {
                log.report(Report::error(format!("no field '{member}' on struct '{name}'")).at(range));
            }
        }
        TypeDenoter::Vector(_, n) => {
            if is_valid_swizzle(member, *n) {
                // Swizzles have no owning declaration; this is not a
                // binding failure, just nothing to resolve.
            } else {
                log.report(Report::error(format!("invalid swizzle '{member}' on a {n}-component vector")).at(range));
            }
        }
        other => {
            log.report(Report::error(format!("'{}' has no member '{member}'", other.display_name())).at(range));
        }
    }
}

fn is_valid_swizzle(member: &str, component_count: u8) -> bool {
    const XYZW: &[char] = &['x', 'y', 'z', 'w'];
    const RGBA: &[char] = &['r', 'g', 'b', 'a'];
    if member.is_empty() || member.len() > 4 {
        return false;
    }
    let chars: Vec<char> = member.chars().collect();
    let uses_xyzw = chars.iter().all(|c| XYZW.contains(c));
    let uses_rgba = chars.iter().all(|c| RGBA.contains(c));
    if !uses_xyzw && !uses_rgba {
        return false;
    }
    let set = if uses_xyzw { XYZW } else { RGBA };
    chars.iter().all(|c| {
        let idx = set.iter().position(|s| s == c).unwrap();
        idx < component_count as usize
    })
}

fn set_object_resolved(program: &mut Program, id: ExprId, decl_id: DeclId) {
    if let ExprKind::Object { resolved, .. } = &mut program.expr_mut(id).kind {
        *resolved = Some(decl_id);
    }
}

/// Resolves a call's callee: a builtin vector/matrix constructor, a struct
/// constructor, or a user function overload set.
fn bind_call(
    program: &mut Program,
    symbols: &SymbolTable,
    id: ExprId,
    callee: &str,
    args: &[ExprId],
    log: &mut dyn Log,
) {
    let range = program.expr(id).range;

    if let Some(ty) = crate::ast::types::parse_vector_matrix_type_name(callee) {
        program.expr_mut(id).type_denoter = Some(Rc::new(ty));
        return;
    }
    if let Some(base) = BaseType::from_name(callee) {
        program.expr_mut(id).type_denoter = Some(Rc::new(TypeDenoter::Base(base)));
        return;
    }
    if BufferKind::from_name(callee).is_some() || SamplerKind::from_name(callee).is_some() {
        // Object-type "constructors" do not occur in expression position in
        // valid HLSL; nothing meaningful to bind.
        return;
    }
    if let Some(&struct_id) = program.known_type_names.get(callee) {
        set_call_resolved(program, id, struct_id);
        return;
    }

    let candidates = symbols.find_all(callee);
    if candidates.is_empty() {
        log.report(Report::error(format!("call to undeclared function '{callee}'")).at(range));
        return;
    }
    let arg_types: Vec<Rc<TypeDenoter>> = args
        .iter()
        .map(|&a| compute_expr_type(program, symbols, a, log))
        .collect();
    match resolve_overload(program, &candidates, &arg_types) {
        Ok(decl_id) => set_call_resolved(program, id, decl_id),
        Err(OverloadError::NoMatch) => {
            log.report(Report::error(format!("no overload of '{callee}' matches the given arguments")).at(range));
        }
        Err(OverloadError::Ambiguous(candidates)) => {
            let mut report = Report::error(format!("call to '{callee}' is ambiguous"));
            for c in candidates {
                report = report.with_hint(Hint::new(program.decl(c).range, "candidate here"));
            }
            log.report(report.at(range));
        }
    }
}

fn set_call_resolved(program: &mut Program, id: ExprId, decl_id: DeclId) {
    if let ExprKind::Call { resolved, .. } = &mut program.expr_mut(id).kind {
        *resolved = Some(decl_id);
    }
}

fn check_assignment_target(program: &Program, target: ExprId, log: &mut dyn Log) {
    let range = program.expr(target).range;
    let resolved = match &program.expr(target).kind {
        ExprKind::Object { resolved, .. } => *resolved,
        ExprKind::Bracket(base, _) => {
            if let ExprKind::Object { resolved, .. } = &program.expr(*base).kind {
                *resolved
            } else {
                None
            }
        }
        _ => {
            log.report(Report::error("invalid assignment target").at(range));
            return;
        }
    };
    let Some(decl_id) = resolved else { return };
    if let DeclKind::Variable(v) = &program.decl(decl_id).kind {
        if v.storage.is_const {
            log.report(Report::error(format!("cannot assign to const variable '{}'", v.name)).at(range));
        }
    }
}
