//! `ReferenceAnalyzer`, per `spec.md` §4.7: "starts at the entry-point node
//! and transitively marks every declaration reachable through calls, type
//! uses, and member access; unmarked declarations are skipped during
//! emission."

use std::collections::HashSet;

use crate::ast::{
    DeclId, DeclKind, ExprId, ExprKind, NodeFlags, Program, StmtId, StmtKind, TypeDenoter,
};

/// Marks [`NodeFlags::REACHABLE`] on every declaration transitively used
/// from `program.effective_entry_point()`. A no-op if no entry point was
/// resolved (analysis already failed in that case and code generation is
/// skipped regardless).
pub fn mark_reachable(program: &mut Program) {
    let Some(entry) = program.effective_entry_point() else {
        return;
    };

    let mut seen: HashSet<DeclId> = HashSet::new();
    let mut worklist: Vec<DeclId> = vec![entry];

    while let Some(id) = worklist.pop() {
        if !seen.insert(id) {
            continue;
        }
        program.decl_mut(id).flags.insert(NodeFlags::REACHABLE);
        collect_decl_refs(program, id, &mut worklist);
    }
}

fn push_type_refs(ty: &TypeDenoter, out: &mut Vec<DeclId>) {
    match ty {
        TypeDenoter::Struct(id, _) => out.push(*id),
        TypeDenoter::Array(elem, _) => push_type_refs(elem, out),
        TypeDenoter::Buffer(_, Some(elem)) => push_type_refs(elem, out),
        TypeDenoter::Alias(_, target) => push_type_refs(target, out),
        _ => {}
    }
}

fn collect_decl_refs(program: &Program, id: DeclId, out: &mut Vec<DeclId>) {
    match &program.decl(id).kind {
        DeclKind::Function(f) => {
            push_type_refs(&f.return_type, out);
            for p in &f.params {
                push_type_refs(&p.type_denoter, out);
                if let Some(def) = p.default_value {
                    collect_expr_refs(program, def, out);
                }
            }
            if let Some(body) = f.body {
                collect_stmt_refs(program, body, out);
            }
        }
        DeclKind::Variable(v) => {
            push_type_refs(&v.type_denoter, out);
            if let Some(init) = v.initializer {
                collect_expr_refs(program, init, out);
            }
            // A synthesized cbuffer member reaches back to its owning
            // `UniformBuffer` decl, so `C`'s `REACHABLE` flag follows any of
            // its members being referenced (spec.md §8 S4).
            if let Some(owner) = v.owner_cbuffer {
                out.push(owner);
            }
        }
        DeclKind::Buffer(b) => push_type_refs(&b.type_denoter, out),
        DeclKind::Sampler(_) => {}
        DeclKind::Struct(s) => {
            for field in &s.fields {
                push_type_refs(&field.type_denoter, out);
            }
        }
        DeclKind::UniformBuffer(cb) => {
            for member_id in &cb.member_decl_ids {
                out.push(*member_id);
            }
            for m in &cb.members {
                push_type_refs(&m.type_denoter, out);
            }
        }
        DeclKind::Alias(a) => push_type_refs(&a.target, out),
    }
}

fn collect_stmt_refs(program: &Program, id: StmtId, out: &mut Vec<DeclId>) {
    match &program.stmt(id).kind {
        StmtKind::CodeBlock(stmts) => {
            for s in stmts {
                collect_stmt_refs(program, *s, out);
            }
        }
        StmtKind::VarDecl(decl) => {
            out.push(*decl);
            collect_decl_refs(program, *decl, out);
        }
        StmtKind::For { init, condition, iteration, body } => {
            if let Some(s) = init {
                collect_stmt_refs(program, *s, out);
            }
            if let Some(e) = condition {
                collect_expr_refs(program, *e, out);
            }
            if let Some(e) = iteration {
                collect_expr_refs(program, *e, out);
            }
            collect_stmt_refs(program, *body, out);
        }
        StmtKind::While { condition, body } => {
            collect_expr_refs(program, *condition, out);
            collect_stmt_refs(program, *body, out);
        }
        StmtKind::DoWhile { body, condition } => {
            collect_stmt_refs(program, *body, out);
            collect_expr_refs(program, *condition, out);
        }
        StmtKind::If { condition, then_branch, else_branch } => {
            collect_expr_refs(program, *condition, out);
            collect_stmt_refs(program, *then_branch, out);
            if let Some(e) = else_branch {
                collect_stmt_refs(program, *e, out);
            }
        }
        StmtKind::Switch { selector, cases } => {
            collect_expr_refs(program, *selector, out);
            for case in cases {
                if let Some(v) = case.value {
                    collect_expr_refs(program, v, out);
                }
                for s in &case.body {
                    collect_stmt_refs(program, *s, out);
                }
            }
        }
        StmtKind::Return(Some(e)) => collect_expr_refs(program, *e, out),
        StmtKind::Return(None) => {}
        StmtKind::ControlTransfer(_) => {}
        StmtKind::Expr(e) => collect_expr_refs(program, *e, out),
        StmtKind::Null => {}
    }
}

fn collect_expr_refs(program: &Program, id: ExprId, out: &mut Vec<DeclId>) {
    let expr = program.expr(id);
    if let Some(ty) = &expr.type_denoter {
        push_type_refs(ty, out);
    }
    match &expr.kind {
        ExprKind::Literal(_) => {}
        ExprKind::TypeSpecifier(ty) => push_type_refs(ty, out),
        ExprKind::Sequence(items) | ExprKind::Initializer(items) => {
            for e in items {
                collect_expr_refs(program, *e, out);
            }
        }
        ExprKind::Binary(_, l, r) | ExprKind::Bracket(l, r) => {
            collect_expr_refs(program, *l, out);
            collect_expr_refs(program, *r, out);
        }
        ExprKind::Unary(_, e) | ExprKind::PostUnary(_, e) => collect_expr_refs(program, *e, out),
        ExprKind::Cast(ty, e) => {
            push_type_refs(ty, out);
            collect_expr_refs(program, *e, out);
        }
        ExprKind::Ternary(c, t, f) => {
            collect_expr_refs(program, *c, out);
            collect_expr_refs(program, *t, out);
            collect_expr_refs(program, *f, out);
        }
        ExprKind::Call { args, resolved, .. } => {
            if let Some(decl_id) = resolved {
                out.push(*decl_id);
            }
            for a in args {
                collect_expr_refs(program, *a, out);
            }
        }
        ExprKind::Object { base, resolved, .. } => {
            if let Some(b) = base {
                collect_expr_refs(program, *b, out);
            }
            if let Some(decl_id) = resolved {
                out.push(*decl_id);
            }
        }
        ExprKind::Assign(_, target, value) => {
            collect_expr_refs(program, *target, out);
            collect_expr_refs(program, *value, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BaseType, FunctionDecl, Param, ParamDir, Interpolation, Decorators};
    use crate::source::{FileId, SourcePosition, SourceRange};
    use std::rc::Rc;

    fn range() -> SourceRange {
        SourceRange::point(SourcePosition::new(FileId(0), 1, 1))
    }

    #[test]
    fn unreachable_sibling_function_is_not_marked() {
        let mut program = Program::new();
        let helper = program.alloc_decl(
            range(),
            DeclKind::Function(FunctionDecl {
                name: Rc::from("unused"),
                mangled_name: None,
                return_type: Rc::new(TypeDenoter::Void),
                return_semantic: None,
                params: Vec::new(),
                body: None,
                annotations: Vec::new(),
                is_entry_point_candidate: false,
            }),
        );
        let used = program.alloc_decl(
            range(),
            DeclKind::Function(FunctionDecl {
                name: Rc::from("helper"),
                mangled_name: None,
                return_type: Rc::new(TypeDenoter::Base(BaseType::Float)),
                return_semantic: None,
                params: Vec::new(),
                body: None,
                annotations: Vec::new(),
                is_entry_point_candidate: false,
            }),
        );
        let call = program.alloc_expr(
            range(),
            ExprKind::Call { callee: Rc::from("helper"), args: Vec::new(), resolved: Some(used) },
        );
        let ret = program.alloc_stmt(range(), StmtKind::Return(Some(call)));
        let body = program.alloc_stmt(range(), StmtKind::CodeBlock(vec![ret]));
        let entry = program.alloc_decl(
            range(),
            DeclKind::Function(FunctionDecl {
                name: Rc::from("main"),
                mangled_name: None,
                return_type: Rc::new(TypeDenoter::Base(BaseType::Float)),
                return_semantic: None,
                params: vec![Param {
                    name: Rc::from("unused_param"),
                    dir: ParamDir::In,
                    interpolation: Interpolation::Default,
                    type_denoter: Rc::new(TypeDenoter::Base(BaseType::Float)),
                    array_dims: Vec::new(),
                    decorators: Decorators::default(),
                    default_value: None,
                    range: range(),
                    resolved_field_of: None,
                    shadow_decl: None,
                }],
                body: Some(body),
                annotations: Vec::new(),
                is_entry_point_candidate: true,
            }),
        );
        program.globals = vec![helper, used, entry];
        program.entry_point = Some(entry);

        mark_reachable(&mut program);

        assert!(program.decl(entry).flags.contains(NodeFlags::REACHABLE));
        assert!(program.decl(used).flags.contains(NodeFlags::REACHABLE));
        assert!(!program.decl(helper).flags.contains(NodeFlags::REACHABLE));
    }
}
