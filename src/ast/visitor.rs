//! Traversal infrastructure over the tagged-union AST.
//!
//! The original dynamic-dispatch-with-downcasts visitor becomes a plain
//! `match` over the node's variant tag; `Visitor` supplies override points
//! and `walk_*` free functions supply the default "visit every child"
//! recursion, so an implementor overrides only the node kinds it cares
//! about (per `spec.md` §9's "helper traits for recursive traversal").

use crate::ast::nodes::*;
use crate::ast::Program;

/// Read-only traversal over a [`Program`]. Default method bodies recurse
/// into children via the `walk_*` functions; override a method to intercept
/// a node kind without losing traversal of the rest.
pub trait Visitor {
    fn visit_decl(&mut self, program: &Program, id: DeclId) {
        walk_decl(self, program, id);
    }
    fn visit_stmt(&mut self, program: &Program, id: StmtId) {
        walk_stmt(self, program, id);
    }
    fn visit_expr(&mut self, program: &Program, id: ExprId) {
        walk_expr(self, program, id);
    }
}

pub fn walk_decl<V: Visitor + ?Sized>(v: &mut V, program: &Program, id: DeclId) {
    let decl = program.decl(id);
    match &decl.kind {
        DeclKind::Function(f) => {
            if let Some(body) = f.body {
                v.visit_stmt(program, body);
            }
            for p in &f.params {
                if let Some(def) = p.default_value {
                    v.visit_expr(program, def);
                }
            }
        }
        DeclKind::Variable(var) => {
            if let Some(init) = var.initializer {
                v.visit_expr(program, init);
            }
        }
        DeclKind::UniformBuffer(cb) => {
            for m in &cb.members {
                if let Some(init) = m.initializer {
                    v.visit_expr(program, init);
                }
            }
        }
        DeclKind::Buffer(_) | DeclKind::Sampler(_) | DeclKind::Struct(_) | DeclKind::Alias(_) => {}
    }
}

pub fn walk_stmt<V: Visitor + ?Sized>(v: &mut V, program: &Program, id: StmtId) {
    let stmt = program.stmt(id);
    match &stmt.kind {
        StmtKind::CodeBlock(stmts) => {
            for s in stmts {
                v.visit_stmt(program, *s);
            }
        }
        StmtKind::VarDecl(decl) => v.visit_decl(program, *decl),
        StmtKind::For { init, condition, iteration, body } => {
            if let Some(init) = init {
                v.visit_stmt(program, *init);
            }
            if let Some(c) = condition {
                v.visit_expr(program, *c);
            }
            if let Some(it) = iteration {
                v.visit_expr(program, *it);
            }
            v.visit_stmt(program, *body);
        }
        StmtKind::While { condition, body } => {
            v.visit_expr(program, *condition);
            v.visit_stmt(program, *body);
        }
        StmtKind::DoWhile { body, condition } => {
            v.visit_stmt(program, *body);
            v.visit_expr(program, *condition);
        }
        StmtKind::If { condition, then_branch, else_branch } => {
            v.visit_expr(program, *condition);
            v.visit_stmt(program, *then_branch);
            if let Some(e) = else_branch {
                v.visit_stmt(program, *e);
            }
        }
        StmtKind::Switch { selector, cases } => {
            v.visit_expr(program, *selector);
            for case in cases {
                if let Some(val) = case.value {
                    v.visit_expr(program, val);
                }
                for s in &case.body {
                    v.visit_stmt(program, *s);
                }
            }
        }
        StmtKind::Return(Some(e)) => v.visit_expr(program, *e),
        StmtKind::Return(None) => {}
        StmtKind::ControlTransfer(_) => {}
        StmtKind::Expr(e) => v.visit_expr(program, *e),
        StmtKind::Null => {}
    }
}

pub fn walk_expr<V: Visitor + ?Sized>(v: &mut V, program: &Program, id: ExprId) {
    let expr = program.expr(id);
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::TypeSpecifier(_) => {}
        ExprKind::Sequence(exprs) | ExprKind::Initializer(exprs) => {
            for e in exprs {
                v.visit_expr(program, *e);
            }
        }
        ExprKind::Binary(_, l, r) | ExprKind::Bracket(l, r) => {
            v.visit_expr(program, *l);
            v.visit_expr(program, *r);
        }
        ExprKind::Unary(_, e) | ExprKind::PostUnary(_, e) | ExprKind::Cast(_, e) => {
            v.visit_expr(program, *e);
        }
        ExprKind::Ternary(c, t, f) => {
            v.visit_expr(program, *c);
            v.visit_expr(program, *t);
            v.visit_expr(program, *f);
        }
        ExprKind::Call { args, .. } => {
            for a in args {
                v.visit_expr(program, *a);
            }
        }
        ExprKind::Object { base, .. } => {
            if let Some(b) = base {
                v.visit_expr(program, *b);
            }
        }
        ExprKind::Assign(_, l, r) => {
            v.visit_expr(program, *l);
            v.visit_expr(program, *r);
        }
    }
}
