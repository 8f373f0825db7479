//! `hasNonReturnControlPath`, per `spec.md` §4.6: "for each function, compute
//! ... by a join-lattice traversal over statements; `return` statements
//! inside all branches of every terminal choice clear it."

use crate::ast::{ControlTransferKind, NodeFlags, Program, StmtId, StmtKind};

/// Computes and stores [`NodeFlags::HAS_NON_RETURN_PATH`] on every function
/// declaration with a body.
pub fn compute_all(program: &mut Program) {
    for id in program.globals.clone() {
        let body = match &program.decl(id).kind {
            crate::ast::DeclKind::Function(f) => f.body,
            _ => None,
        };
        let Some(body) = body else { continue };
        let always_returns = stmt_always_exits(program, body);
        let flags = &mut program.decl_mut(id).flags;
        flags.set(NodeFlags::HAS_NON_RETURN_PATH, !always_returns);
    }
}

/// True if every control path through `id` is guaranteed to end in a
/// `return` (or a `discard`, which likewise never falls off the end of the
/// function). A conservative analysis: loops are never considered
/// guaranteed to execute their body, so a `return` reachable only through a
/// loop does not count.
fn stmt_always_exits(program: &Program, id: StmtId) -> bool {
    match &program.stmt(id).kind {
        StmtKind::CodeBlock(stmts) => stmts.iter().any(|&s| stmt_always_exits(program, s)),
        StmtKind::If { then_branch, else_branch, .. } => {
            let Some(else_b) = else_branch else { return false };
            stmt_always_exits(program, *then_branch) && stmt_always_exits(program, *else_b)
        }
        StmtKind::Switch { cases, .. } => {
            let has_default = cases.iter().any(|c| c.value.is_none());
            has_default
                && cases.iter().all(|case| {
                    case.body.iter().any(|&s| stmt_always_exits(program, s))
                })
        }
        StmtKind::Return(_) => true,
        StmtKind::ControlTransfer(ControlTransferKind::Discard) => true,
        StmtKind::ControlTransfer(_) => false,
        StmtKind::For { .. } | StmtKind::While { .. } | StmtKind::DoWhile { .. } => false,
        StmtKind::VarDecl(_) | StmtKind::Expr(_) | StmtKind::Null => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BaseType, DeclKind, FunctionDecl, StmtKind, TypeDenoter};
    use crate::source::{FileId, SourcePosition, SourceRange};
    use std::rc::Rc;

    fn range() -> SourceRange {
        SourceRange::point(SourcePosition::new(FileId(0), 1, 1))
    }

    fn make_function(program: &mut Program, body: StmtId) -> crate::ast::DeclId {
        let id = program.alloc_decl(
            range(),
            DeclKind::Function(FunctionDecl {
                name: Rc::from("f"),
                mangled_name: None,
                return_type: Rc::new(TypeDenoter::Base(BaseType::Float)),
                return_semantic: None,
                params: Vec::new(),
                body: Some(body),
                annotations: Vec::new(),
                is_entry_point_candidate: false,
            }),
        );
        program.globals.push(id);
        id
    }

    #[test]
    fn if_else_both_returning_clears_flag() {
        let mut program = Program::new();
        let ret_true = program.alloc_stmt(range(), StmtKind::Return(None));
        let ret_false = program.alloc_stmt(range(), StmtKind::Return(None));
        let cond = program.alloc_expr(range(), crate::ast::ExprKind::Literal(crate::lexer::Literal::Bool(true)));
        let if_stmt = program.alloc_stmt(
            range(),
            StmtKind::If { condition: cond, then_branch: ret_true, else_branch: Some(ret_false) },
        );
        let block = program.alloc_stmt(range(), StmtKind::CodeBlock(vec![if_stmt]));
        let f = make_function(&mut program, block);
        compute_all(&mut program);
        assert!(!program.decl(f).flags.contains(NodeFlags::HAS_NON_RETURN_PATH));
    }

    #[test]
    fn if_without_else_leaves_a_non_return_path() {
        let mut program = Program::new();
        let ret_true = program.alloc_stmt(range(), StmtKind::Return(None));
        let cond = program.alloc_expr(range(), crate::ast::ExprKind::Literal(crate::lexer::Literal::Bool(true)));
        let if_stmt = program.alloc_stmt(range(), StmtKind::If { condition: cond, then_branch: ret_true, else_branch: None });
        let block = program.alloc_stmt(range(), StmtKind::CodeBlock(vec![if_stmt]));
        let f = make_function(&mut program, block);
        compute_all(&mut program);
        assert!(program.decl(f).flags.contains(NodeFlags::HAS_NON_RETURN_PATH));
    }
}
