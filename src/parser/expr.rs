//! Expression grammar: precedence climbing plus the cast-vs-parenthesized-
//! expression disambiguation of `spec.md` §4.4.

use std::rc::Rc;

use crate::ast::{AssignOp, BinaryOp, ExprId, ExprKind, UnaryOp, PostUnaryOp};
use crate::diagnostics::{Log, Report};
use crate::lexer::{Literal as LexLiteral, Punct, TokenKind};
use crate::parser::decl::SourceRangeHelper;
use crate::parser::error::SyntaxError;
use crate::parser::Parser;

impl Parser {
    /// Top-level expression: a possibly comma-joined sequence, used at
    /// statement position and inside `for (...)` clauses.
    pub(super) fn parse_expr(&mut self, log: &mut dyn Log) -> ExprId {
        let start = self.current_range();
        let first = self.parse_assignment_expr(log);
        if !self.check_punct(Punct::Comma) {
            return first;
        }
        let mut items = vec![first];
        while self.eat_punct(Punct::Comma) {
            items.push(self.parse_assignment_expr(log));
        }
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program.alloc_expr(range, ExprKind::Sequence(items))
    }

    /// A single assignment-level expression, with no top-level comma —
    /// what call arguments, array dimensions, and initializers parse.
    pub(super) fn parse_assignment_expr(&mut self, log: &mut dyn Log) -> ExprId {
        let start = self.current_range();
        let left = self.parse_ternary(log);
        let op = match &self.peek().kind {
            TokenKind::Punct(Punct::Assign) => Some(AssignOp::Assign),
            TokenKind::Punct(Punct::AddAssign) => Some(AssignOp::Add),
            TokenKind::Punct(Punct::SubAssign) => Some(AssignOp::Sub),
            TokenKind::Punct(Punct::MulAssign) => Some(AssignOp::Mul),
            TokenKind::Punct(Punct::DivAssign) => Some(AssignOp::Div),
            TokenKind::Punct(Punct::ModAssign) => Some(AssignOp::Mod),
            TokenKind::Punct(Punct::AndAssign) => Some(AssignOp::And),
            TokenKind::Punct(Punct::OrAssign) => Some(AssignOp::Or),
            TokenKind::Punct(Punct::XorAssign) => Some(AssignOp::Xor),
            TokenKind::Punct(Punct::ShlAssign) => Some(AssignOp::Shl),
            TokenKind::Punct(Punct::ShrAssign) => Some(AssignOp::Shr),
            _ => None,
        };
        let Some(op) = op else { return left };
        self.bump();
        let right = self.parse_assignment_expr(log);
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program.alloc_expr(range, ExprKind::Assign(op, left, right))
    }

    fn parse_ternary(&mut self, log: &mut dyn Log) -> ExprId {
        let start = self.current_range();
        let cond = self.parse_logical_or(log);
        if !self.eat_punct(Punct::Question) {
            return cond;
        }
        let then_branch = self.parse_assignment_expr(log);
        self.expect_punct(Punct::Colon, log);
        let else_branch = self.parse_assignment_expr(log);
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program
            .alloc_expr(range, ExprKind::Ternary(cond, then_branch, else_branch))
    }

    fn parse_logical_or(&mut self, log: &mut dyn Log) -> ExprId {
        self.parse_left_assoc_binary(log, &[(Punct::OrOr, BinaryOp::Or)], Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self, log: &mut dyn Log) -> ExprId {
        self.parse_left_assoc_binary(log, &[(Punct::AndAnd, BinaryOp::And)], Self::parse_bit_or)
    }

    fn parse_bit_or(&mut self, log: &mut dyn Log) -> ExprId {
        self.parse_left_assoc_binary(log, &[(Punct::Pipe, BinaryOp::BitOr)], Self::parse_bit_xor)
    }

    fn parse_bit_xor(&mut self, log: &mut dyn Log) -> ExprId {
        self.parse_left_assoc_binary(log, &[(Punct::Caret, BinaryOp::BitXor)], Self::parse_bit_and)
    }

    fn parse_bit_and(&mut self, log: &mut dyn Log) -> ExprId {
        self.parse_left_assoc_binary(log, &[(Punct::Amp, BinaryOp::BitAnd)], Self::parse_equality)
    }

    fn parse_equality(&mut self, log: &mut dyn Log) -> ExprId {
        self.parse_left_assoc_binary(
            log,
            &[(Punct::Eq, BinaryOp::Eq), (Punct::Ne, BinaryOp::Ne)],
            Self::parse_relational,
        )
    }

    fn parse_relational(&mut self, log: &mut dyn Log) -> ExprId {
        self.parse_left_assoc_binary(
            log,
            &[
                (Punct::Lt, BinaryOp::Lt),
                (Punct::Gt, BinaryOp::Gt),
                (Punct::Le, BinaryOp::Le),
                (Punct::Ge, BinaryOp::Ge),
            ],
            Self::parse_shift,
        )
    }

    fn parse_shift(&mut self, log: &mut dyn Log) -> ExprId {
        self.parse_left_assoc_binary(
            log,
            &[(Punct::Shl, BinaryOp::Shl), (Punct::Shr, BinaryOp::Shr)],
            Self::parse_additive,
        )
    }

    fn parse_additive(&mut self, log: &mut dyn Log) -> ExprId {
        self.parse_left_assoc_binary(
            log,
            &[(Punct::Add, BinaryOp::Add), (Punct::Sub, BinaryOp::Sub)],
            Self::parse_multiplicative,
        )
    }

    fn parse_multiplicative(&mut self, log: &mut dyn Log) -> ExprId {
        self.parse_left_assoc_binary(
            log,
            &[
                (Punct::Star, BinaryOp::Mul),
                (Punct::Slash, BinaryOp::Div),
                (Punct::Percent, BinaryOp::Mod),
            ],
            Self::parse_unary,
        )
    }

    fn parse_left_assoc_binary(
        &mut self,
        log: &mut dyn Log,
        ops: &[(Punct, BinaryOp)],
        mut next: impl FnMut(&mut Self, &mut dyn Log) -> ExprId,
    ) -> ExprId {
        let start = self.current_range();
        let mut left = next(self, log);
        loop {
            let matched = ops.iter().find(|(p, _)| self.check_punct(*p));
            let Some((_, op)) = matched else { break };
            let op = *op;
            self.bump();
            let right = next(self, log);
            let range = SourceRangeHelper::span(start, self.current_range());
            left = self.program.alloc_expr(range, ExprKind::Binary(op, left, right));
        }
        left
    }

    fn parse_unary(&mut self, log: &mut dyn Log) -> ExprId {
        let start = self.current_range();
        let unary_op = match &self.peek().kind {
            TokenKind::Punct(Punct::Not) => Some(UnaryOp::Not),
            TokenKind::Punct(Punct::Sub) => Some(UnaryOp::Neg),
            TokenKind::Punct(Punct::Tilde) => Some(UnaryOp::BitNot),
            TokenKind::Punct(Punct::Inc) => Some(UnaryOp::PreInc),
            TokenKind::Punct(Punct::Dec) => Some(UnaryOp::PreDec),
            _ => None,
        };
        if let Some(op) = unary_op {
            self.bump();
            let operand = self.parse_unary(log);
            let range = SourceRangeHelper::span(start, self.current_range());
            return self.program.alloc_expr(range, ExprKind::Unary(op, operand));
        }
        // `+x` is a no-op unary plus; parse and discard the operator node.
        if self.check_punct(Punct::Add) {
            self.bump();
            return self.parse_unary(log);
        }
        if self.check_punct(Punct::LParen) {
            if let Some(cast) = self.try_parse_cast(start, log) {
                return cast;
            }
        }
        self.parse_postfix(log)
    }

    /// Speculatively parses `(Type)` immediately followed by something that
    /// can start a unary expression. Restores the cursor and returns `None`
    /// if the parenthesized content is not a recognized type — the
    /// ordinary "known type names" disambiguation of `spec.md` §4.4, not a
    /// backtracking grammar in general.
    fn try_parse_cast(&mut self, start: crate::source::SourceRange, log: &mut dyn Log) -> Option<ExprId> {
        let saved = self.save_pos();
        self.bump(); // '('
        let mut scratch = crate::diagnostics::NullLog::default();
        let Some(type_denoter) = self.try_parse_type_denoter(&mut scratch) else {
            self.restore_pos(saved);
            return None;
        };
        if !self.check_punct(Punct::RParen) {
            self.restore_pos(saved);
            return None;
        }
        self.bump(); // ')'
        let operand = self.parse_unary(log);
        let range = SourceRangeHelper::span(start, self.current_range());
        Some(self.program.alloc_expr(range, ExprKind::Cast(type_denoter, operand)))
    }

    fn parse_postfix(&mut self, log: &mut dyn Log) -> ExprId {
        let start = self.current_range();
        let mut expr = self.parse_primary(log);
        loop {
            if self.eat_punct(Punct::Dot) {
                let Some(member) = self.expect_identifier(log) else { break };
                let range = SourceRangeHelper::span(start, self.current_range());
                expr = self.program.alloc_expr(
                    range,
                    ExprKind::Object {
                        base: Some(expr),
                        member,
                        resolved: None,
                    },
                );
            } else if self.eat_punct(Punct::LBracket) {
                let index = self.parse_expr(log);
                self.expect_punct(Punct::RBracket, log);
                let range = SourceRangeHelper::span(start, self.current_range());
                expr = self.program.alloc_expr(range, ExprKind::Bracket(expr, index));
            } else if self.eat_punct(Punct::Inc) {
                let range = SourceRangeHelper::span(start, self.current_range());
                expr = self
                    .program
                    .alloc_expr(range, ExprKind::PostUnary(PostUnaryOp::PostInc, expr));
            } else if self.eat_punct(Punct::Dec) {
                let range = SourceRangeHelper::span(start, self.current_range());
                expr = self
                    .program
                    .alloc_expr(range, ExprKind::PostUnary(PostUnaryOp::PostDec, expr));
            } else {
                break;
            }
        }
        expr
    }

    fn parse_primary(&mut self, log: &mut dyn Log) -> ExprId {
        let start = self.current_range();

        if let TokenKind::Literal(lit) = self.peek().kind.clone() {
            self.bump();
            return self.program.alloc_expr(start, ExprKind::Literal(lit));
        }

        if self.eat_punct(Punct::LParen) {
            let inner = self.parse_expr(log);
            self.expect_punct(Punct::RParen, log);
            return inner;
        }

        if self.check_punct(Punct::LBrace) {
            return self.parse_initializer_or_assignment_expr(log);
        }

        // A builtin vector/matrix/buffer/sampler type name used as a
        // constructor call callee, e.g. `float4(1,0,0,1)`.
        if let TokenKind::Identifier(name) = self.peek().kind.clone() {
            if crate::ast::types::parse_vector_matrix_type_name(&name).is_some()
                || self.is_known_type_name(&name)
            {
                if self.peek_at(1).is_punct(Punct::LParen) {
                    self.bump();
                    return self.parse_call(start, name, log);
                }
            }
        }
        if let TokenKind::Keyword(kw) = self.peek().kind {
            if crate::ast::types::BaseType::from_name(kw).is_some()
                && self.peek_at(1).is_punct(Punct::LParen)
            {
                self.bump();
                return self.parse_call(start, Rc::from(kw), log);
            }
        }

        if let Some(name) = self.peek().identifier().map(Rc::from) {
            self.bump();
            if self.check_punct(Punct::LParen) {
                return self.parse_call(start, name, log);
            }
            return self.program.alloc_expr(
                start,
                ExprKind::Object {
                    base: None,
                    member: name,
                    resolved: None,
                },
            );
        }

        log.report(Report::error(SyntaxError::expected("an expression", self.peek()).to_string()).at(start));
        self.program.alloc_expr(start, ExprKind::Literal(LexLiteral::Int(0, crate::lexer::NumericSuffix::None)))
    }

    fn parse_call(&mut self, start: crate::source::SourceRange, callee: Rc<str>, log: &mut dyn Log) -> ExprId {
        self.bump(); // '('
        let mut args = Vec::new();
        if !self.check_punct(Punct::RParen) {
            loop {
                args.push(self.parse_assignment_expr(log));
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RParen, log);
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program.alloc_expr(
            range,
            ExprKind::Call {
                callee,
                args,
                resolved: None,
            },
        )
    }
}
