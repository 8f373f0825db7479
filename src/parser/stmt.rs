//! Statement grammar, per `spec.md` §3's statement node list.

use crate::ast::{ControlTransferKind, StmtId, StmtKind, SwitchCase};
use crate::diagnostics::{Log, Report};
use crate::lexer::Punct;
use crate::parser::decl::SourceRangeHelper;
use crate::parser::error::SyntaxError;
use crate::parser::Parser;

impl Parser {
    pub(super) fn parse_block_stmt(&mut self, log: &mut dyn Log) -> StmtId {
        let start = self.current_range();
        self.bump(); // '{'
        let mut stmts = Vec::new();
        while !self.check_punct(Punct::RBrace) && !self.at_eof() {
            stmts.push(self.parse_stmt(log));
        }
        self.expect_punct(Punct::RBrace, log);
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program.alloc_stmt(range, StmtKind::CodeBlock(stmts))
    }

    fn parse_stmt(&mut self, log: &mut dyn Log) -> StmtId {
        let start = self.current_range();
        if self.check_punct(Punct::LBrace) {
            return self.parse_block_stmt(log);
        }
        if self.check_keyword("if") {
            return self.parse_if_stmt(log);
        }
        if self.check_keyword("for") {
            return self.parse_for_stmt(log);
        }
        if self.check_keyword("while") {
            return self.parse_while_stmt(log);
        }
        if self.check_keyword("do") {
            return self.parse_do_while_stmt(log);
        }
        if self.check_keyword("switch") {
            return self.parse_switch_stmt(log);
        }
        if self.eat_keyword("return") {
            let value = if self.check_punct(Punct::Semi) {
                None
            } else {
                Some(self.parse_expr(log))
            };
            self.expect_punct(Punct::Semi, log);
            let range = SourceRangeHelper::span(start, self.current_range());
            return self.program.alloc_stmt(range, StmtKind::Return(value));
        }
        if self.eat_keyword("break") {
            self.expect_punct(Punct::Semi, log);
            let range = SourceRangeHelper::span(start, self.current_range());
            return self
                .program
                .alloc_stmt(range, StmtKind::ControlTransfer(ControlTransferKind::Break));
        }
        if self.eat_keyword("continue") {
            self.expect_punct(Punct::Semi, log);
            let range = SourceRangeHelper::span(start, self.current_range());
            return self
                .program
                .alloc_stmt(range, StmtKind::ControlTransfer(ControlTransferKind::Continue));
        }
        if self.eat_keyword("discard") {
            self.expect_punct(Punct::Semi, log);
            let range = SourceRangeHelper::span(start, self.current_range());
            return self
                .program
                .alloc_stmt(range, StmtKind::ControlTransfer(ControlTransferKind::Discard));
        }
        if self.eat_punct(Punct::Semi) {
            let range = SourceRangeHelper::span(start, self.current_range());
            return self.program.alloc_stmt(range, StmtKind::Null);
        }

        if self.looks_like_local_decl_start() {
            return self.parse_local_decl_stmt(log);
        }

        let expr = self.parse_expr(log);
        self.expect_punct(Punct::Semi, log);
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program.alloc_stmt(range, StmtKind::Expr(expr))
    }

    /// Disambiguates a local variable declaration from an expression
    /// statement: a storage-class keyword, a scalar-type keyword, or an
    /// identifier that is a known type name / builtin vector-matrix /
    /// buffer / sampler type name.
    fn looks_like_local_decl_start(&self) -> bool {
        const STORAGE_KEYWORDS: &[&str] = &[
            "static", "uniform", "extern", "const", "volatile", "inline", "groupshared",
            "row_major", "column_major",
        ];
        const INTERPOLATION_KEYWORDS: &[&str] = &[
            "linear", "centroid", "nointerpolation", "noperspective", "sample",
        ];
        match &self.peek().kind {
            crate::lexer::TokenKind::Keyword(kw) => {
                STORAGE_KEYWORDS.contains(kw)
                    || INTERPOLATION_KEYWORDS.contains(kw)
                    || crate::ast::types::BaseType::from_name(kw).is_some()
            }
            crate::lexer::TokenKind::Identifier(name) => {
                crate::ast::types::parse_vector_matrix_type_name(name).is_some()
                    || crate::ast::BufferKind::from_name(name).is_some()
                    || crate::ast::SamplerKind::from_name(name).is_some()
                    || self.is_known_type_name(name)
            }
            _ => false,
        }
    }

    fn parse_local_decl_stmt(&mut self, log: &mut dyn Log) -> StmtId {
        let start = self.current_range();
        let mut storage = crate::ast::StorageClass::default();
        loop {
            match &self.peek().kind {
                crate::lexer::TokenKind::Keyword("static") => {
                    storage.is_static = true;
                    self.bump();
                }
                crate::lexer::TokenKind::Keyword("const") => {
                    storage.is_const = true;
                    self.bump();
                }
                crate::lexer::TokenKind::Keyword(
                    "uniform" | "extern" | "volatile" | "inline" | "groupshared" | "row_major"
                    | "column_major",
                ) => {
                    self.bump();
                }
                _ => break,
            }
        }
        let interpolation = match &self.peek().kind {
            crate::lexer::TokenKind::Keyword(
                kw @ ("linear" | "centroid" | "nointerpolation" | "noperspective" | "sample"),
            ) => {
                let interp = match *kw {
                    "linear" => crate::ast::Interpolation::Linear,
                    "centroid" => crate::ast::Interpolation::Centroid,
                    "nointerpolation" => crate::ast::Interpolation::NoInterpolation,
                    "noperspective" => crate::ast::Interpolation::NoPerspective,
                    "sample" => crate::ast::Interpolation::Sample,
                    _ => unreachable!(),
                };
                self.bump();
                interp
            }
            _ => crate::ast::Interpolation::Default,
        };

        let Some(type_denoter) = self.try_parse_type_denoter(log) else {
            log.report(
                Report::error(SyntaxError::expected("a local declaration", self.peek()).to_string())
                    .at(self.current_range()),
            );
            self.synchronize();
            let range = SourceRangeHelper::span(start, self.current_range());
            return self.program.alloc_stmt(range, StmtKind::Null);
        };
        let Some(name) = self.expect_identifier(log) else {
            self.synchronize();
            let range = SourceRangeHelper::span(start, self.current_range());
            return self.program.alloc_stmt(range, StmtKind::Null);
        };
        let array_dims = self.parse_array_dims(log);
        let decorators = self.parse_trailing_decorators(log);
        let initializer = if self.eat_punct(Punct::Assign) {
            Some(self.parse_initializer_or_assignment_expr(log))
        } else {
            None
        };

        let decl_range = SourceRangeHelper::span(start, self.current_range());
        let decl_id = self.program.alloc_decl(
            decl_range,
            crate::ast::DeclKind::Variable(crate::ast::VariableDecl {
                name,
                storage,
                interpolation,
                type_denoter,
                array_dims,
                decorators,
                initializer,
                owner_cbuffer: None,
            }),
        );
        let mut stmts = vec![self
            .program
            .alloc_stmt(decl_range, StmtKind::VarDecl(decl_id))];

        while self.eat_punct(Punct::Comma) {
            let Some(extra_name) = self.expect_identifier(log) else {
                break;
            };
            let ty = match self.program.decl(decl_id).kind.clone() {
                crate::ast::DeclKind::Variable(v) => v.type_denoter.clone(),
                _ => unreachable!(),
            };
            let extra_dims = self.parse_array_dims(log);
            let extra_decorators = self.parse_trailing_decorators(log);
            let extra_init = if self.eat_punct(Punct::Assign) {
                Some(self.parse_initializer_or_assignment_expr(log))
            } else {
                None
            };
            let extra_range = self.current_range();
            let extra_decl = self.program.alloc_decl(
                extra_range,
                crate::ast::DeclKind::Variable(crate::ast::VariableDecl {
                    name: extra_name,
                    storage,
                    interpolation,
                    type_denoter: ty,
                    array_dims: extra_dims,
                    decorators: extra_decorators,
                    initializer: extra_init,
                    owner_cbuffer: None,
                }),
            );
            stmts.push(self.program.alloc_stmt(extra_range, StmtKind::VarDecl(extra_decl)));
        }
        self.expect_punct(Punct::Semi, log);

        if stmts.len() == 1 {
            return stmts.pop().unwrap();
        }
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program.alloc_stmt(range, StmtKind::CodeBlock(stmts))
    }

    fn parse_if_stmt(&mut self, log: &mut dyn Log) -> StmtId {
        let start = self.current_range();
        self.bump(); // 'if'
        self.expect_punct(Punct::LParen, log);
        let condition = self.parse_expr(log);
        self.expect_punct(Punct::RParen, log);
        let then_branch = self.parse_stmt(log);
        let else_branch = if self.eat_keyword("else") {
            Some(self.parse_stmt(log))
        } else {
            None
        };
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program.alloc_stmt(
            range,
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            },
        )
    }

    fn parse_for_stmt(&mut self, log: &mut dyn Log) -> StmtId {
        let start = self.current_range();
        self.bump(); // 'for'
        self.expect_punct(Punct::LParen, log);
        let init = if self.check_punct(Punct::Semi) {
            self.bump();
            None
        } else if self.looks_like_local_decl_start() {
            Some(self.parse_local_decl_stmt(log))
        } else {
            let e = self.parse_expr(log);
            self.expect_punct(Punct::Semi, log);
            let r = self.current_range();
            Some(self.program.alloc_stmt(r, StmtKind::Expr(e)))
        };
        let condition = if self.check_punct(Punct::Semi) {
            None
        } else {
            Some(self.parse_expr(log))
        };
        self.expect_punct(Punct::Semi, log);
        let iteration = if self.check_punct(Punct::RParen) {
            None
        } else {
            Some(self.parse_expr(log))
        };
        self.expect_punct(Punct::RParen, log);
        let body = self.parse_stmt(log);
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program.alloc_stmt(
            range,
            StmtKind::For {
                init,
                condition,
                iteration,
                body,
            },
        )
    }

    fn parse_while_stmt(&mut self, log: &mut dyn Log) -> StmtId {
        let start = self.current_range();
        self.bump(); // 'while'
        self.expect_punct(Punct::LParen, log);
        let condition = self.parse_expr(log);
        self.expect_punct(Punct::RParen, log);
        let body = self.parse_stmt(log);
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program
            .alloc_stmt(range, StmtKind::While { condition, body })
    }

    fn parse_do_while_stmt(&mut self, log: &mut dyn Log) -> StmtId {
        let start = self.current_range();
        self.bump(); // 'do'
        let body = self.parse_stmt(log);
        if !self.eat_keyword("while") {
            log.report(Report::error(SyntaxError::expected("'while'", self.peek()).to_string()).at(self.current_range()));
        }
        self.expect_punct(Punct::LParen, log);
        let condition = self.parse_expr(log);
        self.expect_punct(Punct::RParen, log);
        self.expect_punct(Punct::Semi, log);
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program
            .alloc_stmt(range, StmtKind::DoWhile { body, condition })
    }

    fn parse_switch_stmt(&mut self, log: &mut dyn Log) -> StmtId {
        let start = self.current_range();
        self.bump(); // 'switch'
        self.expect_punct(Punct::LParen, log);
        let selector = self.parse_expr(log);
        self.expect_punct(Punct::RParen, log);
        self.expect_punct(Punct::LBrace, log);

        let mut cases = Vec::new();
        while !self.check_punct(Punct::RBrace) && !self.at_eof() {
            let value = if self.eat_keyword("case") {
                let v = self.parse_expr(log);
                self.expect_punct(Punct::Colon, log);
                Some(v)
            } else if self.eat_keyword("default") {
                self.expect_punct(Punct::Colon, log);
                None
            } else {
                log.report(
                    Report::error(SyntaxError::expected("'case' or 'default'", self.peek()).to_string())
                        .at(self.current_range()),
                );
                self.synchronize();
                continue;
            };
            let mut body = Vec::new();
            while !self.check_keyword("case")
                && !self.check_keyword("default")
                && !self.check_punct(Punct::RBrace)
                && !self.at_eof()
            {
                body.push(self.parse_stmt(log));
            }
            cases.push(SwitchCase { value, body });
        }
        self.expect_punct(Punct::RBrace, log);
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program
            .alloc_stmt(range, StmtKind::Switch { selector, cases })
    }
}
