//! Trailing declaration decorators: `: SEMANTIC`, `: register(...)`,
//! `: packoffset(...)`, and `[attribute(args...)]` annotations, per
//! `spec.md` §4.4's "registers, semantics, packoffsets, and annotations ...
//! each has its own tiny sub-grammar".

use std::rc::Rc;

use crate::ast::{Annotation, Decorators, PackOffset, RegisterDecorator, Semantic};
use crate::diagnostics::{Log, Report};
use crate::lexer::Punct;
use crate::parser::error::SyntaxError;
use crate::parser::Parser;

impl Parser {
    /// Parses zero or more `[name(arg, arg, ...)]` annotations preceding a
    /// declaration (e.g. `[numthreads(8,8,1)]`, `[unroll]`).
    pub(super) fn parse_annotations(&mut self, log: &mut dyn Log) -> Vec<Annotation> {
        let mut out = Vec::new();
        while self.check_punct(Punct::LBracket) {
            self.bump();
            let Some(name) = self.expect_identifier(log) else {
                self.synchronize();
                break;
            };
            let mut args = Vec::new();
            if self.eat_punct(Punct::LParen) {
                if !self.check_punct(Punct::RParen) {
                    loop {
                        args.push(self.parse_assignment_expr(log));
                        if !self.eat_punct(Punct::Comma) {
                            break;
                        }
                    }
                }
                self.expect_punct(Punct::RParen, log);
            }
            self.expect_punct(Punct::RBracket, log);
            out.push(Annotation { name, args });
        }
        out
    }

    /// Parses the trailing `: SEMANTIC`, `: register(...)`, and
    /// `: packoffset(...)` decorators that may follow a declaration, in any
    /// order and any repetition count (HLSL allows `: packoffset(c0) :
    /// register(b0)` on the same cbuffer member).
    pub(super) fn parse_trailing_decorators(&mut self, log: &mut dyn Log) -> Decorators {
        let mut decorators = Decorators::default();
        while self.eat_punct(Punct::Colon) {
            if self.eat_keyword("register") {
                decorators.register = self.parse_register_args(log);
            } else if self.eat_keyword("packoffset") {
                decorators.pack_offset = self.parse_packoffset_args(log);
            } else if let Some(name) = self.peek().identifier().map(Rc::from) {
                self.bump();
                let index = if self.eat_punct(Punct::LBracket) {
                    let idx = self.parse_uint_literal(log);
                    self.expect_punct(Punct::RBracket, log);
                    idx
                } else {
                    None
                };
                decorators.semantic = Some(Semantic { name, index });
            } else {
                log.report(
                    Report::error(
                        SyntaxError::expected("a semantic, 'register', or 'packoffset'", self.peek())
                            .to_string(),
                    )
                    .at(self.current_range()),
                );
                break;
            }
        }
        decorators
    }

    fn parse_register_args(&mut self, log: &mut dyn Log) -> Option<RegisterDecorator> {
        if !self.expect_punct(Punct::LParen, log) {
            return None;
        }
        let class_tok = self.peek().clone();
        let Some(spelling) = class_tok.identifier().or_else(|| match &class_tok.kind {
            crate::lexer::TokenKind::Keyword(k) => Some(*k),
            _ => None,
        }) else {
            log.report(Report::error("expected a register binding like 'b0'").at(class_tok.range));
            return None;
        };
        let mut chars = spelling.chars();
        let register_class = chars.next().unwrap_or('\0');
        let slot: u32 = chars.as_str().parse().unwrap_or(0);
        self.bump();

        let space = if self.eat_punct(Punct::Comma) {
            let space_tok = self.peek().clone();
            let spelling = space_tok.identifier().unwrap_or("");
            let parsed = spelling.strip_prefix("space").and_then(|s| s.parse().ok());
            self.bump();
            parsed
        } else {
            None
        };
        self.expect_punct(Punct::RParen, log);
        Some(RegisterDecorator {
            register_class,
            slot,
            space,
        })
    }

    fn parse_packoffset_args(&mut self, log: &mut dyn Log) -> Option<PackOffset> {
        if !self.expect_punct(Punct::LParen, log) {
            return None;
        }
        let reg_tok = self.peek().clone();
        let spelling = reg_tok.identifier().unwrap_or("");
        let register = spelling.strip_prefix('c').and_then(|s| s.parse().ok()).unwrap_or(0);
        self.bump();
        let component = if self.eat_punct(Punct::Dot) {
            let comp_tok = self.peek().clone();
            let c = comp_tok.identifier().and_then(|s| s.chars().next());
            self.bump();
            c
        } else {
            None
        };
        self.expect_punct(Punct::RParen, log);
        Some(PackOffset { register, component })
    }

    fn parse_uint_literal(&mut self, log: &mut dyn Log) -> Option<u32> {
        use crate::lexer::{Literal, TokenKind};
        let tok = self.peek().clone();
        match &tok.kind {
            TokenKind::Literal(Literal::Int(v, _)) => {
                self.bump();
                Some(*v as u32)
            }
            _ => {
                log.report(Report::error(SyntaxError::expected("an integer", &tok).to_string()).at(tok.range));
                None
            }
        }
    }
}
