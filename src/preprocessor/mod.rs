//! The preprocessor: directive loop + macro expansion loop, per `spec.md`
//! §4.3.

pub mod conditional;
pub mod expr_eval;
pub mod include;
pub mod macros;

use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

use crate::diagnostics::{Log, Report};
use crate::lexer::{Dialect, Lexer, Token, TokenKind};
use crate::source::{FileTable, PragmaOnceSet, SourceBuffer};

pub use conditional::ConditionalStack;
pub use expr_eval::ExprEval;
pub use include::{FsIncludeHandler, IncludeHandler, MemoryIncludeHandler};
pub use macros::{MacroDef, MacroTable};

/// Result of a full preprocessing run: the token stream ready for the
/// parser (or for verbatim re-emission in preprocess-only mode), plus the
/// macro table for the reflection sidecar.
pub struct PreprocessResult {
    pub tokens: Vec<Token>,
    pub macros: MacroTable,
    /// The file table accumulated over the whole run (root file plus every
    /// include pushed), kept so later stages and diagnostics can resolve
    /// `FileId`s without the now-consumed `SourceBuffer`.
    pub files: FileTable,
}

/// Drives the directive loop over a [`SourceBuffer`], expanding macros in
/// active (non-skipped) content and delegating `#include` to an
/// [`IncludeHandler`].
pub struct Preprocessor<'a> {
    buf: SourceBuffer,
    dialect: Dialect,
    macros: MacroTable,
    conditionals: ConditionalStack,
    pragma_once: PragmaOnceSet,
    include_handler: &'a mut dyn IncludeHandler,
    search_paths: Vec<PathBuf>,
    pending: Option<Token>,
    had_fatal_error: bool,
}

impl<'a> Preprocessor<'a> {
    pub fn new(
        file_name: impl Into<String>,
        source: impl Into<Rc<str>>,
        include_handler: &'a mut dyn IncludeHandler,
        search_paths: Vec<PathBuf>,
        max_include_depth: usize,
    ) -> Self {
        let file_name = file_name.into();
        let mut buf = SourceBuffer::new(Rc::from(file_name.as_str()), source);
        buf.set_max_include_depth(max_include_depth);
        for p in &search_paths {
            buf.add_include_path(p.clone());
        }
        Self {
            buf,
            dialect: Dialect::Hlsl,
            macros: MacroTable::new(),
            conditionals: ConditionalStack::new(),
            pragma_once: PragmaOnceSet::new(),
            include_handler,
            search_paths,
            pending: None,
            had_fatal_error: false,
        }
    }

    /// Predefines a macro before the run starts, e.g. for `-D` CLI flags.
    pub fn predefine(&mut self, name: &str, body_src: &str) {
        let body_tokens = {
            let mut buf = SourceBuffer::new("<predefined>", body_src.to_string());
            let mut log = crate::diagnostics::NullLog::default();
            let mut lexer = Lexer::new(&mut buf, self.dialect);
            let mut toks = Vec::new();
            loop {
                let t = lexer.next_token(&mut log);
                if t.is_eof() {
                    break;
                }
                toks.push(t);
            }
            toks
        };
        self.macros.define(MacroDef {
            name: Rc::from(name),
            params: None,
            is_variadic: false,
            body: body_tokens,
            defined_at: self.buf.current_position(),
        });
    }

    /// The canonical name of whichever file is currently on top of the
    /// include stack, resolved dynamically so it tracks push/pop rather
    /// than reflecting only the root file.
    fn current_file_name(&self) -> String {
        let file = self.buf.current_position().file;
        self.buf.files().name(file).to_string()
    }

    fn next_raw(&mut self, log: &mut dyn Log) -> Token {
        if let Some(tok) = self.pending.take() {
            return tok;
        }
        let mut lexer = Lexer::new(&mut self.buf, self.dialect);
        lexer.next_token(log)
    }

    /// Runs the full directive + macro-expansion loop and returns the
    /// resulting token stream plus the macro table (for the reflection
    /// sidecar, `spec.md` §4.3/§4.9).
    pub fn run(mut self, log: &mut dyn Log) -> PreprocessResult {
        let mut output = Vec::new();
        let mut content_run: Vec<Token> = Vec::new();

        loop {
            let tok = self.next_raw(log);
            if tok.is_eof() {
                self.flush_content(&mut content_run, &mut output, log);
                break;
            }
            if matches!(tok.kind, TokenKind::Directive) {
                self.flush_content(&mut content_run, &mut output, log);
                self.handle_directive(log);
                if self.had_fatal_error {
                    break;
                }
                continue;
            }
            if self.conditionals.is_active() {
                content_run.push(tok);
            }
            // else: inactive region, token dropped silently.
        }

        if self.conditionals.depth() != 0 {
            log.report(Report::error(format!(
                "{} unterminated conditional directive(s) at end of file",
                self.conditionals.depth()
            )));
        }

        PreprocessResult {
            tokens: output,
            macros: self.macros,
            files: self.buf.files().clone(),
        }
    }

    fn flush_content(&mut self, run: &mut Vec<Token>, output: &mut Vec<Token>, log: &mut dyn Log) {
        if run.is_empty() {
            return;
        }
        let taken = std::mem::take(run);
        let mut active = HashSet::new();
        let expanded = macros::expand_tokens(&self.macros, &taken, &mut active, self.buf.files(), log);
        output.extend(expanded);
    }

    /// Reads the rest of the current logical line (tokens up to, but not
    /// including, the next token whose `at_line_start` is true), leaving
    /// that next token buffered in `self.pending`.
    fn collect_line(&mut self, log: &mut dyn Log) -> Vec<Token> {
        let mut line = Vec::new();
        loop {
            let tok = self.next_raw(log);
            if tok.is_eof() || tok.at_line_start {
                self.pending = Some(tok);
                break;
            }
            line.push(tok);
        }
        line
    }

    fn handle_directive(&mut self, log: &mut dyn Log) {
        let name_tok = self.next_raw(log);
        let name = directive_name(&name_tok);
        let Some(name) = name else {
            if self.conditionals.is_active() {
                log.report(Report::error("expected a directive name after '#'").at(name_tok.range));
            }
            self.collect_line(log);
            return;
        };

        match name.as_str() {
            "define" => {
                let line = self.collect_line(log);
                if self.conditionals.is_active() {
                    self.handle_define(line, log);
                }
            }
            "undef" => {
                let line = self.collect_line(log);
                if self.conditionals.is_active() {
                    if let Some(n) = line.first().and_then(|t| t.identifier()) {
                        self.macros.undef(n);
                    }
                }
            }
            "if" => {
                let line = self.collect_line(log);
                let only_structural = !self.conditionals.is_active();
                let value = self.eval_condition(&line, only_structural, log);
                self.conditionals.push_if(value != 0);
            }
            "ifdef" => {
                let line = self.collect_line(log);
                let defined = line
                    .first()
                    .and_then(|t| t.identifier())
                    .map(|n| self.macros.is_defined(n))
                    .unwrap_or(false);
                self.conditionals.push_if(defined);
            }
            "ifndef" => {
                let line = self.collect_line(log);
                let defined = line
                    .first()
                    .and_then(|t| t.identifier())
                    .map(|n| self.macros.is_defined(n))
                    .unwrap_or(false);
                self.conditionals.push_if(!defined);
            }
            "elif" => {
                let line = self.collect_line(log);
                let only_structural = !self.conditionals.parent_is_active();
                let value = self.eval_condition(&line, only_structural, log);
                if let Err(e) = self.conditionals.handle_elif(value != 0) {
                    log.report(Report::error(e.to_string()).at(name_tok.range));
                }
            }
            "else" => {
                self.collect_line(log);
                if let Err(e) = self.conditionals.handle_else() {
                    log.report(Report::error(e.to_string()).at(name_tok.range));
                }
            }
            "endif" => {
                self.collect_line(log);
                if let Err(e) = self.conditionals.handle_endif() {
                    log.report(Report::error(e.to_string()).at(name_tok.range));
                }
            }
            "include" => {
                let line = self.collect_line(log);
                if self.conditionals.is_active() {
                    self.handle_include(line, name_tok.range.start, log);
                }
            }
            "pragma" => {
                let line = self.collect_line(log);
                if self.conditionals.is_active()
                    && line.first().and_then(|t| t.identifier()) == Some("once")
                {
                    let current = self.current_file_name();
                    self.pragma_once.mark(&current);
                }
            }
            "line" => {
                let line = self.collect_line(log);
                if self.conditionals.is_active() {
                    self.handle_line_directive(line);
                }
            }
            "error" => {
                let line = self.collect_line(log);
                if self.conditionals.is_active() {
                    log.report(
                        Report::error(format!("#error {}", render_line(&line))).at(name_tok.range),
                    );
                }
            }
            "warning" => {
                let line = self.collect_line(log);
                if self.conditionals.is_active() {
                    log.report(
                        Report::warning(format!("#warning {}", render_line(&line)))
                            .at(name_tok.range),
                    );
                }
            }
            other => {
                let _ = self.collect_line(log);
                if self.conditionals.is_active() {
                    log.report(
                        Report::error(format!("unknown preprocessor directive '#{other}'"))
                            .at(name_tok.range),
                    );
                }
            }
        }
    }

    fn eval_condition(&mut self, line: &[Token], only_structural: bool, log: &mut dyn Log) -> i64 {
        if only_structural {
            return 0;
        }
        let resolved = self.resolve_defined(line);
        let mut active = HashSet::new();
        let expanded = macros::expand_tokens(&self.macros, &resolved, &mut active, self.buf.files(), log);
        match ExprEval::evaluate(&expanded) {
            Ok(v) => v,
            Err(e) => {
                log.report(Report::error(e.to_string()));
                0
            }
        }
    }

    /// Rewrites `defined(X)` / `defined X` into an integer literal *before*
    /// macro expansion touches `X` — `defined` must see whether `X` is
    /// defined, not its expansion.
    fn resolve_defined(&self, line: &[Token]) -> Vec<Token> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < line.len() {
            if line[i].identifier() == Some("defined") {
                let (name, consumed) = if line.get(i + 1).map(|t| t.is_punct(crate::lexer::Punct::LParen)).unwrap_or(false) {
                    let n = line.get(i + 2).and_then(|t| t.identifier());
                    (n, 4usize)
                } else {
                    let n = line.get(i + 1).and_then(|t| t.identifier());
                    (n, 2usize)
                };
                if let Some(name) = name {
                    let defined = self.macros.is_defined(name);
                    out.push(Token {
                        kind: TokenKind::Literal(crate::lexer::Literal::Int(defined as i64, crate::lexer::NumericSuffix::None)),
                        range: line[i].range,
                        lexeme: Rc::from(if defined { "1" } else { "0" }),
                        leading_comments: Vec::new(),
                        preceded_by_whitespace: line[i].preceded_by_whitespace,
                        at_line_start: line[i].at_line_start,
                    });
                    i += consumed;
                    continue;
                }
            }
            out.push(line[i].clone());
            i += 1;
        }
        out
    }

    fn handle_define(&mut self, line: Vec<Token>, log: &mut dyn Log) {
        let Some(name_tok) = line.first() else {
            log.report(Report::error("#define requires a macro name"));
            return;
        };
        let Some(name) = name_tok.identifier() else {
            log.report(Report::error("#define requires a macro name").at(name_tok.range));
            return;
        };
        let name: Rc<str> = Rc::from(name);
        let defined_at = name_tok.range.start;

        let is_function_like = line
            .get(1)
            .map(|t| t.is_punct(crate::lexer::Punct::LParen) && !t.preceded_by_whitespace)
            .unwrap_or(false);

        if !is_function_like {
            self.macros.define(MacroDef {
                name,
                params: None,
                is_variadic: false,
                body: line[1..].to_vec(),
                defined_at,
            });
            return;
        }

        // Function-like: parse the parameter list.
        let mut params = Vec::new();
        let mut is_variadic = false;
        let mut i = 2;
        while i < line.len() {
            if line[i].is_punct(crate::lexer::Punct::RParen) {
                i += 1;
                break;
            }
            if line[i].is_punct(crate::lexer::Punct::Comma) {
                i += 1;
                continue;
            }
            if line[i].lexeme.as_ref() == "..." {
                is_variadic = true;
                params.push(Rc::from("__VA_ARGS__"));
                i += 1;
                continue;
            }
            if let Some(p) = line[i].identifier() {
                params.push(Rc::from(p));
            }
            i += 1;
        }

        self.macros.define(MacroDef {
            name,
            params: Some(params),
            is_variadic,
            body: line[i..].to_vec(),
            defined_at,
        });
    }

    fn handle_include(&mut self, line: Vec<Token>, at: crate::source::SourcePosition, log: &mut dyn Log) {
        let Some((path, is_system)) = parse_include_target(&line) else {
            log.report(
                Report::error("expected \"file\" or <file> after #include").at(
                    crate::source::SourceRange::point(at),
                ),
            );
            return;
        };

        match self.include_handler.resolve(&path, is_system, &self.search_paths) {
            Ok(resolved) => {
                // `#pragma once` is keyed by the handler's resolved
                // canonical name, not the literal path text at the
                // `#include` site, so two spellings of the same file
                // (`"a.hlsli"` vs. `"./a.hlsli"`) still dedup correctly.
                if self.pragma_once.contains(&resolved.canonical_name) {
                    return;
                }
                match self.buf.push_include(resolved.canonical_name.clone(), resolved.source) {
                    Ok(_) => {}
                    Err(e) => {
                        log.report(
                            Report::error(e.to_string()).at(crate::source::SourceRange::point(at)),
                        );
                    }
                }
            }
            Err(e) => {
                log.report(Report::error(e.to_string()).at(crate::source::SourceRange::point(at)));
            }
        }
    }

    fn handle_line_directive(&mut self, line: Vec<Token>) {
        let Some(first) = line.first() else { return };
        let line_number = match &first.kind {
            TokenKind::Literal(crate::lexer::Literal::Int(v, _)) => *v as u32,
            _ => return,
        };
        let file_name = line.get(1).and_then(|t| match &t.kind {
            TokenKind::Literal(crate::lexer::Literal::String(s)) => Some(s.to_string()),
            _ => None,
        });
        self.buf.set_line(line_number, file_name.as_deref());
    }
}

fn directive_name(tok: &Token) -> Option<String> {
    match &tok.kind {
        TokenKind::Identifier(s) => Some(s.to_string()),
        TokenKind::Keyword(k) => Some(k.to_string()),
        _ => None,
    }
}

fn render_line(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|t| t.lexeme.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_include_target(line: &[Token]) -> Option<(String, bool)> {
    match line.first()?.kind.clone() {
        TokenKind::Literal(crate::lexer::Literal::String(s)) => Some((s.to_string(), false)),
        TokenKind::Punct(crate::lexer::Punct::Lt) => {
            let mut path = String::new();
            for tok in &line[1..] {
                if tok.is_punct(crate::lexer::Punct::Gt) {
                    return Some((path, true));
                }
                path.push_str(&tok.lexeme);
            }
            None
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingLog;

    fn preprocess(src: &str) -> (Vec<Token>, CollectingLog) {
        let mut handler = MemoryIncludeHandler::new();
        let mut log = CollectingLog::new();
        let pp = Preprocessor::new("t.hlsl", src.to_string(), &mut handler, Vec::new(), 64);
        let result = pp.run(&mut log);
        (result.tokens, log)
    }

    fn render(tokens: &[Token]) -> String {
        tokens.iter().map(|t| t.lexeme.to_string()).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn idempotent_without_directives() {
        let (toks, log) = preprocess("float4 x ;");
        assert!(!log.has_errors());
        assert_eq!(render(&toks), "float4 x ;");
    }

    #[test]
    fn conditional_skipping_suppresses_nested_if_errors() {
        // property 3: inside #if 0, undefined identifiers in nested
        // controlling expressions are not errors.
        let (_, log) = preprocess("#if 0\n#if UNDEFINED_THING\nint x;\n#endif\n#endif\n");
        assert!(!log.has_errors());
    }

    #[test]
    fn macro_expansion_in_content() {
        let (toks, log) = preprocess("#define SQR(x) ((x)*(x))\nSQR(1+2)\n");
        assert!(!log.has_errors());
        assert_eq!(render(&toks), "( ( 1 + 2 ) * ( 1 + 2 ) )");
    }

    #[test]
    fn pragma_once_dedups_repeated_includes() {
        let mut handler = MemoryIncludeHandler::new();
        handler.add("common.hlsli", "#pragma once\nint shared_val;\n");
        let mut log = CollectingLog::new();
        let pp = Preprocessor::new(
            "main.hlsl",
            "#include \"common.hlsli\"\n#include \"common.hlsli\"\n".to_string(),
            &mut handler,
            Vec::new(),
            64,
        );
        let result = pp.run(&mut log);
        assert!(!log.has_errors());
        let count = result
            .tokens
            .iter()
            .filter(|t| t.identifier() == Some("shared_val"))
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn reports_error_directive() {
        let (_, log) = preprocess("#error boom\n");
        assert!(log.has_errors());
    }
}
