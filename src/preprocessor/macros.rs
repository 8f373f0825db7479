//! Macro table and the token-substitution expansion engine.
//!
//! Implements `spec.md` §4.3's macro-expansion semantics: parameter lists,
//! `__VA_ARGS__`, the being-expanded ("blue paint") self-recursion guard,
//! unevaluated argument substitution, `#` stringize, `##` paste, and body
//! rescan.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::diagnostics::{Log, Report};
use crate::lexer::{Literal, Punct, Token, TokenKind};
use crate::source::{FileTable, SourcePosition, SourceRange};

#[derive(Debug, Clone)]
pub struct MacroDef {
    pub name: Rc<str>,
    /// `None` for an object-like macro; `Some(params)` for function-like,
    /// where the last entry is `"__VA_ARGS__"` if `is_variadic`.
    pub params: Option<Vec<Rc<str>>>,
    pub is_variadic: bool,
    pub body: Vec<Token>,
    pub defined_at: SourcePosition,
}

impl MacroDef {
    pub fn is_function_like(&self) -> bool {
        self.params.is_some()
    }
}

/// A defined-macro record retained for reflection (`spec.md` §4.9), even
/// after the macro has been `#undef`'d.
#[derive(Debug, Clone)]
pub struct MacroSnapshot {
    pub name: Rc<str>,
    pub params: Option<Vec<Rc<str>>>,
    pub is_function_like: bool,
    pub defined_at: SourcePosition,
}

#[derive(Debug, Default)]
pub struct MacroTable {
    macros: HashMap<Rc<str>, MacroDef>,
    ever_defined: Vec<MacroSnapshot>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, def: MacroDef) {
        self.ever_defined.push(MacroSnapshot {
            name: def.name.clone(),
            params: def.params.clone(),
            is_function_like: def.is_function_like(),
            defined_at: def.defined_at,
        });
        self.macros.insert(def.name.clone(), def);
    }

    pub fn undef(&mut self, name: &str) {
        self.macros.remove(name);
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&MacroDef> {
        self.macros.get(name)
    }

    /// All macros ever `#define`'d during this compilation, consumed by the
    /// reflection extractor's sidecar (`spec.md` §4.3, §4.9).
    pub fn snapshot(&self) -> &[MacroSnapshot] {
        &self.ever_defined
    }
}

fn synth_token(kind: TokenKind, lexeme: &str, at: SourcePosition) -> Token {
    Token {
        kind,
        range: SourceRange::point(at),
        lexeme: Rc::from(lexeme),
        leading_comments: Vec::new(),
        preceded_by_whitespace: true,
        at_line_start: false,
    }
}

/// Retokenizes a string produced by `##` paste or `#` stringize. Falls back
/// to an identifier token covering the whole text if it doesn't lex as a
/// single clean token — pasting two fragments that don't form a valid token
/// is technically undefined behavior in C, and here becomes a best-effort
/// identifier rather than a hard failure.
fn retokenize_single(text: &str, at: SourcePosition) -> Token {
    let mut buf = crate::source::SourceBuffer::new("<paste>", text);
    let mut log = crate::diagnostics::NullLog::default();
    let mut lexer = crate::lexer::Lexer::new(&mut buf, crate::lexer::Dialect::Hlsl);
    let tok = lexer.next_token(&mut log);
    if tok.is_eof() {
        synth_token(TokenKind::Identifier(Rc::from(text)), text, at)
    } else {
        let mut tok = tok;
        tok.range = SourceRange::point(at);
        tok
    }
}

/// Expands `tokens` fully, given the current macro table. `active` tracks
/// macros currently being expanded on the call stack (the blue-paint guard):
/// an identifier matching an active macro name is left unexpanded rather
/// than recursing, per `spec.md` §4.3 and testable property 2.
pub fn expand_tokens(
    table: &MacroTable,
    tokens: &[Token],
    active: &mut HashSet<Rc<str>>,
    files: &FileTable,
    log: &mut dyn Log,
) -> Vec<Token> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        let tok = &tokens[i];
        let Some(name) = tok.identifier() else {
            out.push(tok.clone());
            i += 1;
            continue;
        };

        if name == "__LINE__" {
            out.push(synth_token(
                TokenKind::Literal(Literal::Int(tok.range.start.line as i64, crate::lexer::NumericSuffix::None)),
                &tok.range.start.line.to_string(),
                tok.range.start,
            ));
            i += 1;
            continue;
        }
        if name == "__FILE__" {
            let file_name = files.name(tok.range.start.file);
            out.push(synth_token(
                TokenKind::Literal(Literal::String(Rc::from(file_name))),
                file_name,
                tok.range.start,
            ));
            i += 1;
            continue;
        }

        if active.contains(name) {
            // Blue paint: this identifier names a macro currently being
            // expanded further up the call stack. Leave it as a plain
            // identifier token rather than recursing.
            out.push(tok.clone());
            i += 1;
            continue;
        }

        let Some(def) = table.get(name) else {
            out.push(tok.clone());
            i += 1;
            continue;
        };

        if let Some(params) = &def.params {
            // Function-like macro: only expands if immediately followed by
            // `(` (skipping nothing — HLSL/C macro calls are not
            // whitespace-sensitive here beyond ordinary tokenization).
            let next_is_lparen = tokens
                .get(i + 1)
                .map(|t| t.is_punct(Punct::LParen))
                .unwrap_or(false);
            if !next_is_lparen {
                out.push(tok.clone());
                i += 1;
                continue;
            }
            let (args, consumed) = match collect_arguments(&tokens[i + 1..]) {
                Some(v) => v,
                None => {
                    log.report(
                        Report::error(format!(
                            "unterminated argument list in call to macro '{name}'"
                        ))
                        .at(tok.range),
                    );
                    out.push(tok.clone());
                    i += 1;
                    continue;
                }
            };
            i += 1 + consumed;

            let arity_ok = if def.is_variadic {
                args.len() >= params.len().saturating_sub(1)
            } else {
                args.len() == params.len() || (params.is_empty() && args.len() == 1 && args[0].is_empty())
            };
            if !arity_ok {
                log.report(
                    Report::error(format!(
                        "macro '{name}' expects {} argument(s), got {}",
                        params.len(),
                        args.len()
                    ))
                    .at(tok.range),
                );
                continue;
            }

            let substituted = substitute_body(def, params, &args, tok.range.start);
            active.insert(name.into());
            let rescanned = expand_tokens(table, &substituted, active, files, log);
            active.remove(name);
            out.extend(rescanned);
        } else {
            active.insert(name.into());
            let rescanned = expand_tokens(table, &def.body, active, files, log);
            active.remove(name);
            out.extend(rescanned);
            i += 1;
        }
    }
    out
}

/// Parses the parenthesized argument list starting at `tokens[0]` (which
/// must be `(`). Arguments are split on top-level commas; a comma nested
/// inside balanced parens belongs to the argument. Returns the argument
/// token lists (not yet macro-expanded — substitution happens lazily per
/// `spec.md` §4.3) and how many tokens were consumed including both
/// parens.
fn collect_arguments(tokens: &[Token]) -> Option<(Vec<Vec<Token>>, usize)> {
    if !tokens.first()?.is_punct(Punct::LParen) {
        return None;
    }
    let mut depth = 1;
    let mut i = 1;
    let mut args: Vec<Vec<Token>> = vec![Vec::new()];
    while i < tokens.len() {
        let tok = &tokens[i];
        if tok.is_punct(Punct::LParen) {
            depth += 1;
            args.last_mut().unwrap().push(tok.clone());
        } else if tok.is_punct(Punct::RParen) {
            depth -= 1;
            if depth == 0 {
                i += 1;
                if args.len() == 1 && args[0].is_empty() {
                    return Some((Vec::new(), i));
                }
                return Some((args, i));
            }
            args.last_mut().unwrap().push(tok.clone());
        } else if tok.is_punct(Punct::Comma) && depth == 1 {
            args.push(Vec::new());
        } else {
            args.last_mut().unwrap().push(tok.clone());
        }
        i += 1;
    }
    None
}

/// Substitutes `params` with `args` into `def.body`, handling `#`
/// stringize and `##` paste. Does **not** recursively expand the result —
/// that happens in the caller's rescan pass, so this function never sees
/// `active` and cannot itself trigger self-recursion.
fn substitute_body(
    def: &MacroDef,
    params: &[Rc<str>],
    args: &[Vec<Token>],
    call_site: SourcePosition,
) -> Vec<Token> {
    let arg_for = |name: &str| -> Option<&[Token]> {
        if def.is_variadic && name == "__VA_ARGS__" {
            let fixed = params.len() - 1;
            return args.get(fixed.min(args.len())..).map(|rest| {
                // flattened below; placeholder, real join happens at call site
                rest.first().map(|v| v.as_slice()).unwrap_or(&[])
            });
        }
        params
            .iter()
            .position(|p| p == name)
            .and_then(|idx| args.get(idx))
            .map(|v| v.as_slice())
    };

    // __VA_ARGS__ needs the comma-joined tail, not just the first variadic
    // arg; build it once up front.
    let va_args: Vec<Token> = if def.is_variadic {
        let fixed = params.len() - 1;
        let mut joined = Vec::new();
        for (idx, arg) in args.iter().enumerate().skip(fixed) {
            if idx > fixed {
                joined.push(synth_token(
                    TokenKind::Punct(Punct::Comma),
                    ",",
                    call_site,
                ));
            }
            joined.extend(arg.iter().cloned());
        }
        joined
    } else {
        Vec::new()
    };

    let mut result: Vec<Token> = Vec::new();
    let body = &def.body;
    let mut i = 0;
    while i < body.len() {
        let tok = &body[i];

        if tok.is_punct(Punct::Hash) {
            if let Some(next) = body.get(i + 1) {
                if let Some(name) = next.identifier() {
                    let arg_tokens = if def.is_variadic && name == "__VA_ARGS__" {
                        va_args.as_slice()
                    } else {
                        arg_for(name).unwrap_or(&[])
                    };
                    let text = stringize(arg_tokens);
                    result.push(synth_token(
                        TokenKind::Literal(Literal::String(Rc::from(text.as_str()))),
                        &text,
                        call_site,
                    ));
                    i += 2;
                    continue;
                }
            }
        }

        result.push(tok.clone());
        i += 1;
    }

    // Pass 2: substitute parameter identifiers with argument tokens (not yet
    // macro-expanded — that happens after paste, in the caller's rescan).
    let mut substituted = Vec::new();
    for tok in result {
        if let Some(name) = tok.identifier() {
            if def.is_variadic && name == "__VA_ARGS__" {
                substituted.extend(va_args.iter().cloned());
                continue;
            }
            if let Some(arg_tokens) = arg_for(name) {
                if arg_tokens.is_empty() {
                    // An empty argument substitutes to nothing; `##`
                    // neighbors still paste against an empty operand below.
                } else {
                    substituted.extend(arg_tokens.iter().cloned());
                }
                continue;
            }
        }
        substituted.push(tok);
    }

    // Pass 3: resolve `##` paste over the substituted stream.
    paste_adjacent(substituted, call_site)
}

fn stringize(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (idx, tok) in tokens.iter().enumerate() {
        if idx > 0 && tok.preceded_by_whitespace {
            out.push(' ');
        }
        out.push_str(&token_text(tok));
    }
    out
}

fn token_text(tok: &Token) -> String {
    match &tok.kind {
        TokenKind::Literal(Literal::String(s)) => format!("\"{s}\""),
        _ => tok.lexeme.to_string(),
    }
}

fn paste_adjacent(tokens: Vec<Token>, call_site: SourcePosition) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i].is_punct(Punct::HashHash) {
            // `a ## b`: pop the left operand already in `out`, take the
            // right operand, and paste their lexemes into one new token.
            let right = tokens.get(i + 1);
            match (out.pop(), right) {
                (Some(left), Some(right)) => {
                    let text = format!("{}{}", token_text(&left), token_text(right));
                    out.push(retokenize_single(&text, call_site));
                    i += 2;
                }
                (Some(left), None) => {
                    out.push(left);
                    i += 1;
                }
                (None, Some(right)) => {
                    out.push(right.clone());
                    i += 2;
                }
                (None, None) => {
                    i += 1;
                }
            }
            continue;
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    out
}
