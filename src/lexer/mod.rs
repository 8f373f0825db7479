//! Tokenizer: turns a [`SourceBuffer`] into a lazy stream of [`Token`]s.

pub mod keywords;
pub mod token;

use std::rc::Rc;

use crate::diagnostics::{Log, Report};
use crate::source::{SourceBuffer, SourcePosition, SourceRange};

pub use keywords::Dialect;
pub use token::{Literal, NumericSuffix, Punct, Token, TokenKind};

/// Tokenizes a [`SourceBuffer`] on demand. `Lexer::next_token` is the sole
/// entry point so the preprocessor can drive it lazily: directive lines are
/// consumed without lexing the entire file up front, matching `spec.md`
/// §4.2's "produces a lazy token stream".
pub struct Lexer<'a> {
    buf: &'a mut SourceBuffer,
    dialect: Dialect,
    preserve_comments: bool,
    at_line_start: bool,
    pending_comments: Vec<Rc<str>>,
}

impl<'a> Lexer<'a> {
    pub fn new(buf: &'a mut SourceBuffer, dialect: Dialect) -> Self {
        Self {
            buf,
            dialect,
            preserve_comments: false,
            at_line_start: true,
            pending_comments: Vec::new(),
        }
    }

    pub fn with_preserve_comments(mut self, preserve: bool) -> Self {
        self.preserve_comments = preserve;
        self
    }

    /// Produces the next token, reporting lexical errors to `log` and
    /// resynchronizing at the next whitespace as `spec.md` §4.2 requires.
    pub fn next_token(&mut self, log: &mut dyn Log) -> Token {
        loop {
            let preceded_by_ws = self.skip_whitespace_and_comments(log);
            let at_line_start = self.at_line_start;
            self.at_line_start = false;
            let start = self.buf.current_position();

            let Some(c) = self.buf.peek() else {
                return self.make_eof(start);
            };

            if c == '#' && at_line_start {
                self.buf.bump();
                return self.finish(TokenKind::Directive, start, preceded_by_ws, at_line_start);
            }

            if is_ident_start(c) {
                return self.lex_identifier(start, preceded_by_ws, at_line_start);
            }
            if c.is_ascii_digit() || (c == '.' && matches!(self.buf.peek2(), Some(d) if d.is_ascii_digit())) {
                return self.lex_number(start, preceded_by_ws, at_line_start, log);
            }
            if c == '"' {
                return self.lex_string(start, preceded_by_ws, at_line_start, log);
            }
            if c == '\'' {
                return self.lex_char(start, preceded_by_ws, at_line_start, log);
            }
            if let Some(tok) = self.lex_punct(start, preceded_by_ws, at_line_start) {
                return tok;
            }

            // Stray character: report and resynchronize by skipping to
            // whitespace, per spec.md §4.2.
            self.buf.bump();
            log.report(
                Report::error(format!("stray character {:?} in source", c))
                    .at(SourceRange::new(start, self.buf.current_position())),
            );
            self.skip_to_whitespace();
        }
    }

    fn make_eof(&mut self, start: SourcePosition) -> Token {
        Token {
            kind: TokenKind::Eof,
            range: SourceRange::point(start),
            lexeme: Rc::from(""),
            leading_comments: std::mem::take(&mut self.pending_comments),
            preceded_by_whitespace: true,
            at_line_start: self.at_line_start,
        }
    }

    fn finish(
        &mut self,
        kind: TokenKind,
        start: SourcePosition,
        preceded_by_ws: bool,
        at_line_start: bool,
    ) -> Token {
        let end = self.buf.current_position();
        Token {
            kind,
            range: SourceRange::new(start, end),
            lexeme: Rc::from(""),
            leading_comments: std::mem::take(&mut self.pending_comments),
            preceded_by_whitespace: preceded_by_ws,
            at_line_start,
        }
    }

    /// Skips whitespace and comments, returning whether any was skipped.
    /// Attaches captured comment text to `pending_comments` when comment
    /// preservation is on; tracks newlines crossed to update
    /// `self.at_line_start`.
    fn skip_whitespace_and_comments(&mut self, log: &mut dyn Log) -> bool {
        let mut any = false;
        loop {
            match self.buf.peek() {
                Some(c) if c == '\n' => {
                    self.buf.bump();
                    self.at_line_start = true;
                    any = true;
                }
                Some(c) if c.is_whitespace() => {
                    self.buf.bump();
                    any = true;
                }
                Some('/') if self.buf.peek2() == Some('/') => {
                    any = true;
                    let start = self.buf.current_position();
                    let mut text = String::new();
                    while let Some(c) = self.buf.peek() {
                        if c == '\n' {
                            break;
                        }
                        text.push(c);
                        self.buf.bump();
                    }
                    if self.preserve_comments {
                        self.pending_comments.push(Rc::from(text.as_str()));
                    }
                    let _ = start;
                }
                Some('/') if self.buf.peek2() == Some('*') => {
                    any = true;
                    let start = self.buf.current_position();
                    self.buf.bump();
                    self.buf.bump();
                    let mut text = String::new();
                    let mut closed = false;
                    while let Some(c) = self.buf.peek() {
                        if c == '*' && self.buf.peek2() == Some('/') {
                            self.buf.bump();
                            self.buf.bump();
                            closed = true;
                            break;
                        }
                        if c == '\n' {
                            self.at_line_start = true;
                        }
                        text.push(c);
                        self.buf.bump();
                    }
                    if !closed {
                        log.report(
                            Report::error("unterminated block comment").at(SourceRange::new(
                                start,
                                self.buf.current_position(),
                            )),
                        );
                    }
                    if self.preserve_comments {
                        self.pending_comments.push(Rc::from(text.as_str()));
                    }
                }
                _ => break,
            }
        }
        any
    }

    fn skip_to_whitespace(&mut self) {
        while let Some(c) = self.buf.peek() {
            if c.is_whitespace() {
                break;
            }
            self.buf.bump();
        }
    }

    fn lex_identifier(&mut self, start: SourcePosition, ws: bool, line_start: bool) -> Token {
        let mut text = String::new();
        while let Some(c) = self.buf.peek() {
            if is_ident_continue(c) {
                text.push(c);
                self.buf.bump();
            } else {
                break;
            }
        }
        let kind = match keywords::lookup_keyword(self.dialect, &text) {
            Some(kw) => TokenKind::Keyword(kw),
            None if text == "true" => TokenKind::Literal(Literal::Bool(true)),
            None if text == "false" => TokenKind::Literal(Literal::Bool(false)),
            None => TokenKind::Identifier(Rc::from(text.as_str())),
        };
        let mut tok = self.finish(kind, start, ws, line_start);
        tok.lexeme = Rc::from(text.as_str());
        tok
    }

    fn lex_number(
        &mut self,
        start: SourcePosition,
        ws: bool,
        line_start: bool,
        log: &mut dyn Log,
    ) -> Token {
        let mut text = String::new();
        let mut is_float = false;
        let mut is_hex = false;

        if self.buf.peek() == Some('0')
            && matches!(self.buf.peek2(), Some('x') | Some('X'))
        {
            is_hex = true;
            text.push(self.buf.bump().unwrap());
            text.push(self.buf.bump().unwrap());
            while matches!(self.buf.peek(), Some(c) if c.is_ascii_hexdigit()) {
                text.push(self.buf.bump().unwrap());
            }
        } else {
            while matches!(self.buf.peek(), Some(c) if c.is_ascii_digit()) {
                text.push(self.buf.bump().unwrap());
            }
            if self.buf.peek() == Some('.') {
                is_float = true;
                text.push(self.buf.bump().unwrap());
                while matches!(self.buf.peek(), Some(c) if c.is_ascii_digit()) {
                    text.push(self.buf.bump().unwrap());
                }
            }
            if matches!(self.buf.peek(), Some('e') | Some('E')) {
                is_float = true;
                text.push(self.buf.bump().unwrap());
                if matches!(self.buf.peek(), Some('+') | Some('-')) {
                    text.push(self.buf.bump().unwrap());
                }
                while matches!(self.buf.peek(), Some(c) if c.is_ascii_digit()) {
                    text.push(self.buf.bump().unwrap());
                }
            }
        }

        let mut suffix = NumericSuffix::None;
        match self.buf.peek() {
            Some('f') | Some('F') => {
                is_float = true;
                self.buf.bump();
                suffix = NumericSuffix::Float;
            }
            Some('h') | Some('H') if is_float => {
                self.buf.bump();
                suffix = NumericSuffix::Half;
            }
            Some('u') | Some('U') if !is_float => {
                self.buf.bump();
                suffix = NumericSuffix::Unsigned;
            }
            Some('l') | Some('L') if !is_float => {
                self.buf.bump();
                suffix = NumericSuffix::Long;
            }
            _ => {}
        }

        let range = SourceRange::new(start, self.buf.current_position());
        let literal = if is_float {
            match text.parse::<f64>() {
                Ok(v) => Literal::Float(v, suffix),
                Err(_) => {
                    log.report(
                        Report::error(format!("invalid floating-point literal '{text}'"))
                            .at(range),
                    );
                    Literal::Float(0.0, suffix)
                }
            }
        } else {
            let parsed = if is_hex {
                i64::from_str_radix(text.trim_start_matches("0x").trim_start_matches("0X"), 16)
            } else {
                text.parse::<i64>()
            };
            match parsed {
                Ok(v) => Literal::Int(v, suffix),
                Err(_) => {
                    log.report(Report::error(format!("invalid integer literal '{text}'")).at(range));
                    Literal::Int(0, suffix)
                }
            }
        };

        let mut tok = self.finish(TokenKind::Literal(literal), start, ws, line_start);
        tok.lexeme = Rc::from(text.as_str());
        tok
    }

    fn lex_string(
        &mut self,
        start: SourcePosition,
        ws: bool,
        line_start: bool,
        log: &mut dyn Log,
    ) -> Token {
        self.buf.bump();
        let mut text = String::new();
        let mut closed = false;
        while let Some(c) = self.buf.peek() {
            if c == '"' {
                self.buf.bump();
                closed = true;
                break;
            }
            if c == '\n' {
                break;
            }
            if c == '\\' {
                self.buf.bump();
                if let Some(escaped) = self.buf.bump() {
                    text.push(unescape(escaped));
                }
                continue;
            }
            text.push(c);
            self.buf.bump();
        }
        let range = SourceRange::new(start, self.buf.current_position());
        if !closed {
            log.report(Report::error("unterminated string literal").at(range));
        }
        let mut tok = self.finish(
            TokenKind::Literal(Literal::String(Rc::from(text.as_str()))),
            start,
            ws,
            line_start,
        );
        tok.lexeme = Rc::from(text.as_str());
        tok
    }

    fn lex_char(
        &mut self,
        start: SourcePosition,
        ws: bool,
        line_start: bool,
        log: &mut dyn Log,
    ) -> Token {
        self.buf.bump();
        let c = match self.buf.peek() {
            Some('\\') => {
                self.buf.bump();
                self.buf.bump().map(unescape).unwrap_or('\0')
            }
            Some(c) => {
                self.buf.bump();
                c
            }
            None => '\0',
        };
        let range_before_close = SourceRange::new(start, self.buf.current_position());
        if self.buf.peek() == Some('\'') {
            self.buf.bump();
        } else {
            log.report(Report::error("unterminated character literal").at(range_before_close));
        }
        self.finish(TokenKind::Literal(Literal::Char(c)), start, ws, line_start)
    }

    fn lex_punct(
        &mut self,
        start: SourcePosition,
        ws: bool,
        line_start: bool,
    ) -> Option<Token> {
        macro_rules! two {
            ($a:expr, $b:expr, $p:expr) => {
                if self.buf.peek() == Some($a) && self.buf.peek2() == Some($b) {
                    self.buf.bump();
                    self.buf.bump();
                    return Some(self.finish(TokenKind::Punct($p), start, ws, line_start));
                }
            };
        }
        macro_rules! one {
            ($a:expr, $p:expr) => {
                if self.buf.peek() == Some($a) {
                    self.buf.bump();
                    return Some(self.finish(TokenKind::Punct($p), start, ws, line_start));
                }
            };
        }

        two!('#', '#', Punct::HashHash);
        two!('<', '<', Punct::Shl);
        two!('>', '>', Punct::Shr);
        two!('&', '&', Punct::AndAnd);
        two!('|', '|', Punct::OrOr);
        two!('=', '=', Punct::Eq);
        two!('!', '=', Punct::Ne);
        two!('<', '=', Punct::Le);
        two!('>', '=', Punct::Ge);
        two!('+', '+', Punct::Inc);
        two!('-', '-', Punct::Dec);
        two!('+', '=', Punct::AddAssign);
        two!('-', '=', Punct::SubAssign);
        two!('*', '=', Punct::MulAssign);
        two!('/', '=', Punct::DivAssign);
        two!('%', '=', Punct::ModAssign);
        two!('&', '=', Punct::AndAssign);
        two!('|', '=', Punct::OrAssign);
        two!('^', '=', Punct::XorAssign);
        two!(':', ':', Punct::ColonColon);
        two!('-', '>', Punct::Arrow);

        one!('(', Punct::LParen);
        one!(')', Punct::RParen);
        one!('{', Punct::LBrace);
        one!('}', Punct::RBrace);
        one!('[', Punct::LBracket);
        one!(']', Punct::RBracket);
        one!(',', Punct::Comma);
        one!(';', Punct::Semi);
        one!(':', Punct::Colon);
        one!('.', Punct::Dot);
        one!('?', Punct::Question);
        one!('=', Punct::Assign);
        one!('+', Punct::Add);
        one!('-', Punct::Sub);
        one!('*', Punct::Star);
        one!('/', Punct::Slash);
        one!('%', Punct::Percent);
        one!('<', Punct::Lt);
        one!('>', Punct::Gt);
        one!('!', Punct::Not);
        one!('&', Punct::Amp);
        one!('|', Punct::Pipe);
        one!('^', Punct::Caret);
        one!('~', Punct::Tilde);
        one!('#', Punct::Hash);
        None
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::CollectingLog;
    use crate::source::SourceBuffer;

    fn lex_all(src: &str) -> (Vec<Token>, CollectingLog) {
        let mut buf = SourceBuffer::new("t.hlsl", src);
        let mut log = CollectingLog::new();
        let mut lexer = Lexer::new(&mut buf, Dialect::Hlsl);
        let mut toks = Vec::new();
        loop {
            let tok = lexer.next_token(&mut log);
            let is_eof = tok.is_eof();
            toks.push(tok);
            if is_eof {
                break;
            }
        }
        (toks, log)
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        let (toks, log) = lex_all("float main");
        assert!(!log.has_errors());
        assert!(toks[0].is_keyword("float"));
        assert_eq!(toks[0].identifier(), None);
        assert_eq!(toks[1].identifier(), Some("main"));
    }

    #[test]
    fn distinguishes_float4_identifier_from_float_keyword() {
        let (toks, _) = lex_all("float4");
        assert_eq!(toks[0].identifier(), Some("float4"));
    }

    #[test]
    fn lexes_directive_marker_at_line_start_only() {
        let (toks, _) = lex_all("#define X\n1 # 2");
        assert!(matches!(toks[0].kind, TokenKind::Directive));
        // the second '#' is mid-line, so it lexes as a Hash punct, not a
        // directive marker.
        let hash_tok = toks.iter().find(|t| t.is_punct(Punct::Hash));
        assert!(hash_tok.is_some());
    }

    #[test]
    fn lexes_numeric_suffixes() {
        let (toks, _) = lex_all("1.0f 2u 3");
        assert_eq!(
            toks[0].kind,
            TokenKind::Literal(Literal::Float(1.0, NumericSuffix::Float))
        );
        assert_eq!(
            toks[1].kind,
            TokenKind::Literal(Literal::Int(2, NumericSuffix::Unsigned))
        );
        assert_eq!(
            toks[2].kind,
            TokenKind::Literal(Literal::Int(3, NumericSuffix::None))
        );
    }

    #[test]
    fn reports_unterminated_string() {
        let (_, log) = lex_all("\"abc");
        assert!(log.has_errors());
    }

    #[test]
    fn reports_stray_character_and_resyncs() {
        let (toks, log) = lex_all("$ x");
        assert!(log.has_errors());
        assert_eq!(toks[0].identifier(), Some("x"));
    }
}
