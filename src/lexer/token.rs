//! Token kinds and the `Token` value produced by the lexer.

use std::rc::Rc;

use crate::source::SourceRange;

/// A numeric literal's suffix, carried through to codegen so e.g. `1.0f` vs.
/// `1.0` round-trips for HLSL re-emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericSuffix {
    None,
    Unsigned,
    Float,
    Half,
    Long,
}

/// The payload carried by literal tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64, NumericSuffix),
    Float(f64, NumericSuffix),
    Bool(bool),
    String(Rc<str>),
    Char(char),
}

/// Operators and punctuation. Grouped roughly by the grammar productions
/// that consume them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semi,
    Colon,
    ColonColon,
    Dot,
    Question,
    Arrow,

    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,

    Add,
    Sub,
    Star,
    Slash,
    Percent,
    Inc,
    Dec,

    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,

    AndAnd,
    OrOr,
    Not,

    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,

    Hash,
    HashHash,
}

/// The kind of a lexical token. `Directive` is emitted only for the leading
/// `#` of a preprocessor line; everything after it lexes as ordinary tokens
/// that the preprocessor itself interprets.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Identifier(Rc<str>),
    Keyword(&'static str),
    Literal(Literal),
    Punct(Punct),
    /// A `#` at the start of a logical line, signalling a directive to the
    /// preprocessor's directive loop.
    Directive,
    /// Emitted once at end of input so consumers don't need to special-case
    /// `Option::None` deep inside lookahead logic.
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: SourceRange,
    /// The exact source text of the token, kept for diagnostics and for
    /// `preserveComments`/HLSL re-emission round-tripping.
    pub lexeme: Rc<str>,
    /// Line comments and block comments immediately preceding this token,
    /// captured when comment preservation is enabled.
    pub leading_comments: Vec<Rc<str>>,
    /// True if whitespace (including none, at start of file) separates this
    /// token from the previous one on the same logical line — needed by the
    /// `#`/`##` stringize and paste operators, which are whitespace-sensitive
    /// only in that they must not introduce accidental token pasting.
    pub preceded_by_whitespace: bool,
    /// True if this is the first token of its logical source line, which is
    /// how the preprocessor recognizes a directive line.
    pub at_line_start: bool,
}

impl Token {
    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_punct(&self, p: Punct) -> bool {
        matches!(&self.kind, TokenKind::Punct(k) if *k == p)
    }

    pub fn is_keyword(&self, kw: &str) -> bool {
        matches!(&self.kind, TokenKind::Keyword(k) if *k == kw)
    }

    pub fn identifier(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}
