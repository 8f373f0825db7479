//! `SyntaxError`: the parser's error type, plus the synchronized-region
//! recovery policy described in `spec.md` §4.4.

use crate::lexer::Token;
use crate::source::SourceRange;

#[derive(Debug, Clone)]
pub struct SyntaxError {
    pub message: String,
    pub range: SourceRange,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, range: SourceRange) -> Self {
        Self {
            message: message.into(),
            range,
        }
    }

    pub fn expected(what: &str, found: &Token) -> Self {
        Self {
            message: format!("expected {what}, found '{}'", found.lexeme),
            range: found.range,
        }
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SyntaxError {}
