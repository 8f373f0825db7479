//! Dialect-parameterized keyword tables.
//!
//! Small fixed tables (well under 200 entries) are looked up with a linear
//! scan rather than pulling in a perfect-hash crate — the same call the
//! teacher's own tokenizer makes for its (smaller) keyword set.

/// Which input dialect a [`crate::lexer::Lexer`] is tokenizing. Only HLSL
/// exists today; the enum exists so a second dialect is a variant add, not a
/// lexer rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Hlsl,
}

/// HLSL reserved words recognized by the lexer. Type names (`float4`,
/// `Texture2D`, ...) are deliberately *not* here: the parser treats them as
/// ordinary identifiers looked up against its "known type names" set (see
/// `spec.md` §4.4), since a user `struct` can also introduce a type name.
const HLSL_KEYWORDS: &[&str] = &[
    "void", "bool", "int", "uint", "dword", "half", "float", "double",
    "true", "false",
    "if", "else", "for", "while", "do", "switch", "case", "default", "break",
    "continue", "return", "discard",
    "struct", "cbuffer", "tbuffer", "typedef", "namespace",
    "const", "static", "extern", "uniform", "volatile", "inline",
    "in", "out", "inout",
    "row_major", "column_major",
    "packoffset", "register",
    "linear", "centroid", "nointerpolation", "noperspective", "sample",
    "precise", "groupshared",
    "RWBuffer", "RWTexture1D", "RWTexture2D", "RWTexture3D",
    "RWStructuredBuffer", "AppendStructuredBuffer", "ConsumeStructuredBuffer",
];

/// Returns the canonical static `&str` for `name` if it is a reserved word in
/// `dialect`, else `None`.
pub fn lookup_keyword(dialect: Dialect, name: &str) -> Option<&'static str> {
    let table = match dialect {
        Dialect::Hlsl => HLSL_KEYWORDS,
    };
    table.iter().find(|&&kw| kw == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_known_keyword() {
        assert_eq!(lookup_keyword(Dialect::Hlsl, "return"), Some("return"));
    }

    #[test]
    fn type_names_are_not_keywords() {
        assert_eq!(lookup_keyword(Dialect::Hlsl, "float4"), None);
        assert_eq!(lookup_keyword(Dialect::Hlsl, "Texture2D"), None);
    }

    #[test]
    fn unknown_identifier_is_not_a_keyword() {
        assert_eq!(lookup_keyword(Dialect::Hlsl, "myVariable"), None);
    }
}
