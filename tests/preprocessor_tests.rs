//! Directive loop and macro expansion, driven through the public
//! `Preprocessor` entry point rather than internal helpers.

use shaderxc::diagnostics::CollectingLog;
use shaderxc::preprocessor::{FsIncludeHandler, MemoryIncludeHandler, Preprocessor};

fn preprocess(src: &str) -> (Vec<shaderxc::lexer::Token>, CollectingLog) {
    let mut handler = MemoryIncludeHandler::new();
    let mut log = CollectingLog::new();
    let pp = Preprocessor::new("t.hlsl", src.to_string(), &mut handler, Vec::new(), 64);
    let result = pp.run(&mut log);
    (result.tokens, log)
}

fn render(tokens: &[shaderxc::lexer::Token]) -> String {
    tokens.iter().map(|t| t.lexeme.to_string()).collect::<Vec<_>>().join(" ")
}

#[test]
fn object_like_macro_expands_in_place() {
    let (tokens, log) = preprocess("#define WIDTH 1920\nint w = WIDTH;\n");
    assert!(!log.has_errors());
    assert!(render(&tokens).contains("w = 1920"));
}

#[test]
fn function_like_macro_substitutes_arguments() {
    let (tokens, log) = preprocess("#define ADD(a, b) ((a) + (b))\nADD(1, 2)\n");
    assert!(!log.has_errors());
    assert_eq!(render(&tokens), "( ( 1 ) + ( 2 ) )");
}

#[test]
fn self_referential_macro_does_not_infinitely_recurse() {
    // blue-paint guard: a macro that expands to itself must stop after one
    // substitution rather than looping forever.
    let (tokens, log) = preprocess("#define X X + 1\nX\n");
    assert!(!log.has_errors());
    assert_eq!(render(&tokens), "X + 1");
}

#[test]
fn stringize_operator_produces_a_string_literal_token() {
    use shaderxc::lexer::{Literal, TokenKind};
    let (tokens, log) = preprocess("#define STR(x) #x\nSTR(hello)\n");
    assert!(!log.has_errors());
    assert_eq!(tokens.len(), 1);
    assert!(matches!(&tokens[0].kind, TokenKind::Literal(Literal::String(s)) if s.as_ref() == "hello"));
}

#[test]
fn paste_operator_joins_adjacent_tokens() {
    let (tokens, log) = preprocess("#define CAT(a, b) a ## b\nCAT(fo, o)\n");
    assert!(!log.has_errors());
    assert_eq!(render(&tokens), "foo");
}

#[test]
fn conditional_compilation_excludes_inactive_branch() {
    let (tokens, log) = preprocess("#define FLAG\n#ifdef FLAG\nint a;\n#else\nint b;\n#endif\n");
    assert!(!log.has_errors());
    let rendered = render(&tokens);
    assert!(rendered.contains("int a"));
    assert!(!rendered.contains("int b"));
}

#[test]
fn undef_removes_a_macro_definition() {
    let (_, log) = preprocess("#define X 1\n#undef X\n#ifdef X\n#error should not expand\n#endif\n");
    assert!(!log.has_errors());
}

#[test]
fn include_directive_splices_in_referenced_source() {
    let mut handler = MemoryIncludeHandler::new();
    handler.add("common.hlsli", "static const float PI = 3.0;\n");
    let mut log = CollectingLog::new();
    let pp = Preprocessor::new(
        "main.hlsl",
        "#include \"common.hlsli\"\nfloat x = PI;\n".to_string(),
        &mut handler,
        Vec::new(),
        64,
    );
    let result = pp.run(&mut log);
    assert!(!log.has_errors());
    assert!(render(&result.tokens).contains("PI"));
}

#[test]
fn search_paths_are_consulted_for_unqualified_includes() {
    // `-I`/`ShaderInput.search_paths`: an include not found next to the
    // including file (which has no directory here) must still resolve
    // through an explicit search path.
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("extra.hlsli"), "int from_extra;\n").unwrap();

    let mut handler = FsIncludeHandler::new(None);
    let mut log = CollectingLog::new();
    let pp = Preprocessor::new(
        "main.hlsl",
        "#include \"extra.hlsli\"\n".to_string(),
        &mut handler,
        vec![dir.path().to_path_buf()],
        64,
    );
    let result = pp.run(&mut log);
    assert!(!log.has_errors());
    assert!(render(&result.tokens).contains("from_extra"));
}

#[test]
fn missing_include_is_reported_as_an_error() {
    let mut handler = MemoryIncludeHandler::new();
    let mut log = CollectingLog::new();
    let pp = Preprocessor::new(
        "main.hlsl",
        "#include \"does_not_exist.hlsli\"\n".to_string(),
        &mut handler,
        Vec::new(),
        64,
    );
    pp.run(&mut log);
    assert!(log.has_errors());
}

#[test]
fn pragma_once_prevents_double_inclusion() {
    let mut handler = MemoryIncludeHandler::new();
    handler.add("once.hlsli", "#pragma once\nint shared_val;\n");
    let mut log = CollectingLog::new();
    let pp = Preprocessor::new(
        "main.hlsl",
        "#include \"once.hlsli\"\n#include \"once.hlsli\"\n".to_string(),
        &mut handler,
        Vec::new(),
        64,
    );
    let result = pp.run(&mut log);
    assert!(!log.has_errors());
    let count = result.tokens.iter().filter(|t| t.identifier() == Some("shared_val")).count();
    assert_eq!(count, 1);
}

#[test]
fn error_directive_in_active_branch_is_fatal() {
    let (_, log) = preprocess("#error something went wrong\n");
    assert!(log.has_errors());
}

#[test]
fn warning_directive_does_not_count_as_an_error() {
    let (_, log) = preprocess("#warning heads up\n");
    assert!(!log.has_errors());
}
