//! Recursive-descent parser tests, driven end to end from source text
//! through `Preprocessor` + `Parser::parse`, the same way the CLI drives
//! them (`spec.md` §4.4).

use shaderxc::ast::DeclKind;
use shaderxc::diagnostics::CollectingLog;
use shaderxc::lexer::Dialect;
use shaderxc::parser::Parser;
use shaderxc::preprocessor::{MemoryIncludeHandler, Preprocessor};
use shaderxc::pipeline::lex_only;

fn parse(src: &str) -> (shaderxc::ast::Program, CollectingLog) {
    let mut log = CollectingLog::new();
    let mut handler = MemoryIncludeHandler::new();
    let pp = Preprocessor::new("t.hlsl", src.to_string(), &mut handler, Vec::new(), 64);
    let result = pp.run(&mut log);
    let parser = Parser::new(result.tokens);
    let program = parser.parse(&mut log);
    (program, log)
}

#[test]
fn struct_declaration_with_semantics_parses() {
    let (program, log) = parse(
        "struct VSOutput { float4 position : SV_POSITION; float2 uv : TEXCOORD0; };",
    );
    assert!(!log.has_errors());
    assert_eq!(program.globals.len(), 1);
    let DeclKind::Struct(s) = &program.decl(program.globals[0]).kind else {
        panic!("expected a struct declaration");
    };
    assert_eq!(s.name.as_ref(), "VSOutput");
    assert_eq!(s.fields.len(), 2);
    assert_eq!(s.fields[0].name.as_ref(), "position");
    assert_eq!(s.fields[0].decorators.semantic.as_ref().unwrap().name.as_ref(), "SV_POSITION");
    assert_eq!(s.fields[1].decorators.semantic.as_ref().unwrap().name.as_ref(), "TEXCOORD0");
}

#[test]
fn function_declaration_with_return_semantic_parses() {
    let (program, log) = parse("float4 main() : SV_Target { return float4(1.0, 0.0, 0.0, 1.0); }");
    assert!(!log.has_errors());
    assert_eq!(program.globals.len(), 1);
    let f = program.decl(program.globals[0]).as_function().expect("function decl");
    assert_eq!(f.name.as_ref(), "main");
    assert_eq!(f.return_semantic.as_ref().unwrap().name.as_ref(), "SV_Target");
    assert!(f.body.is_some());
}

#[test]
fn cbuffer_with_register_binding_parses() {
    let (program, log) = parse("cbuffer Globals : register(b0) { float4x4 worldViewProj; float time; };");
    assert!(!log.has_errors());
    assert_eq!(program.globals.len(), 1);
    let DeclKind::UniformBuffer(cb) = &program.decl(program.globals[0]).kind else {
        panic!("expected a cbuffer declaration");
    };
    assert_eq!(cb.name.as_ref(), "Globals");
    assert_eq!(cb.members.len(), 2);
    assert_eq!(cb.decorators.register.as_ref().unwrap().register_class, 'b');
    assert_eq!(cb.decorators.register.as_ref().unwrap().slot, 0);
}

#[test]
fn texture_and_sampler_declarations_with_registers_parse() {
    let (program, log) = parse("Texture2D albedo : register(t0);\nSamplerState samp : register(s0);\n");
    assert!(!log.has_errors());
    assert_eq!(program.globals.len(), 2);
    assert!(matches!(program.decl(program.globals[0]).kind, DeclKind::Buffer(_)));
    assert!(matches!(program.decl(program.globals[1]).kind, DeclKind::Sampler(_)));
}

#[test]
fn numthreads_attribute_is_parsed_as_an_annotation() {
    let (program, log) = parse(
        "[numthreads(8, 8, 1)]\nvoid main(uint3 id : SV_DispatchThreadID) {}",
    );
    assert!(!log.has_errors());
    let f = program.decl(program.globals[0]).as_function().expect("function decl");
    assert_eq!(f.annotations.len(), 1);
    assert_eq!(f.annotations[0].name.as_ref(), "numthreads");
    assert_eq!(f.annotations[0].args.len(), 3);
}

#[test]
fn comma_separated_declarator_list_produces_sibling_globals() {
    let (program, log) = parse("float a, b, c;");
    assert!(!log.has_errors());
    assert_eq!(program.globals.len(), 3);
    for id in &program.globals {
        assert!(matches!(program.decl(*id).kind, DeclKind::Variable(_)));
    }
}

#[test]
fn unterminated_block_does_not_produce_an_infinite_loop() {
    // A dangling opening brace with no matching close must still terminate
    // parsing (with a reported syntax error) rather than hang.
    let (_, log) = parse("void main() { ");
    assert!(log.has_errors());
}

#[test]
fn missing_semicolon_after_declaration_is_a_syntax_error() {
    let (_, log) = parse("float x\nfloat y;");
    assert!(log.has_errors());
}

#[test]
fn angle_bracket_generic_on_a_buffer_type_is_not_confused_with_less_than() {
    let (program, log) = parse("Texture2D<float4> tex : register(t0);");
    assert!(!log.has_errors());
    assert_eq!(program.globals.len(), 1);
    assert!(matches!(program.decl(program.globals[0]).kind, DeclKind::Buffer(_)));
}

#[test]
fn lexer_can_be_driven_standalone_without_a_preprocessor() {
    let mut log = CollectingLog::new();
    let tokens = lex_only("float4 main() : SV_Target { return 0; }", Dialect::Hlsl, &mut log);
    assert!(!log.has_errors());
    assert!(!tokens.is_empty());
}
