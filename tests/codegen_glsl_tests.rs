//! `GlslGenerator` emission tests, per `spec.md` §4.8: numeric literal
//! formatting, reachability-gated declaration emission, and version-specific
//! header/precision output, driven from source through the full analysis +
//! transform pipeline and then `GlslGenerator::generate` directly.

use shaderxc::api::{Extensions, NameMangling, ShaderOutput, ShaderTarget, ShaderVersion};
use shaderxc::codegen::{generator_for, CodeGenerator};
use shaderxc::diagnostics::CollectingLog;
use shaderxc::parser::Parser;
use shaderxc::preprocessor::{MemoryIncludeHandler, Preprocessor};
use shaderxc::semantic::{analyze, AnalysisRequest};
use shaderxc::transform;

fn generate(src: &str, entry: &str, target: ShaderTarget, version: ShaderVersion) -> (String, CollectingLog, bool) {
    let mut log = CollectingLog::new();
    let mut handler = MemoryIncludeHandler::new();
    let pp = Preprocessor::new("t.hlsl", src.to_string(), &mut handler, Vec::new(), 64);
    let pp_result = pp.run(&mut log);
    let parser = Parser::new(pp_result.tokens);
    let mut program = parser.parse(&mut log);
    let request = AnalysisRequest {
        entry_point: entry,
        secondary_entry_point: None,
        target,
        version,
    };
    let ok = analyze(&mut program, &request, &mut log);
    if !ok {
        return (String::new(), log, false);
    }
    transform::run(&mut program, &NameMangling::default());
    let generator = generator_for(version);
    let output = ShaderOutput::new(version);
    let source = generator.generate(&program, &output, Extensions::empty());
    (source, log, true)
}

/// S1: whole-number float literals carry both a decimal point and the `f`
/// suffix in the GLSL family (`spec.md` §4.8).
#[test]
fn whole_number_float_literals_get_decimal_point_and_f_suffix() {
    let (source, log, ok) = generate(
        "float4 main() : SV_Target { return float4(1,0,0,1); }",
        "main",
        ShaderTarget::Fragment,
        ShaderVersion::Glsl450,
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert!(source.contains("1.0f"), "expected '1.0f' in:\n{source}");
    assert!(source.contains("0.0f"), "expected '0.0f' in:\n{source}");
}

/// Fractional float literals also carry the `f` suffix, not just whole
/// numbers.
#[test]
fn fractional_float_literal_gets_f_suffix() {
    let (source, log, ok) = generate(
        "float4 main() : SV_Target { return float4(0.5,0,0,1); }",
        "main",
        ShaderTarget::Fragment,
        ShaderVersion::Glsl450,
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert!(source.contains("0.5f"), "expected '0.5f' in:\n{source}");
}

/// Unsigned integer literals carry the `u` suffix.
#[test]
fn unsigned_integer_literal_gets_u_suffix() {
    let (source, log, ok) = generate(
        "uint g = 3u;\nfloat4 main() : SV_Target { return float4(float(g),0,0,1); }",
        "main",
        ShaderTarget::Fragment,
        ShaderVersion::Glsl450,
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert!(source.contains("3u"), "expected '3u' in:\n{source}");
}

/// GLSL 450 gets a `#version 450 core` header with no precision preamble.
#[test]
fn glsl450_header_has_no_precision_preamble() {
    let (source, log, ok) = generate(
        "float4 main() : SV_Target { return float4(0,0,0,1); }",
        "main",
        ShaderTarget::Fragment,
        ShaderVersion::Glsl450,
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert!(source.starts_with("#version 450 core"));
    assert!(!source.contains("precision highp"));
}

/// ESSL 3.10 gets a `#version 310 es` header and a default-precision
/// preamble for `float`/`int`, per `spec.md` §4.8.
#[test]
fn essl310_header_has_precision_preamble() {
    let (source, log, ok) = generate(
        "float4 main() : SV_Target { return float4(0,0,0,1); }",
        "main",
        ShaderTarget::Fragment,
        ShaderVersion::Essl310,
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert!(source.starts_with("#version 310 es"));
    assert!(source.contains("precision highp float;"));
    assert!(source.contains("precision highp int;"));
}

/// Reachability gates declaration-level emission: an unreferenced global
/// variable never appears in the emitted text.
#[test]
fn unreferenced_global_is_not_emitted() {
    let (source, log, ok) = generate(
        "float unused_global = 7.0;\nfloat4 main() : SV_Target { return float4(0,0,0,1); }",
        "main",
        ShaderTarget::Fragment,
        ShaderVersion::Glsl450,
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert!(!source.contains("unused_global"));
}

/// A reachable `cbuffer` is emitted as a `uniform` block (regression
/// coverage for the reachability-gated cbuffer emission fix).
#[test]
fn reachable_cbuffer_emits_uniform_block() {
    let (source, log, ok) = generate(
        "cbuffer C { float4 x; };\nfloat4 main() : SV_Target { return x; }",
        "main",
        ShaderTarget::Fragment,
        ShaderVersion::Glsl450,
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert!(source.contains("uniform"), "expected a uniform block in:\n{source}");
    assert!(source.contains('C'), "expected cbuffer name 'C' in:\n{source}");
}
