//! AST transformer tests, per `spec.md` §4.7: the reference analyzer,
//! struct-parameter analyzer, function-name mangler, and expression/type
//! converters, run in order after a successful `semantic::analyze`.

use shaderxc::api::{NameMangling, ShaderTarget, ShaderVersion};
use shaderxc::ast::{DeclKind, NodeFlags, Program};
use shaderxc::diagnostics::CollectingLog;
use shaderxc::parser::Parser;
use shaderxc::preprocessor::{MemoryIncludeHandler, Preprocessor};
use shaderxc::semantic::{analyze, AnalysisRequest};
use shaderxc::transform;

fn transformed(src: &str, entry: &str, target: ShaderTarget) -> (Program, CollectingLog, bool) {
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
        version: ShaderVersion::Glsl450,
    };
    let ok = analyze(&mut program, &request, &mut log);
    if ok {
        transform::run(&mut program, &NameMangling::default());
    }
    (program, log, ok)
}

/// Testable property 6: an unreferenced function never gets marked
/// reachable by `ReferenceAnalyzer`.
#[test]
fn reference_analyzer_skips_unused_helper() {
    let (program, log, ok) = transformed(
        "float unused(float x) { return x * 2.0; }\nfloat4 main() : SV_Target { return float4(1,1,1,1); }",
        "main",
        ShaderTarget::Fragment,
    );
    assert!(ok, "analysis failed: {:?}", log.reports());
    let unused_id = program.find_global_by_name("unused").expect("function 'unused' registered");
    assert!(!program.decl(unused_id).flags.contains(NodeFlags::REACHABLE));
}

/// Regression test for the cbuffer-reachability bug: a `cbuffer` member
/// referenced from the entry point must mark the *owning* `UniformBuffer`
/// declaration reachable too, not just the synthesized member variable,
/// since reflection and codegen gate on the `UniformBuffer`'s own flag
/// (`spec.md` §8 S4).
#[test]
fn reachable_cbuffer_member_marks_owning_uniform_buffer_reachable() {
    let (program, log, ok) = transformed(
        "cbuffer C { float4 x; };\nfloat4 main() : SV_Target { return x; }",
        "main",
        ShaderTarget::Fragment,
    );
    assert!(ok, "analysis failed: {:?}", log.reports());
    let cbuffer_id = program.find_global_by_name("C").expect("cbuffer 'C' registered");
    assert!(
        program.decl(cbuffer_id).flags.contains(NodeFlags::REACHABLE),
        "owning UniformBuffer decl for 'C' must be reachable when its member 'x' is referenced"
    );
}

/// A `cbuffer` whose members are never referenced stays unreachable and is
/// skipped during emission, symmetric with the ordinary-declaration case.
#[test]
fn unreferenced_cbuffer_stays_unreachable() {
    let (program, log, ok) = transformed(
        "cbuffer Unused { float4 y; };\nfloat4 main() : SV_Target { return float4(0,0,0,1); }",
        "main",
        ShaderTarget::Fragment,
    );
    assert!(ok, "analysis failed: {:?}", log.reports());
    let cbuffer_id = program.find_global_by_name("Unused").expect("cbuffer 'Unused' registered");
    assert!(!program.decl(cbuffer_id).flags.contains(NodeFlags::REACHABLE));
}

/// S3: `FuncNameConverter` gives the two `f` overloads distinct emitted
/// names once name mangling has run.
#[test]
fn overloaded_function_names_are_mangled_distinctly() {
    let (program, log, ok) = transformed(
        "float f(float x) { return x; }\nfloat f(int x) { return float(x); }\nfloat4 main() : SV_Target { return float4(f(1),0,0,1); }",
        "main",
        ShaderTarget::Fragment,
    );
    assert!(ok, "analysis failed: {:?}", log.reports());
    let overloads: Vec<_> = program
        .all_functions()
        .filter(|(_, f)| f.name.as_ref() == "f")
        .map(|(_, f)| f.mangled_name.clone().expect("mangled name assigned"))
        .collect();
    assert_eq!(overloads.len(), 2);
    assert_ne!(overloads[0], overloads[1]);
}

/// A single, non-overloaded function keeps its source name (no numeric
/// suffix needed since there is nothing to disambiguate from).
#[test]
fn non_overloaded_function_keeps_its_source_name() {
    let (program, log, ok) = transformed(
        "float helper(float x) { return x + 1.0; }\nfloat4 main() : SV_Target { return float4(helper(1.0),0,0,1); }",
        "main",
        ShaderTarget::Fragment,
    );
    assert!(ok, "analysis failed: {:?}", log.reports());
    let (_, helper) = program.all_functions().find(|(_, f)| f.name.as_ref() == "helper").expect("helper found");
    assert_eq!(helper.mangled_name.as_deref(), Some("helper"));
}

/// `ExprConverter`: HLSL's `mul(a, b)` call survives analysis unresolved
/// (it is a dialect intrinsic, not a user overload) and is rewritten away
/// by `convert_mul_calls` before emission.
#[test]
fn mul_intrinsic_call_is_rewritten_away() {
    let (program, log, ok) = transformed(
        "float4x4 m;\nfloat4 v;\nfloat4 main() : SV_Target { return mul(m, v); }",
        "main",
        ShaderTarget::Fragment,
    );
    assert!(ok, "analysis failed: {:?}", log.reports());
    let entry = program.effective_entry_point().expect("entry point resolved");
    let DeclKind::Function(f) = &program.decl(entry).kind else {
        panic!("expected a function decl");
    };
    let body = f.body.expect("entry point has a body");
    assert!(!body_contains_mul_call(&program, body));
}

fn body_contains_mul_call(program: &Program, id: shaderxc::ast::StmtId) -> bool {
    use shaderxc::ast::{ExprKind, StmtKind};
    fn expr_has_mul(program: &Program, id: shaderxc::ast::ExprId) -> bool {
        matches!(
            &program.expr(id).kind,
            ExprKind::Call { callee, .. } if callee.as_ref() == "mul"
        )
    }
    match &program.stmt(id).kind {
        StmtKind::CodeBlock(stmts) => stmts.iter().any(|&s| body_contains_mul_call(program, s)),
        StmtKind::Return(Some(e)) => expr_has_mul(program, *e),
        _ => false,
    }
}
