//! Reflection extractor tests, per `spec.md` §4.9, driven end to end
//! through the public `compile_shader` API so the reflection data reflects
//! real parsed-and-analyzed declarations rather than hand-built AST nodes.

use shaderxc::api::{Options, ShaderInput, ShaderOutput, ShaderTarget, ShaderVersion};
use shaderxc::diagnostics::CollectingLog;
use shaderxc::preprocessor::MemoryIncludeHandler;
use shaderxc::reflection::ReflectionData;
use shaderxc::compile_shader;

fn reflect(src: &str, entry: &str, target: ShaderTarget, options: Options) -> (bool, CollectingLog, ReflectionData) {
    let mut handler = MemoryIncludeHandler::new();
    let mut input = ShaderInput::new("t.hlsl", entry, target, src, &mut handler);
    let mut output = ShaderOutput::new(ShaderVersion::Glsl450);
    output.options = options;
    let mut log = CollectingLog::new();
    let mut reflection = ReflectionData::new();
    let ok = compile_shader(&mut input, &mut output, Some(&mut log), Some(&mut reflection));
    (ok, log, reflection)
}

/// S4: a `cbuffer` feeding the entry point reflects as one constant-buffer
/// binding carrying its member name.
#[test]
fn cbuffer_feeding_entry_point_is_reflected() {
    let (ok, log, reflection) = reflect(
        "cbuffer C { float4 x; };\nfloat4 main() : SV_Target { return x; }",
        "main",
        ShaderTarget::Fragment,
        Options::default(),
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert_eq!(reflection.constant_buffers.len(), 1);
    assert_eq!(reflection.constant_buffers[0].name.as_ref(), "C");
    assert_eq!(reflection.constant_buffers[0].members.len(), 1);
    assert_eq!(reflection.constant_buffers[0].members[0].as_ref(), "x");
}

/// A texture and sampler reachable from the entry point are reflected as
/// bindings, each with the explicit `register()` slot it was declared with.
#[test]
fn explicit_register_slots_are_reflected_on_texture_and_sampler() {
    let (ok, log, reflection) = reflect(
        "Texture2D albedo : register(t2);\nSamplerState samp : register(s1);\nfloat4 main() : SV_Target { return albedo.Sample(samp, float2(0,0)); }",
        "main",
        ShaderTarget::Fragment,
        Options::default(),
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert_eq!(reflection.textures.len(), 1);
    assert_eq!(reflection.textures[0].name.as_ref(), "albedo");
    assert_eq!(reflection.textures[0].location, Some(2));
    assert_eq!(reflection.samplers.len(), 1);
    assert_eq!(reflection.samplers[0].name.as_ref(), "samp");
    assert_eq!(reflection.samplers[0].location, Some(1));
}

/// S6/`autoBinding`: a reachable texture with no explicit `register()` gets
/// a sequentially assigned slot once `autoBinding` is on.
#[test]
fn auto_binding_assigns_a_slot_to_unregistered_texture() {
    let mut options = Options::default();
    options.auto_binding = true;
    let (ok, log, reflection) = reflect(
        "Texture2D albedo;\nSamplerState samp;\nfloat4 main() : SV_Target { return albedo.Sample(samp, float2(0,0)); }",
        "main",
        ShaderTarget::Fragment,
        options,
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert_eq!(reflection.textures[0].location, Some(0));
}

/// Without `autoBinding`, an unregistered reachable binding is reflected
/// with no location rather than being silently assigned one.
#[test]
fn no_auto_binding_leaves_location_unset() {
    let (ok, log, reflection) = reflect(
        "Texture2D albedo;\nSamplerState samp;\nfloat4 main() : SV_Target { return albedo.Sample(samp, float2(0,0)); }",
        "main",
        ShaderTarget::Fragment,
        Options::default(),
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert_eq!(reflection.textures[0].location, None);
}

/// A fragment entry point's `SV_Target` return semantic reflects as one
/// fragment-target binding; reflection for a non-fragment target never
/// populates `fragment_targets`.
#[test]
fn fragment_target_is_reflected_only_for_fragment_stage() {
    let (ok, log, reflection) = reflect(
        "float4 main() : SV_Target { return float4(0,0,0,1); }",
        "main",
        ShaderTarget::Fragment,
        Options::default(),
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert_eq!(reflection.fragment_targets.len(), 1);

    let (ok, log, reflection) = reflect(
        "float4 main() : POSITION { return float4(0,0,0,1); }",
        "main",
        ShaderTarget::Vertex,
        Options::default(),
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert!(reflection.fragment_targets.is_empty());
}

/// A declaration never referenced from the entry point is excluded from
/// reflection entirely, matching the reachability gate used by codegen.
#[test]
fn unreferenced_cbuffer_is_excluded_from_reflection() {
    let (ok, log, reflection) = reflect(
        "cbuffer Unused { float4 y; };\nfloat4 main() : SV_Target { return float4(0,0,0,1); }",
        "main",
        ShaderTarget::Fragment,
        Options::default(),
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert!(reflection.constant_buffers.is_empty());
}

/// Macros defined anywhere during preprocessing are reported regardless of
/// whether anything they expand to ends up reachable (`spec.md` §4.9).
#[test]
fn defined_macros_are_reflected() {
    let (ok, log, reflection) = reflect(
        "#define UNUSED_MACRO 1\nfloat4 main() : SV_Target { return float4(0,0,0,1); }",
        "main",
        ShaderTarget::Fragment,
        Options::default(),
    );
    assert!(ok, "compile failed: {:?}", log.reports());
    assert!(reflection.macros.iter().any(|m| m.name.as_ref() == "UNUSED_MACRO"));
}
