//! Code generation, per `spec.md` §4.8: "a pluggable code generator walks
//! the transformed AST and emits target-dialect source text." Realized as a
//! `CodeGenerator` trait with one implementation per target family, so the
//! plurality is literal rather than aspirational (`SPEC_FULL.md` §4.8).

pub mod glsl;
pub mod hlsl;
pub mod writer;

pub use glsl::GlslGenerator;
pub use hlsl::HlslGenerator;

use crate::api::{Extensions, ShaderOutput, ShaderVersion};
use crate::ast::Program;

/// Emits one complete target-dialect translation unit from an already
/// analyzed and transformed `program`. Implementations never fail: anything
/// that would be a generation-time error (an unresolved reference, a type
/// the target cannot express) is caught earlier, by `semantic::legality` or
/// by the transform passes that make the AST generator-ready.
pub trait CodeGenerator {
    fn generate(&self, program: &Program, output: &ShaderOutput, extensions: Extensions) -> String;
}

/// Selects the generator matching `version`, per `spec.md` §4.8's per-target
/// dispatch. GLSL, ESSL, and VKSL share one generator (`GlslGenerator`) that
/// differs only in header line and capability flags; HLSL re-emission gets
/// its own generator since its declaration and IO conventions differ enough
/// that sharing logic would mean more branching than code reuse.
pub fn generator_for(version: ShaderVersion) -> Box<dyn CodeGenerator> {
    match version {
        ShaderVersion::Hlsl5 => Box::new(HlslGenerator),
        ShaderVersion::Glsl450 | ShaderVersion::Essl310 | ShaderVersion::Vksl450 => {
            Box::new(GlslGenerator)
        }
    }
}
