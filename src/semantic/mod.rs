//! Semantic analysis, per `spec.md` §4.6: binding, type computation, entry
//! point processing, control-flow completeness, and target-version
//! legality, run in that order over one parsed [`Program`].

pub mod binding;
pub mod control_flow;
pub mod entry_point;
pub mod legality;
pub mod overload;
pub mod types;

use crate::api::{ShaderTarget, ShaderVersion};
use crate::ast::Program;
use crate::diagnostics::Log;
use crate::symbol_table::SymbolTable;

pub use entry_point::EntryPointRequest;

/// Everything `analyze` needs beyond the parsed program, gathered from the
/// input/output descriptors so this module has no dependency on the
/// pipeline that drives it.
pub struct AnalysisRequest<'a> {
    pub entry_point: &'a str,
    pub secondary_entry_point: Option<&'a str>,
    pub target: ShaderTarget,
    pub version: ShaderVersion,
}

/// Runs every analysis pass over `program`, reporting diagnostics to `log`
/// rather than stopping at the first failure (`spec.md` §4.6: "the analyzer
/// still attempts to continue so that multiple errors are reported per
/// run"). Returns `true` iff no error-severity diagnostic was reported.
pub fn analyze(program: &mut Program, request: &AnalysisRequest, log: &mut dyn Log) -> bool {
    let mut symbols = SymbolTable::new();

    binding::register_globals(program, &mut symbols, log);
    binding::synthesize_cbuffer_members(program, &mut symbols, log);
    binding::bind_program(program, &mut symbols, log);

    let entry_request = EntryPointRequest {
        entry_point: request.entry_point,
        secondary_entry_point: request.secondary_entry_point,
        target: request.target,
        version: request.version,
    };
    entry_point::process(program, &entry_request, log);

    control_flow::compute_all(program);
    legality::check(program, request.version, log);

    !log.has_errors()
}
