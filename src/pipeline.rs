//! Stage orchestration: the single place that drives preprocess → parse →
//! analyze → transform → (generate | validate) → (reflect?) in order,
//! per `spec.md` §2 and §5 ("control flow is strictly linear").
//!
//! [`api::compile_shader`] is the only caller; every other module exposes
//! its stage as a standalone function so tests can drive one stage at a
//! time without going through here.

use crate::api::{ShaderInput, ShaderOutput};
use crate::ast::Program;
use crate::codegen;
use crate::diagnostics::Log;
use crate::lexer::{Dialect, Token, TokenKind};
use crate::parser::Parser;
use crate::preprocessor::Preprocessor;
use crate::reflection::{self, ReflectionData};
use crate::semantic::{self, AnalysisRequest};
use crate::transform;

/// Runs the full pipeline for one compilation. Called only after
/// `api::compile_shader` has validated the descriptors, so `input.shader_target`
/// is never `Undefined` here.
///
/// Returns `true` iff a translation unit (or, in `validate_only` mode,
/// nothing) was produced with no error-severity diagnostic reported.
pub fn run(
    input: &mut ShaderInput,
    output: &mut ShaderOutput,
    log: &mut dyn Log,
    mut reflection: Option<&mut ReflectionData>,
) -> bool {
    let max_include_depth = input.max_include_depth;
    let pp = Preprocessor::new(
        input.filename.clone(),
        input.source_code.clone(),
        &mut *input.include_handler,
        input.search_paths.clone(),
        max_include_depth,
    );
    let pp_result = pp.run(log);
    if log.has_errors() {
        // PreprocessError: fatal to everything downstream, per `spec.md` §7.
        return false;
    }

    if output.options.preprocess_only {
        output.source_code = render_tokens(&pp_result.tokens);
        return true;
    }

    let parser = Parser::new(pp_result.tokens);
    let mut program: Program = parser.parse(log);
    if log.has_errors() {
        // SyntaxError: "any syntax error aborts later stages" (`spec.md` §7).
        return false;
    }

    let version = output.shader_version;
    let analysis_request = AnalysisRequest {
        entry_point: &input.entry_point,
        secondary_entry_point: input.secondary_entry_point.as_deref(),
        target: input.shader_target,
        version,
    };
    let analysis_ok = semantic::analyze(&mut program, &analysis_request, log);
    if !analysis_ok {
        // SemanticError: analyzer already collected every diagnostic it could;
        // no reachability marks exist so reflection cannot run either
        // (`SPEC_FULL.md` §9's resolution of the open question).
        return false;
    }

    transform::run(&mut program, &output.name_mangling);

    if output.options.validate_only {
        // "validateOnly replaces the output sink with a null sink" (`spec.md`
        // §6): never write to `output.source_code`, testable property 8.
        output.source_code.clear();
    } else {
        let generator = codegen::generator_for(version);
        let extensions = if output.options.allow_extensions {
            input.extensions
        } else {
            crate::api::Extensions::empty()
        };
        output.source_code = generator.generate(&program, output, extensions);
    }

    if let Some(reflection) = reflection.as_deref_mut() {
        *reflection = reflection::extract(
            &program,
            pp_result.macros.snapshot(),
            input.shader_target,
            output.options.auto_binding,
        );
    }

    true
}

/// Renders a token stream back to source text for `preprocessOnly` mode.
/// Testable property 1 ("preprocessing a file with no directives and no
/// macro calls yields its input, modulo whitespace normalization") is
/// satisfied by reproducing each token's lexeme, separated by a single space
/// wherever the original had *any* whitespace and by nothing otherwise, with
/// a newline at each token that started a new logical line.
fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut first = true;
    for tok in tokens {
        if matches!(tok.kind, TokenKind::Eof) {
            break;
        }
        if !first {
            if tok.at_line_start {
                out.push('\n');
            } else if tok.preceded_by_whitespace {
                out.push(' ');
            }
        }
        out.push_str(&tok.lexeme);
        first = false;
    }
    out
}

/// Preprocesses `source` with no include handler beyond an empty search
/// path, for the ast-dump tool's `--dialect` flag (it never needs real
/// `#include` resolution since it works on a single self-contained file).
pub fn lex_only(source: &str, dialect: Dialect, log: &mut dyn Log) -> Vec<Token> {
    let mut buf = crate::source::SourceBuffer::new("<source>", source.to_string());
    let mut lexer = crate::lexer::Lexer::new(&mut buf, dialect);
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next_token(log);
        if tok.is_eof() {
            break;
        }
        tokens.push(tok);
    }
    tokens
}
