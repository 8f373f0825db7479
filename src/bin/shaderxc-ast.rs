//! `shaderxc-ast` — a companion tool that dumps one intermediate
//! representation of the pipeline (raw tokens, the preprocessed token
//! stream, the parsed AST, the analyzed-and-transformed AST, or the
//! reflection summary) instead of compiling to a target dialect. Exists for
//! the same reason the teacher repo ships a `txxt-treeviz` companion to its
//! main CLI: inspecting an intermediate stage is a debugging need distinct
//! from "produce output source", so it gets its own small binary rather
//! than another flag fork in `shaderxc`'s main path.

use std::path::Path;

use clap::Parser;
use serde_json::json;

use shaderxc::ast::Program;
use shaderxc::diagnostics::{CollectingLog, Report};
use shaderxc::lexer::{Dialect, Token};
use shaderxc::preprocessor::{FsIncludeHandler, Preprocessor};
use shaderxc::processing_stages::initialize_registries;
use shaderxc::reflection;
use shaderxc::semantic::{self, AnalysisRequest};
use shaderxc::transform;
use shaderxc::api::NameMangling;
use shaderxc::{ShaderTarget, ShaderVersion};

#[derive(Parser, Debug)]
#[command(name = "shaderxc-ast", about = "Dump an intermediate stage of the shader cross-compiler pipeline")]
struct Args {
    /// Shader source file to inspect.
    input: String,

    /// Which checkpoint to dump: tokens, preprocessed, ast, analyzed-ast, reflection.
    #[arg(long, default_value = "ast")]
    stage: String,

    /// json or pretty.
    #[arg(long, default_value = "pretty")]
    format: String,

    #[arg(long, default_value = "main")]
    entry: String,

    #[arg(long, default_value = "fragment")]
    target: String,

    #[arg(long, default_value = "glsl450")]
    version: String,
}

fn parse_target(s: &str) -> ShaderTarget {
    match s {
        "vertex" => ShaderTarget::Vertex,
        "tess-control" => ShaderTarget::TessControl,
        "tess-eval" => ShaderTarget::TessEval,
        "geometry" => ShaderTarget::Geometry,
        "compute" => ShaderTarget::Compute,
        _ => ShaderTarget::Fragment,
    }
}

fn parse_version(s: &str) -> ShaderVersion {
    match s {
        "hlsl5" => ShaderVersion::Hlsl5,
        "essl310" => ShaderVersion::Essl310,
        "vksl450" => ShaderVersion::Vksl450,
        _ => ShaderVersion::Glsl450,
    }
}

fn dump_tokens(tokens: &[Token], format: &str) -> String {
    if format == "json" {
        let entries: Vec<_> = tokens
            .iter()
            .map(|t| {
                json!({
                    "lexeme": t.lexeme.to_string(),
                    "line": t.range.start.line,
                    "column": t.range.start.column,
                    "at_line_start": t.at_line_start,
                })
            })
            .collect();
        serde_json::to_string_pretty(&json!({ "tokens": entries })).unwrap_or_default()
    } else {
        tokens
            .iter()
            .map(|t| format!("{:>5}:{:<4} {}", t.range.start.line, t.range.start.column, t.lexeme))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn dump_program(program: &Program, format: &str) -> String {
    if format == "json" {
        let names: Vec<_> = program.globals.iter().map(|id| program.decl(*id).name().to_string()).collect();
        serde_json::to_string_pretty(&json!({
            "global_count": program.globals.len(),
            "global_names": names,
            "entry_point": program.entry_point.map(|id| program.decl(id).name().to_string()),
            "debug": format!("{:#?}", program.globals.iter().map(|id| program.decl(*id)).collect::<Vec<_>>()),
        }))
        .unwrap_or_default()
    } else {
        let mut out = String::new();
        for id in &program.globals {
            out.push_str(&format!("{:#?}\n", program.decl(*id)));
        }
        out
    }
}

fn main() {
    initialize_registries();
    let args = Args::parse();

    let source = match std::fs::read_to_string(&args.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read '{}': {e}", args.input);
            std::process::exit(1);
        }
    };

    let mut log = CollectingLog::new();

    if args.stage == "tokens" {
        let tokens = shaderxc::pipeline::lex_only(&source, Dialect::Hlsl, &mut log);
        print!("{}", dump_tokens(&tokens, &args.format));
        print_diagnostics(&log);
        return;
    }

    let including_dir = Path::new(&args.input).parent().map(Path::to_path_buf);
    let mut handler = FsIncludeHandler::new(including_dir);
    let pp = Preprocessor::new(args.input.clone(), source, &mut handler, Vec::new(), 64);
    let pp_result = pp.run(&mut log);

    if args.stage == "preprocessed" {
        print!("{}", dump_tokens(&pp_result.tokens, &args.format));
        print_diagnostics(&log);
        return;
    }

    let parser = shaderxc::parser::Parser::new(pp_result.tokens);
    let mut program = parser.parse(&mut log);

    if args.stage == "ast" {
        print!("{}", dump_program(&program, &args.format));
        print_diagnostics(&log);
        return;
    }

    let target = parse_target(&args.target);
    let version = parse_version(&args.version);
    let request = AnalysisRequest {
        entry_point: &args.entry,
        secondary_entry_point: None,
        target,
        version,
    };
    let analyzed = semantic::analyze(&mut program, &request, &mut log);
    if analyzed {
        transform::run(&mut program, &NameMangling::default());
    }

    if args.stage == "analyzed-ast" {
        print!("{}", dump_program(&program, &args.format));
        print_diagnostics(&log);
        return;
    }

    if args.stage == "reflection" {
        if !analyzed {
            eprintln!("error: semantic analysis failed; no reflection data available");
            print_diagnostics(&log);
            std::process::exit(1);
        }
        let data = reflection::extract(&program, pp_result.macros.snapshot(), target, false);
        if args.format == "json" {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "textures": data.textures.iter().map(|t| t.name.to_string()).collect::<Vec<_>>(),
                    "constant_buffers": data.constant_buffers.iter().map(|c| c.name.to_string()).collect::<Vec<_>>(),
                    "samplers": data.samplers.iter().map(|s| s.name.to_string()).collect::<Vec<_>>(),
                    "fragment_targets": data.fragment_targets.iter().map(|f| f.name.to_string()).collect::<Vec<_>>(),
                    "macros": data.macros.iter().map(|m| m.name.to_string()).collect::<Vec<_>>(),
                }))
                .unwrap_or_default()
            );
        } else {
            println!("{:#?}", data);
        }
        print_diagnostics(&log);
        return;
    }

    eprintln!("error: unknown --stage '{}' (expected tokens, preprocessed, ast, analyzed-ast, or reflection)", args.stage);
    std::process::exit(1);
}

fn print_diagnostics(log: &CollectingLog) {
    for report in log.reports() {
        print_report(report);
    }
}

fn print_report(report: &Report) {
    eprintln!("{:?}: {}", report.severity, report.message);
}
