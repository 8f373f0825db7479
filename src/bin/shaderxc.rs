//! `shaderxc` — the command-line front end for the shader cross-compiler.
//!
//! A thin wrapper around [`shaderxc::compile_shader`]: this binary owns
//! argument parsing, file I/O, include-path resolution, and diagnostic
//! printing — exactly the "glue" `spec.md` §1 declares out of scope for the
//! core. One invocation may list several input files; each is compiled
//! independently with the same target/version/entry-point settings, and the
//! output filename is recomputed fresh for each (the "reset of per-file
//! state" `spec.md` §6 describes, made explicit here as "derive it from
//! scratch every iteration" rather than mutable state carried across files).

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use shaderxc::diagnostics::{CollectingLog, Report, Severity};
use shaderxc::preprocessor::FsIncludeHandler;
use shaderxc::processing_stages::{initialize_registries, CONVERSION_FACTORY, FORMAT_REGISTRY, STAGE_REGISTRY};
use shaderxc::reflection::ReflectionData;
use shaderxc::{compile_shader, Options, ShaderInput, ShaderOutput, ShaderTarget, ShaderVersion};

/// `spec.md` §6's CLI surface, realized with `clap`'s derive API (the
/// teacher's own CLI frontend convention).
#[derive(Parser, Debug)]
#[command(name = "shaderxc", version, about = "HLSL (SM3-5) to GLSL/ESSL/VKSL/HLSL shader cross-compiler")]
struct Args {
    /// Shader source files to compile.
    inputs: Vec<String>,

    /// Target GPU stage: vertex, tess-control, tess-eval, geometry, fragment, compute.
    #[arg(long)]
    target: String,

    /// Output dialect: hlsl5, glsl450, essl310, vksl450.
    #[arg(long)]
    version: String,

    /// Name of the shader entry-point function.
    #[arg(long)]
    entry: String,

    /// Name of a secondary entry point (e.g. a hull shader's patch-constant function).
    #[arg(long = "secondary-entry")]
    secondary_entry: Option<String>,

    /// Output file path. Only meaningful with a single input file; with
    /// several, the default naming rule always applies.
    #[arg(long, short)]
    output: Option<String>,

    /// Additional include search paths, repeatable.
    #[arg(long, short = 'I')]
    include: Vec<String>,

    /// Stop after semantic analysis; write nothing to the output sink.
    #[arg(long = "validate-only")]
    validate_only: bool,

    /// Stop after preprocessing; emit the macro-expanded source verbatim.
    #[arg(long = "preprocess-only")]
    preprocess_only: bool,

    /// Dump an intermediate representation (selected by `--stage`/`--format`)
    /// to stderr before compiling normally.
    #[arg(long = "show-ast")]
    show_ast: bool,

    /// Which checkpoint `--show-ast` dumps.
    #[arg(long, default_value = "analyzed-ast")]
    stage: String,

    /// How `--show-ast` renders the dumped checkpoint.
    #[arg(long, default_value = "pretty")]
    format: String,

    /// Auto-assign sequential binding slots to resources with no explicit `register()`.
    #[arg(long = "auto-binding")]
    auto_binding: bool,

    /// Print per-stage counts to stderr after each file compiles.
    #[arg(long)]
    stats: bool,
}

fn parse_target(s: &str) -> Result<ShaderTarget, String> {
    Ok(match s {
        "vertex" => ShaderTarget::Vertex,
        "tess-control" => ShaderTarget::TessControl,
        "tess-eval" => ShaderTarget::TessEval,
        "geometry" => ShaderTarget::Geometry,
        "fragment" => ShaderTarget::Fragment,
        "compute" => ShaderTarget::Compute,
        other => return Err(format!(
            "unknown --target '{other}' (expected vertex, tess-control, tess-eval, geometry, fragment, or compute)"
        )),
    })
}

fn parse_version(s: &str) -> Result<ShaderVersion, String> {
    Ok(match s {
        "hlsl5" => ShaderVersion::Hlsl5,
        "glsl450" => ShaderVersion::Glsl450,
        "essl310" => ShaderVersion::Essl310,
        "vksl450" => ShaderVersion::Vksl450,
        other => return Err(format!(
            "unknown --version '{other}' (expected hlsl5, glsl450, essl310, or vksl450)"
        )),
    })
}

fn default_output_path(input_path: &Path, entry: &str, target: ShaderTarget) -> PathBuf {
    let stem = input_path.file_stem().and_then(|s| s.to_str()).unwrap_or("shader");
    input_path.with_file_name(format!("{stem}.{entry}.{}", target.default_extension()))
}

fn print_report(report: &Report) {
    let label = match report.severity {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    match report.range {
        Some(range) => eprintln!(
            "{label}: {}:{}: {}",
            range.start.line, range.start.column, report.message
        ),
        None => eprintln!("{label}: {}", report.message),
    }
    for hint in &report.hints {
        eprintln!("  note: {}:{}: {}", hint.range.start.line, hint.range.start.column, hint.message);
    }
}

fn print_help_stages() {
    let stages = STAGE_REGISTRY.lock().unwrap();
    let formats = FORMAT_REGISTRY.lock().unwrap();
    let conversions = CONVERSION_FACTORY.lock().unwrap();

    println!("AVAILABLE STAGES:");
    for stage in stages.list() {
        println!("  {:<16} {}", stage.name, stage.description);
    }
    println!("\nAVAILABLE FORMATS:");
    for format in formats.list() {
        println!("  {:<16} {}", format.name, format.description);
    }
    println!("\nSTAGE-FORMAT COMBINATIONS:");
    for stage in stages.list() {
        let supported: Vec<&str> = formats
            .list()
            .into_iter()
            .filter(|f| conversions.is_supported(stage.name, f.name, &stages))
            .map(|f| f.name)
            .collect();
        println!("  {:<16} {}", stage.name, supported.join(", "));
    }
}

fn compile_one(path: &str, args: &Args, target: ShaderTarget, version: ShaderVersion) -> bool {
    let input_path = Path::new(path);
    let source = match std::fs::read_to_string(input_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read '{path}': {e}");
            return false;
        }
    };

    if args.show_ast {
        if STAGE_REGISTRY.lock().unwrap().get(&args.stage).is_none() {
            eprintln!("error: unknown --stage '{}'; see --help-stages", args.stage);
            return false;
        }
        if FORMAT_REGISTRY.lock().unwrap().get(&args.format).is_none() {
            eprintln!("error: unknown --format '{}'; see --help-stages", args.format);
            return false;
        }
    }

    let including_dir = input_path.parent().map(Path::to_path_buf);
    let mut include_handler = FsIncludeHandler::new(including_dir);

    let mut input = ShaderInput::new(path.to_string(), args.entry.clone(), target, source, &mut include_handler);
    input.secondary_entry_point = args.secondary_entry.clone();
    input.search_paths = args.include.iter().map(PathBuf::from).collect();

    let mut output = ShaderOutput::new(version);
    output.options = Options {
        preprocess_only: args.preprocess_only,
        validate_only: args.validate_only,
        show_ast: args.show_ast,
        auto_binding: args.auto_binding,
        ..Options::default()
    };

    let mut log = CollectingLog::new();
    let mut reflection = ReflectionData::new();
    let ok = compile_shader(&mut input, &mut output, Some(&mut log), Some(&mut reflection));

    for report in log.reports() {
        print_report(report);
    }

    if !ok {
        return false;
    }

    if !args.validate_only && !args.preprocess_only {
        let out_path = match &args.output {
            Some(p) if args.inputs.len() == 1 => PathBuf::from(p),
            _ => default_output_path(input_path, &args.entry, target),
        };
        if let Err(e) = std::fs::write(&out_path, &output.source_code) {
            eprintln!("error: could not write '{}': {e}", out_path.display());
            return false;
        }
        println!("{} -> {}", path, out_path.display());
    } else if args.preprocess_only {
        print!("{}", output.source_code);
    }

    if args.stats {
        eprintln!(
            "stats: {} macro(s) defined, {} texture(s), {} constant buffer(s), {} sampler(s)",
            reflection.macros.len(),
            reflection.textures.len(),
            reflection.constant_buffers.len(),
            reflection.samplers.len()
        );
    }

    true
}

fn main() -> ExitCode {
    initialize_registries();
    let args = Args::parse();

    if args.inputs.is_empty() {
        eprintln!("error: no input files given");
        print_help_stages();
        return ExitCode::FAILURE;
    }

    let target = match parse_target(&args.target) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let version = match parse_version(&args.version) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut all_ok = true;
    for path in &args.inputs {
        if !compile_one(path, &args, target, version) {
            all_ok = false;
        }
    }

    if all_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
