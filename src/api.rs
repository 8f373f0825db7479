//! The public, language-agnostic API surface: `compile_shader` and the
//! descriptor types it takes, per `spec.md` §6.

use std::collections::HashMap;
use std::path::PathBuf;

use bitflags::bitflags;

use crate::diagnostics::{Log, NullLog, Report};
use crate::preprocessor::IncludeHandler;
use crate::reflection::ReflectionData;

/// Which GPU stage the compiled shader targets. `Undefined` exists because
/// callers may leave the field unset by mistake; per the `spec.md` §9 open
/// question, this implementation treats it as an `ArgumentError` raised
/// before any stage runs, rather than a silent pass-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderTarget {
    Undefined,
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderTarget {
    pub(crate) fn to_ast_stage(self) -> Option<crate::ast::ShaderStage> {
        Some(match self {
            ShaderTarget::Undefined => return None,
            ShaderTarget::Vertex => crate::ast::ShaderStage::Vertex,
            ShaderTarget::TessControl => crate::ast::ShaderStage::TessControl,
            ShaderTarget::TessEval => crate::ast::ShaderStage::TessEval,
            ShaderTarget::Geometry => crate::ast::ShaderStage::Geometry,
            ShaderTarget::Fragment => crate::ast::ShaderStage::Fragment,
            ShaderTarget::Compute => crate::ast::ShaderStage::Compute,
        })
    }

    /// Conventional output file extension for `spec.md` §6's default output
    /// filename rule (`<input-stem>.<entry>.<ext>`).
    pub fn default_extension(self) -> &'static str {
        match self {
            ShaderTarget::Undefined => "glsl",
            ShaderTarget::Vertex => "vert",
            ShaderTarget::TessControl => "tesc",
            ShaderTarget::TessEval => "tese",
            ShaderTarget::Geometry => "geom",
            ShaderTarget::Fragment => "frag",
            ShaderTarget::Compute => "comp",
        }
    }
}

/// The output dialect/version a compilation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderVersion {
    Hlsl5,
    Glsl450,
    Essl310,
    Vksl450,
}

impl ShaderVersion {
    /// True for the GLSL-family dialects, which carry entry-point IO as
    /// `in`/`out` globals rather than semantics on parameters — the
    /// condition under which `semantic::entry_point` flattens struct
    /// parameters (`spec.md` §4.6).
    pub fn is_glsl_family(self) -> bool {
        matches!(self, ShaderVersion::Glsl450 | ShaderVersion::Essl310 | ShaderVersion::Vksl450)
    }

    pub fn supports_double_precision(self) -> bool {
        // `spec.md` §4.6's example: "double-precision on ESSL < 3.2".
        !matches!(self, ShaderVersion::Essl310)
    }
}

bitflags! {
    /// Which warning categories are enabled. A caller clears bits to
    /// silence specific warning classes; all set by default.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Warnings: u32 {
        const IMPLICIT_CAST     = 1 << 0;
        const UNUSED_PARAMETER  = 1 << 1;
        const UNINITIALIZED_VAR = 1 << 2;
    }
}

impl Default for Warnings {
    fn default() -> Self {
        Warnings::all()
    }
}

bitflags! {
    /// Output-dialect extensions the caller permits the code generator to
    /// emit `#extension` directives for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Extensions: u32 {
        const TEXTURE_ARRAY_LOD = 1 << 0;
        const SHADER_IMAGE_LOAD_STORE = 1 << 1;
    }
}

/// Input descriptor for one compilation (`spec.md` §6).
pub struct ShaderInput<'a> {
    pub filename: String,
    pub entry_point: String,
    pub secondary_entry_point: Option<String>,
    pub shader_target: ShaderTarget,
    pub source_code: String,
    pub include_handler: &'a mut dyn IncludeHandler,
    pub warnings: Warnings,
    pub extensions: Extensions,
    pub max_include_depth: usize,
    /// Additional `-I`/`--include` search paths consulted after the
    /// including file's own directory, in order.
    pub search_paths: Vec<PathBuf>,
}

impl<'a> ShaderInput<'a> {
    pub fn new(
        filename: impl Into<String>,
        entry_point: impl Into<String>,
        shader_target: ShaderTarget,
        source_code: impl Into<String>,
        include_handler: &'a mut dyn IncludeHandler,
    ) -> Self {
        Self {
            filename: filename.into(),
            entry_point: entry_point.into(),
            secondary_entry_point: None,
            shader_target,
            source_code: source_code.into(),
            include_handler,
            warnings: Warnings::default(),
            extensions: Extensions::default(),
            max_include_depth: 64,
            search_paths: Vec::new(),
        }
    }
}

/// Formatting knobs for the code generator (`spec.md` §6).
#[derive(Debug, Clone, Default)]
pub struct Formatting {
    pub line_marks: bool,
    pub compact_wrappers: bool,
    pub always_braced_scopes: bool,
}

/// The four (plus one) name-mangling prefixes used by `FuncNameConverter`
/// and by the entry-point IO flattener when it synthesizes global names.
/// `spec.md` §6: "the five must be pairwise distinct; `reservedWord` and
/// `temporary` must be non-empty."
#[derive(Debug, Clone)]
pub struct NameMangling {
    pub input: String,
    pub output: String,
    pub reserved_word: String,
    pub temporary: String,
    pub namespace: Option<String>,
}

impl Default for NameMangling {
    fn default() -> Self {
        Self {
            input: "_i_".to_string(),
            output: "_o_".to_string(),
            reserved_word: "xc_".to_string(),
            temporary: "_t_".to_string(),
            namespace: None,
        }
    }
}

impl NameMangling {
    /// Validates the `spec.md` §6 invariant. Returns an `ArgumentError`
    /// message on violation.
    pub fn validate(&self) -> Result<(), String> {
        if self.reserved_word.is_empty() {
            return Err("nameMangling.reservedWord must be non-empty".to_string());
        }
        if self.temporary.is_empty() {
            return Err("nameMangling.temporary must be non-empty".to_string());
        }
        let mut seen = vec![self.input.as_str(), self.output.as_str(), self.reserved_word.as_str(), self.temporary.as_str()];
        if let Some(ns) = &self.namespace {
            seen.push(ns.as_str());
        }
        for i in 0..seen.len() {
            for j in (i + 1)..seen.len() {
                if seen[i] == seen[j] {
                    return Err(format!("nameMangling prefixes must be pairwise distinct; '{}' repeats", seen[i]));
                }
            }
        }
        Ok(())
    }
}

/// Behavior switches (`spec.md` §6). `auto_binding` implies
/// `explicit_binding`; this is normalized by [`Options::normalize`] rather
/// than left as a caller obligation.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub preprocess_only: bool,
    pub validate_only: bool,
    pub optimize: bool,
    pub preserve_comments: bool,
    pub allow_extensions: bool,
    pub separate_shaders: bool,
    pub auto_binding: bool,
    pub explicit_binding: bool,
    pub row_major_alignment: bool,
    pub show_ast: bool,
}

impl Options {
    pub fn normalize(mut self) -> Self {
        if self.auto_binding {
            self.explicit_binding = true;
        }
        self
    }
}

/// Output descriptor (`spec.md` §6). `source_code` is the output sink: it
/// is left empty when `options.validate_only` is set (testable property 8).
pub struct ShaderOutput {
    pub shader_version: ShaderVersion,
    pub source_code: String,
    pub options: Options,
    pub formatting: Formatting,
    pub name_mangling: NameMangling,
    pub vertex_semantics: HashMap<String, u32>,
    pub fragment_semantics: HashMap<String, u32>,
}

impl ShaderOutput {
    pub fn new(shader_version: ShaderVersion) -> Self {
        Self {
            shader_version,
            source_code: String::new(),
            options: Options::default(),
            formatting: Formatting::default(),
            name_mangling: NameMangling::default(),
            vertex_semantics: HashMap::new(),
            fragment_semantics: HashMap::new(),
        }
    }
}

/// The error taxonomy of `spec.md` §7, realized as a single enum rather than
/// a `thiserror`-derived hierarchy, matching the teacher's hand-rolled
/// `Display`/`Error` convention.
#[derive(Debug, Clone)]
pub enum CompileError {
    ArgumentError(String),
    LexError(String),
    PreprocessError(String),
    SyntaxError(String),
    SemanticError(String),
    TargetUnsupportedError(String),
    InternalError(String),
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompileError::ArgumentError(m) => write!(f, "argument error: {m}"),
            CompileError::LexError(m) => write!(f, "lex error: {m}"),
            CompileError::PreprocessError(m) => write!(f, "preprocess error: {m}"),
            CompileError::SyntaxError(m) => write!(f, "syntax error: {m}"),
            CompileError::SemanticError(m) => write!(f, "semantic error: {m}"),
            CompileError::TargetUnsupportedError(m) => write!(f, "target unsupported: {m}"),
            CompileError::InternalError(m) => write!(f, "internal error: {m}"),
        }
    }
}

impl std::error::Error for CompileError {}

/// Validates the input/output descriptors before any pipeline stage runs.
/// Raised failures are `ArgumentError`s per `spec.md` §7.
fn validate_descriptors(input: &ShaderInput, output: &ShaderOutput) -> Result<(), CompileError> {
    if input.shader_target == ShaderTarget::Undefined {
        return Err(CompileError::ArgumentError(
            "ShaderInput.shader_target must not be Undefined".to_string(),
        ));
    }
    if input.entry_point.is_empty() {
        return Err(CompileError::ArgumentError("ShaderInput.entry_point must not be empty".to_string()));
    }
    output
        .name_mangling
        .validate()
        .map_err(CompileError::ArgumentError)?;
    Ok(())
}

/// Compiles one shader, per `spec.md` §6:
/// `compile_shader(input_desc, output_desc, log?, reflection?) -> bool`.
///
/// Returns `false` and leaves diagnostics in `log` (if supplied) on any
/// failure; never panics on a malformed-but-well-typed input (catastrophic
/// invariant violations are the only case that aborts, via a single
/// `InternalError` diagnostic).
pub fn compile_shader(
    input: &mut ShaderInput,
    output: &mut ShaderOutput,
    log: Option<&mut dyn Log>,
    reflection: Option<&mut ReflectionData>,
) -> bool {
    let mut null_log = NullLog::default();
    let log: &mut dyn Log = log.unwrap_or(&mut null_log);

    output.options = std::mem::take(&mut output.options).normalize();

    if let Err(err) = validate_descriptors(input, output) {
        log.report(Report::error(err.to_string()));
        return false;
    }

    crate::pipeline::run(input, output, log, reflection)
}
