//! The AST data model: arenas, the `Program` root, type denoters, node
//! flags, and traversal infrastructure.

pub mod flags;
pub mod nodes;
pub mod types;
pub mod visitor;

use std::collections::HashMap;
use std::rc::Rc;

pub use flags::NodeFlags;
pub use nodes::*;
pub use types::{BaseType, BufferKind, SamplerKind, TypeDenoter};
pub use visitor::Visitor;

/// Which GPU stage a shader targets. Carried from `ShaderInput.shaderTarget`
/// through to the per-stage layout record in [`Program`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

/// Tessellation-control-stage layout attributes (`spec.md` §3).
#[derive(Debug, Clone, Default)]
pub struct TessControlLayout {
    pub output_control_points: Option<u32>,
    pub max_tess_factor: Option<f32>,
    pub partitioning: Option<Rc<str>>,
    pub output_topology: Option<Rc<str>>,
}

#[derive(Debug, Clone, Default)]
pub struct TessEvalLayout {
    pub domain_type: Option<Rc<str>>,
    pub partitioning: Option<Rc<str>>,
}

#[derive(Debug, Clone, Default)]
pub struct GeometryLayout {
    pub max_vertices: Option<u32>,
    pub input_primitive: Option<Rc<str>>,
    pub output_topology: Option<Rc<str>>,
}

#[derive(Debug, Clone, Default)]
pub struct FragmentLayout {
    pub early_depth_stencil: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ComputeLayout {
    pub num_threads: [u32; 3],
}

/// Per-stage layout records; only the record matching the compiled stage is
/// populated.
#[derive(Debug, Clone, Default)]
pub struct StageLayouts {
    pub tess_control: Option<TessControlLayout>,
    pub tess_eval: Option<TessEvalLayout>,
    pub geometry: Option<GeometryLayout>,
    pub fragment: Option<FragmentLayout>,
    pub compute: Option<ComputeLayout>,
}

/// Where a flattened global IO variable's value comes from/goes to on the
/// original (un-flattened) entry point's signature.
#[derive(Debug, Clone)]
pub enum IoSource {
    /// The `index`th parameter, or one field of it if it was a struct.
    Param { index: usize, field: Option<Rc<str>> },
    /// The return value, or one field of it if the return type was a struct.
    Return { field: Option<Rc<str>> },
}

/// One global variable synthesized by entry-point IO flattening
/// (`spec.md` §4.6: "flattens input/output parameter structs into global IO
/// variables"), carrying enough information for the wrapper entry point's
/// body and for the reflection extractor's binding summary.
#[derive(Debug, Clone)]
pub struct FlattenedIoVar {
    pub global: DeclId,
    pub semantic: Semantic,
    pub dir: ParamDir,
    pub source: IoSource,
}

/// Output of entry-point IO flattening: the flattened globals plus the
/// synthesized wrapper function that calls through to the original entry
/// point. Empty/`None` when the output dialect carries semantics on
/// parameters directly (HLSL re-emission) and no flattening is needed.
#[derive(Debug, Clone, Default)]
pub struct EntryPointIo {
    pub vars: Vec<FlattenedIoVar>,
    pub wrapper: Option<DeclId>,
}

/// The root AST node. Owns every declaration, statement, and expression in
/// flat arenas indexed by id; see `nodes.rs` for why ids rather than
/// pointers. Global (file-scope) declarations are listed in source order in
/// `globals`.
#[derive(Debug, Clone, Default)]
pub struct Program {
    decls: Vec<Decl>,
    stmts: Vec<Stmt>,
    exprs: Vec<Expr>,
    pub globals: Vec<DeclId>,
    pub entry_point: Option<DeclId>,
    /// The flattening wrapper's `DeclId` when one was generated (`spec.md`
    /// §3's "secondary entry point"). `ReferenceAnalyzer` and the code
    /// generator walk from this node when it is set, falling back to
    /// `entry_point` otherwise.
    pub secondary_entry_point: Option<DeclId>,
    pub stages: StageLayouts,
    pub entry_point_io: EntryPointIo,
    /// Struct/typedef names visible at parse time, populated incrementally
    /// as declarations are parsed — the "known type names" set the parser
    /// consults for the type-vs-expression disambiguation (`spec.md` §4.4).
    pub known_type_names: HashMap<Rc<str>, DeclId>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc_decl(&mut self, range: crate::source::SourceRange, kind: DeclKind) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl {
            id,
            range,
            flags: NodeFlags::empty(),
            kind,
        });
        id
    }

    pub fn alloc_stmt(&mut self, range: crate::source::SourceRange, kind: StmtKind) -> StmtId {
        let id = StmtId(self.stmts.len() as u32);
        self.stmts.push(Stmt {
            id,
            range,
            flags: NodeFlags::empty(),
            kind,
        });
        id
    }

    pub fn alloc_expr(&mut self, range: crate::source::SourceRange, kind: ExprKind) -> ExprId {
        let id = ExprId(self.exprs.len() as u32);
        self.exprs.push(Expr {
            id,
            range,
            flags: NodeFlags::empty(),
            kind,
            type_denoter: None,
        });
        id
    }

    pub fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.index()]
    }
    pub fn decl_mut(&mut self, id: DeclId) -> &mut Decl {
        &mut self.decls[id.index()]
    }
    pub fn stmt(&self, id: StmtId) -> &Stmt {
        &self.stmts[id.index()]
    }
    pub fn stmt_mut(&mut self, id: StmtId) -> &mut Stmt {
        &mut self.stmts[id.index()]
    }
    pub fn expr(&self, id: ExprId) -> &Expr {
        &self.exprs[id.index()]
    }
    pub fn expr_mut(&mut self, id: ExprId) -> &mut Expr {
        &mut self.exprs[id.index()]
    }

    pub fn decl_ids(&self) -> impl Iterator<Item = DeclId> {
        (0..self.decls.len()).map(|i| DeclId(i as u32))
    }

    pub fn stmt_ids(&self) -> impl Iterator<Item = StmtId> {
        (0..self.stmts.len()).map(|i| StmtId(i as u32))
    }

    pub fn expr_ids(&self) -> impl Iterator<Item = ExprId> {
        (0..self.exprs.len()).map(|i| ExprId(i as u32))
    }

    pub fn all_functions(&self) -> impl Iterator<Item = (DeclId, &FunctionDecl)> {
        self.decl_ids().filter_map(move |id| {
            self.decl(id).as_function().map(|f| (id, f))
        })
    }

    /// The node `ReferenceAnalyzer` and the code generator walk from: the
    /// flattening wrapper if one was generated, else the entry point itself.
    pub fn effective_entry_point(&self) -> Option<DeclId> {
        self.secondary_entry_point.or(self.entry_point)
    }

    pub fn find_global_by_name(&self, name: &str) -> Option<DeclId> {
        self.globals
            .iter()
            .copied()
            .find(|&id| self.decl(id).name() == name)
    }
}
