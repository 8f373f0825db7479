//! AST node definitions: declarations, statements, expressions.
//!
//! Nodes live in flat arenas owned by [`crate::ast::Program`] and are
//! referenced by small index newtypes (`DeclId`, `StmtId`, `ExprId`) rather
//! than by pointer or `Rc`, per `spec.md` §3/§9 ("the Program owns all AST
//! nodes exclusively ... cross-references are non-owning back-references").
//! An id is only ever valid against the `Program` that allocated it.

use std::rc::Rc;

use crate::ast::flags::NodeFlags;
use crate::ast::types::TypeDenoter;
use crate::source::SourceRange;

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(DeclId);
define_id!(StmtId);
define_id!(ExprId);

/// A named binding's storage class, as parsed from leading qualifier
/// keywords (`static`, `uniform`, `extern`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StorageClass {
    pub is_static: bool,
    pub is_uniform: bool,
    pub is_extern: bool,
    pub is_const: bool,
    pub is_volatile: bool,
    pub is_inline: bool,
    pub is_groupshared: bool,
}

/// Interpolation modifier on a varying parameter/field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Default,
    Linear,
    Centroid,
    NoInterpolation,
    NoPerspective,
    Sample,
}

/// Parameter IO direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDir {
    In,
    Out,
    InOut,
}

/// A `register(...)` decorator.
#[derive(Debug, Clone)]
pub struct RegisterDecorator {
    pub register_class: char, // 'b', 't', 's', 'u', 'c', ...
    pub slot: u32,
    pub space: Option<u32>,
}

/// A `: SEMANTIC_NAME[n]` decorator on a parameter, field, or function
/// return value.
#[derive(Debug, Clone)]
pub struct Semantic {
    pub name: Rc<str>,
    pub index: Option<u32>,
}

/// A `packoffset(cN[.x])` decorator.
#[derive(Debug, Clone)]
pub struct PackOffset {
    pub register: u32,
    pub component: Option<char>,
}

/// A `[attribute(args...)]` style annotation (e.g. `[unroll]`,
/// `[numthreads(8,8,1)]`).
#[derive(Debug, Clone)]
pub struct Annotation {
    pub name: Rc<str>,
    pub args: Vec<ExprId>,
}

/// Decorators trailing a declaration, collected by `parser::decorators`.
#[derive(Debug, Clone, Default)]
pub struct Decorators {
    pub register: Option<RegisterDecorator>,
    pub semantic: Option<Semantic>,
    pub pack_offset: Option<PackOffset>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct Param {
    pub name: Rc<str>,
    pub dir: ParamDir,
    pub interpolation: Interpolation,
    pub type_denoter: Rc<TypeDenoter>,
    pub array_dims: Vec<Option<u32>>,
    pub decorators: Decorators,
    pub default_value: Option<ExprId>,
    pub range: SourceRange,
    /// Bound during semantic analysis: the resolved struct field this
    /// parameter stands in for, if IO-flattening generated it.
    pub resolved_field_of: Option<DeclId>,
    /// Bound during semantic analysis: a synthesized `Variable` declaration
    /// giving this parameter a `DeclId` identity, so `Object` expressions
    /// inside the function body that reference it by name have something
    /// to bind to (`spec.md` §3: "every use-site has ... a bound
    /// declaration reference"). `None` until `semantic::binding` runs.
    pub shadow_decl: Option<DeclId>,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Rc<str>,
    /// The name this overload resolves/emits as after `FuncNameConverter`
    /// uniquifies it; `None` until that transform has run.
    pub mangled_name: Option<Rc<str>>,
    pub return_type: Rc<TypeDenoter>,
    pub return_semantic: Option<Semantic>,
    pub params: Vec<Param>,
    pub body: Option<StmtId>,
    pub annotations: Vec<Annotation>,
    pub is_entry_point_candidate: bool,
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub name: Rc<str>,
    pub storage: StorageClass,
    pub interpolation: Interpolation,
    pub type_denoter: Rc<TypeDenoter>,
    pub array_dims: Vec<Option<u32>>,
    pub decorators: Decorators,
    pub initializer: Option<ExprId>,
    /// Set by `semantic::binding::synthesize_cbuffer_members` on the
    /// per-member `Variable` decls it synthesizes out of a `cbuffer`/
    /// `tbuffer` body, pointing back at the owning `UniformBuffer` decl.
    /// `None` for ordinary globals and locals.
    pub owner_cbuffer: Option<DeclId>,
}

#[derive(Debug, Clone)]
pub struct StructField {
    pub name: Rc<str>,
    pub type_denoter: Rc<TypeDenoter>,
    pub array_dims: Vec<Option<u32>>,
    pub interpolation: Interpolation,
    pub decorators: Decorators,
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: Rc<str>,
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone)]
pub struct BufferDecl {
    pub name: Rc<str>,
    pub type_denoter: Rc<TypeDenoter>,
    pub decorators: Decorators,
}

#[derive(Debug, Clone)]
pub struct SamplerDecl {
    pub name: Rc<str>,
    pub type_denoter: Rc<TypeDenoter>,
    pub decorators: Decorators,
}

/// A `cbuffer`/`tbuffer` block: a named group of member variable
/// declarations sharing one binding.
#[derive(Debug, Clone)]
pub struct UniformBufferDecl {
    pub name: Rc<str>,
    pub is_texture_buffer: bool,
    pub members: Vec<VariableDecl>,
    pub decorators: Decorators,
    /// Bound during semantic analysis: one synthesized `Variable` decl per
    /// member, registered directly into the enclosing scope (`cbuffer`
    /// members are referenced unqualified, not as `BufferName.member`).
    /// Parallel to `members`; empty until `semantic::binding` runs.
    pub member_decl_ids: Vec<DeclId>,
}

#[derive(Debug, Clone)]
pub struct AliasDecl {
    pub name: Rc<str>,
    pub target: Rc<TypeDenoter>,
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Function(FunctionDecl),
    Variable(VariableDecl),
    Buffer(BufferDecl),
    Sampler(SamplerDecl),
    Struct(StructDecl),
    UniformBuffer(UniformBufferDecl),
    Alias(AliasDecl),
}

#[derive(Debug, Clone)]
pub struct Decl {
    pub id: DeclId,
    pub range: SourceRange,
    pub flags: NodeFlags,
    pub kind: DeclKind,
}

impl Decl {
    pub fn name(&self) -> &str {
        match &self.kind {
            DeclKind::Function(d) => &d.name,
            DeclKind::Variable(d) => &d.name,
            DeclKind::Buffer(d) => &d.name,
            DeclKind::Sampler(d) => &d.name,
            DeclKind::Struct(d) => &d.name,
            DeclKind::UniformBuffer(d) => &d.name,
            DeclKind::Alias(d) => &d.name,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionDecl> {
        match &self.kind {
            DeclKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_function_mut(&mut self) -> Option<&mut FunctionDecl> {
        match &mut self.kind {
            DeclKind::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&StructDecl> {
        match &self.kind {
            DeclKind::Struct(s) => Some(s),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------- Statements

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTransferKind {
    Break,
    Continue,
    Discard,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    pub value: Option<ExprId>, // None denotes `default:`
    pub body: Vec<StmtId>,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    CodeBlock(Vec<StmtId>),
    VarDecl(DeclId),
    For {
        init: Option<StmtId>,
        condition: Option<ExprId>,
        iteration: Option<ExprId>,
        body: StmtId,
    },
    While {
        condition: ExprId,
        body: StmtId,
    },
    DoWhile {
        body: StmtId,
        condition: ExprId,
    },
    If {
        condition: ExprId,
        then_branch: StmtId,
        else_branch: Option<StmtId>,
    },
    Switch {
        selector: ExprId,
        cases: Vec<SwitchCase>,
    },
    Return(Option<ExprId>),
    ControlTransfer(ControlTransferKind),
    Expr(ExprId),
    Null,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: StmtId,
    pub range: SourceRange,
    pub flags: NodeFlags,
    pub kind: StmtKind,
}

// --------------------------------------------------------------- Expressions

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add, Sub, Mul, Div, Mod,
    Eq, Ne, Lt, Gt, Le, Ge,
    And, Or,
    BitAnd, BitOr, BitXor, Shl, Shr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
    BitNot,
    PreInc,
    PreDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostUnaryOp {
    PostInc,
    PostDec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    Add, Sub, Mul, Div, Mod,
    And, Or, Xor, Shl, Shr,
}

use crate::lexer::Literal as LexLiteral;

#[derive(Debug, Clone)]
pub enum ExprKind {
    Literal(LexLiteral),
    /// Comma-separated sequence `(a, b, c)`; value is the last.
    Sequence(Vec<ExprId>),
    Binary(BinaryOp, ExprId, ExprId),
    Unary(UnaryOp, ExprId),
    PostUnary(PostUnaryOp, ExprId),
    Ternary(ExprId, ExprId, ExprId),
    /// Function or constructor call; `callee` is unresolved until analysis
    /// binds `resolved` to a specific overload.
    Call {
        callee: Rc<str>,
        args: Vec<ExprId>,
        resolved: Option<DeclId>,
    },
    /// `base[index]`.
    Bracket(ExprId, ExprId),
    /// A bare name reference or `base.member` access; `resolved` is bound
    /// during analysis.
    Object {
        base: Option<ExprId>,
        member: Rc<str>,
        resolved: Option<DeclId>,
    },
    /// Swizzle / array-style initializer list `{a, b, c}`.
    Initializer(Vec<ExprId>),
    /// `(Type)expr`.
    Cast(Rc<TypeDenoter>, ExprId),
    /// A type name appearing in expression position (constructor call
    /// callee before argument parsing resolves it, or a `sizeof`-like use).
    TypeSpecifier(Rc<TypeDenoter>),
    Assign(AssignOp, ExprId, ExprId),
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ExprId,
    pub range: SourceRange,
    pub flags: NodeFlags,
    pub kind: ExprKind,
    /// Computed bottom-up by `semantic::types`; `None` until analysis runs.
    pub type_denoter: Option<Rc<TypeDenoter>>,
}
