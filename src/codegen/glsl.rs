//! `GlslGenerator`, per `spec.md` §4.8: emits GLSL 450, ESSL 3.10, or VKSL
//! 450 source text from a transformed [`Program`]. The three dialects share
//! nearly everything; they differ only in header line, a default-precision
//! preamble (ESSL), and which extensions are nameable at all.

use std::fmt::Write as _;

use crate::api::{Extensions, ShaderOutput, ShaderVersion};
use crate::ast::{
    AssignOp, BaseType, BinaryOp, BufferKind, DeclId, DeclKind, ExprId, ExprKind, NodeFlags,
    ParamDir, Program, SamplerKind, StmtId, StmtKind, TypeDenoter, UnaryOp, PostUnaryOp,
};
use crate::codegen::writer::IndentedWriter;
use crate::lexer::{Literal, NumericSuffix};

use super::CodeGenerator;

pub struct GlslGenerator;

impl CodeGenerator for GlslGenerator {
    fn generate(&self, program: &Program, output: &ShaderOutput, extensions: Extensions) -> String {
        let mut ctx = Ctx { program, output, w: IndentedWriter::new() };
        ctx.emit_header(extensions);
        ctx.emit_globals();
        ctx.w.into_string()
    }
}

struct Ctx<'a> {
    program: &'a Program,
    output: &'a ShaderOutput,
    w: IndentedWriter,
}

impl<'a> Ctx<'a> {
    fn emit_header(&mut self, extensions: Extensions) {
        match self.output.shader_version {
            ShaderVersion::Glsl450 => self.w.write_line("#version 450 core"),
            ShaderVersion::Essl310 => self.w.write_line("#version 310 es"),
            ShaderVersion::Vksl450 => self.w.write_line("#version 450"),
            ShaderVersion::Hlsl5 => unreachable!("GlslGenerator never runs for Hlsl5"),
        }
        if self.output.options.allow_extensions {
            if extensions.contains(Extensions::TEXTURE_ARRAY_LOD) {
                self.w.write_line("#extension GL_EXT_texture_array : enable");
            }
            if extensions.contains(Extensions::SHADER_IMAGE_LOAD_STORE) {
                self.w.write_line("#extension GL_ARB_shader_image_load_store : enable");
            }
        }
        if self.output.shader_version == ShaderVersion::Essl310 {
            self.w.write_line("precision highp float;");
            self.w.write_line("precision highp int;");
        }
        self.w.newline();
    }

    fn emit_globals(&mut self) {
        for id in self.program.globals.clone() {
            if !self.program.decl(id).flags.contains(NodeFlags::REACHABLE) {
                continue;
            }
            self.emit_decl(id);
        }
    }

    fn emit_decl(&mut self, id: DeclId) {
        let decl = self.program.decl(id).clone();
        match &decl.kind {
            DeclKind::Struct(s) => {
                if decl.flags.contains(NodeFlags::IO_ONLY_STRUCT) {
                    return;
                }
                self.w.write_line(&format!("struct {} {{", s.name));
                self.w.push_indent();
                for field in &s.fields {
                    self.w.write_line(&format!(
                        "{} {}{};",
                        glsl_type_name(&field.type_denoter),
                        field.name,
                        array_suffix(&field.array_dims)
                    ));
                }
                self.w.pop_indent();
                self.w.write_line("};");
                self.w.newline();
            }
            DeclKind::Alias(_) => {
                // GLSL has no typedef; every reference already resolves
                // through `TypeDenoter::get_aliased` at use sites.
            }
            DeclKind::Sampler(_) => {
                // GLSL's combined sampler model folds the sampler object
                // into the texture declaration; a standalone SamplerState
                // has no GLSL counterpart to emit.
            }
            DeclKind::Buffer(b) => {
                if let TypeDenoter::Buffer(
                    BufferKind::StructuredBuffer
                    | BufferKind::RWStructuredBuffer
                    | BufferKind::AppendStructuredBuffer
                    | BufferKind::ConsumeStructuredBuffer,
                    elem,
                ) = b.type_denoter.get_aliased()
                {
                    let elem_ty = elem.as_deref().map(glsl_type_name).unwrap_or_else(|| "float".to_string());
                    self.w.write_line(&format!("buffer {}_Block {{", b.name));
                    self.w.push_indent();
                    self.w.write_line(&format!("{elem_ty} {}[];", b.name));
                    self.w.pop_indent();
                    self.w.write_line("};");
                } else {
                    let qualifier = buffer_qualifier(&b.type_denoter);
                    self.w.write_line(&format!("uniform {} {};", qualifier, b.name));
                }
            }
            DeclKind::UniformBuffer(cb) => {
                let binding = cb
                    .decorators
                    .register
                    .as_ref()
                    .map(|r| r.slot)
                    .unwrap_or(0);
                if self.output.options.explicit_binding {
                    self.w.write_line(&format!("layout(std140, binding = {binding}) uniform {} {{", cb.name));
                } else {
                    self.w.write_line(&format!("layout(std140) uniform {} {{", cb.name));
                }
                self.w.push_indent();
                for member in &cb.members {
                    self.w.write_line(&format!(
                        "{} {}{};",
                        glsl_type_name(&member.type_denoter),
                        member.name,
                        array_suffix(&member.array_dims)
                    ));
                }
                self.w.pop_indent();
                self.w.write_line("};");
                self.w.newline();
            }
            DeclKind::Variable(v) => {
                if let Some(io) = self.program.entry_point_io.vars.iter().find(|io| io.global == id) {
                    let qualifier = match io.dir {
                        ParamDir::In => "in",
                        ParamDir::Out | ParamDir::InOut => "out",
                    };
                    let location = self.semantic_location(&io.semantic.name);
                    match location {
                        Some(loc) if self.output.options.explicit_binding => {
                            self.w.write_line(&format!(
                                "layout(location = {loc}) {qualifier} {} {};",
                                glsl_type_name(&v.type_denoter),
                                v.name
                            ));
                        }
                        _ => {
                            self.w.write_line(&format!(
                                "{qualifier} {} {};",
                                glsl_type_name(&v.type_denoter),
                                v.name
                            ));
                        }
                    }
                    return;
                }
                let qualifier = if v.storage.is_const {
                    "const "
                } else if v.storage.is_uniform || v.decorators.register.is_some() {
                    "uniform "
                } else {
                    ""
                };
                let initializer = match v.initializer {
                    Some(init) => format!(" = {}", self.expr(init)),
                    None => String::new(),
                };
                self.w.write_line(&format!(
                    "{qualifier}{} {}{}{};",
                    glsl_type_name(&v.type_denoter),
                    v.name,
                    array_suffix(&v.array_dims),
                    initializer
                ));
            }
            DeclKind::Function(f) => {
                let name: std::rc::Rc<str> =
                    if Some(id) == self.program.secondary_entry_point { std::rc::Rc::from("main") } else { f.mangled_name.clone().unwrap_or_else(|| f.name.clone()) };
                let params: Vec<String> = f
                    .params
                    .iter()
                    .map(|p| {
                        let dir = match p.dir {
                            ParamDir::In => "",
                            ParamDir::Out => "out ",
                            ParamDir::InOut => "inout ",
                        };
                        format!("{dir}{} {}{}", glsl_type_name(&p.type_denoter), p.name, array_suffix(&p.array_dims))
                    })
                    .collect();
                self.w.write_line(&format!(
                    "{} {}({})",
                    glsl_type_name(&f.return_type),
                    name,
                    params.join(", ")
                ));
                match f.body {
                    Some(body) => self.stmt(body),
                    None => self.w.write_line(";"),
                }
                self.w.newline();
            }
        }
    }

    fn semantic_location(&self, semantic_name: &str) -> Option<u32> {
        self.output
            .vertex_semantics
            .get(semantic_name)
            .or_else(|| self.output.fragment_semantics.get(semantic_name))
            .copied()
    }

    fn stmt(&mut self, id: StmtId) {
        let kind = self.program.stmt(id).kind.clone();
        match kind {
            StmtKind::CodeBlock(stmts) => {
                self.w.write_line("{");
                self.w.push_indent();
                for s in stmts {
                    self.stmt(s);
                }
                self.w.pop_indent();
                self.w.write_line("}");
            }
            StmtKind::VarDecl(decl_id) => {
                if let DeclKind::Variable(v) = &self.program.decl(decl_id).kind {
                    let initializer = match v.initializer {
                        Some(init) => format!(" = {}", self.expr(init)),
                        None => String::new(),
                    };
                    self.w.write_line(&format!(
                        "{} {}{}{};",
                        glsl_type_name(&v.type_denoter),
                        v.name,
                        array_suffix(&v.array_dims),
                        initializer
                    ));
                }
            }
            StmtKind::For { init, condition, iteration, body } => {
                let init_text = init.map(|s| self.stmt_inline(s)).unwrap_or_default();
                let cond_text = condition.map(|e| self.expr(e)).unwrap_or_default();
                let iter_text = iteration.map(|e| self.expr(e)).unwrap_or_default();
                self.w.write_line(&format!("for ({init_text} {cond_text}; {iter_text})"));
                self.stmt_as_block(body);
            }
            StmtKind::While { condition, body } => {
                self.w.write_line(&format!("while ({})", self.expr(condition)));
                self.stmt_as_block(body);
            }
            StmtKind::DoWhile { body, condition } => {
                self.w.write_line("do");
                self.stmt_as_block(body);
                self.w.write_line(&format!("while ({});", self.expr(condition)));
            }
            StmtKind::If { condition, then_branch, else_branch } => {
                self.w.write_line(&format!("if ({})", self.expr(condition)));
                self.stmt_as_block(then_branch);
                if let Some(else_b) = else_branch {
                    self.w.write_line("else");
                    self.stmt_as_block(else_b);
                }
            }
            StmtKind::Switch { selector, cases } => {
                self.w.write_line(&format!("switch ({}) {{", self.expr(selector)));
                self.w.push_indent();
                for case in cases {
                    match case.value {
                        Some(v) => self.w.write_line(&format!("case {}:", self.expr(v))),
                        None => self.w.write_line("default:"),
                    }
                    self.w.push_indent();
                    for s in case.body {
                        self.stmt(s);
                    }
                    self.w.pop_indent();
                }
                self.w.pop_indent();
                self.w.write_line("}");
            }
            StmtKind::Return(expr) => match expr {
                Some(e) => self.w.write_line(&format!("return {};", self.expr(e))),
                None => self.w.write_line("return;"),
            },
            StmtKind::ControlTransfer(kind) => {
                use crate::ast::ControlTransferKind;
                self.w.write_line(match kind {
                    ControlTransferKind::Break => "break;",
                    ControlTransferKind::Continue => "continue;",
                    ControlTransferKind::Discard => "discard;",
                });
            }
            StmtKind::Expr(e) => self.w.write_line(&format!("{};", self.expr(e))),
            StmtKind::Null => self.w.write_line(";"),
        }
    }

    /// Renders `body` braced regardless of whether it's already a
    /// `CodeBlock`, honoring `Formatting::always_braced_scopes`.
    fn stmt_as_block(&mut self, id: StmtId) {
        let is_block = matches!(self.program.stmt(id).kind, StmtKind::CodeBlock(_));
        if is_block || self.output.formatting.always_braced_scopes {
            if is_block {
                self.stmt(id);
            } else {
                self.w.write_line("{");
                self.w.push_indent();
                self.stmt(id);
                self.w.pop_indent();
                self.w.write_line("}");
            }
        } else {
            self.w.push_indent();
            self.stmt(id);
            self.w.pop_indent();
        }
    }

    /// Renders a `for`-init statement on a single line without its own
    /// trailing newline, for splicing into a `for (...)` header.
    fn stmt_inline(&mut self, id: StmtId) -> String {
        match &self.program.stmt(id).kind {
            StmtKind::VarDecl(decl_id) => {
                if let DeclKind::Variable(v) = &self.program.decl(*decl_id).kind {
                    let initializer = match v.initializer {
                        Some(init) => format!(" = {}", self.expr(init)),
                        None => String::new(),
                    };
                    format!("{} {}{}", glsl_type_name(&v.type_denoter), v.name, initializer)
                } else {
                    String::new()
                }
            }
            StmtKind::Expr(e) => self.expr(*e),
            _ => String::new(),
        }
    }

    fn expr(&self, id: ExprId) -> String {
        let kind = &self.program.expr(id).kind;
        match kind {
            ExprKind::Literal(lit) => literal_text(lit),
            ExprKind::Sequence(items) => {
                format!("({})", items.iter().map(|&e| self.expr(e)).collect::<Vec<_>>().join(", "))
            }
            ExprKind::Binary(op, l, r) => {
                format!("({} {} {})", self.expr(*l), binary_op_text(*op), self.expr(*r))
            }
            ExprKind::Unary(op, operand) => format!("{}{}", unary_op_text(*op), self.expr(*operand)),
            ExprKind::PostUnary(op, operand) => format!("{}{}", self.expr(*operand), post_unary_op_text(*op)),
            ExprKind::Ternary(cond, then_b, else_b) => {
                format!("({} ? {} : {})", self.expr(*cond), self.expr(*then_b), self.expr(*else_b))
            }
            ExprKind::Call { callee, args, resolved } => self.call_text(id, callee, args, *resolved),
            ExprKind::Bracket(base, index) => format!("{}[{}]", self.expr(*base), self.expr(*index)),
            ExprKind::Object { base: Some(base), member, .. } => format!("{}.{}", self.expr(*base), member),
            ExprKind::Object { base: None, member, resolved } => match resolved {
                Some(decl_id) => self.program.decl(*decl_id).name().to_string(),
                None => member.to_string(),
            },
            ExprKind::Initializer(elems) => {
                let inner = elems.iter().map(|&e| self.expr(e)).collect::<Vec<_>>().join(", ");
                match self.program.expr(id).type_denoter.as_deref() {
                    Some(ty) => format!("{}({inner})", glsl_type_name(ty)),
                    None => format!("{{{inner}}}"),
                }
            }
            ExprKind::Cast(ty, operand) => format!("{}({})", glsl_type_name(ty), self.expr(*operand)),
            ExprKind::TypeSpecifier(ty) => glsl_type_name(ty),
            ExprKind::Assign(op, target, value) => {
                format!("{} {} {}", self.expr(*target), assign_op_text(*op), self.expr(*value))
            }
        }
    }

    fn call_text(&self, id: ExprId, callee: &str, args: &[ExprId], resolved: Option<DeclId>) -> String {
        if callee == "saturate" && args.len() == 1 {
            return format!("clamp({}, 0.0, 1.0)", self.expr(args[0]));
        }
        let rendered_args = || args.iter().map(|&a| self.expr(a)).collect::<Vec<_>>().join(", ");
        if let Some(renamed) = translate_intrinsic(callee) {
            return format!("{renamed}({})", rendered_args());
        }
        if let Some(decl_id) = resolved {
            if let Some(f) = self.program.decl(decl_id).as_function() {
                let name = f.mangled_name.clone().unwrap_or_else(|| f.name.clone());
                return format!("{name}({})", rendered_args());
            }
            // A struct constructor: the resolved decl names the struct.
            return format!("{}({})", self.program.decl(decl_id).name(), rendered_args());
        }
        // Unresolved: a builtin scalar/vector/matrix constructor call, whose
        // callee text already matches the GLSL spelling after renaming.
        if let Some(ty) = self.program.expr(id).type_denoter.as_deref() {
            return format!("{}({})", glsl_type_name(ty), rendered_args());
        }
        format!("{callee}({})", rendered_args())
    }
}

fn buffer_qualifier(ty: &TypeDenoter) -> String {
    match ty {
        TypeDenoter::Buffer(kind, elem) => {
            let sampler = match kind {
                BufferKind::Texture1D => "sampler1D",
                BufferKind::Texture2D | BufferKind::Buffer => "sampler2D",
                BufferKind::Texture3D => "sampler3D",
                BufferKind::TextureCube => "samplerCube",
                BufferKind::Texture2DArray => "sampler2DArray",
                BufferKind::RWBuffer | BufferKind::RWTexture1D => "image1D",
                BufferKind::RWTexture2D => "image2D",
                BufferKind::RWTexture3D => "image3D",
                BufferKind::StructuredBuffer
                | BufferKind::RWStructuredBuffer
                | BufferKind::AppendStructuredBuffer
                | BufferKind::ConsumeStructuredBuffer => "buffer",
                BufferKind::ConstantBuffer => "uniform",
            };
            match elem {
                Some(e) if matches!(kind, BufferKind::StructuredBuffer | BufferKind::RWStructuredBuffer) => {
                    format!("{sampler} /* element: {} */", glsl_type_name(e))
                }
                _ => sampler.to_string(),
            }
        }
        other => glsl_type_name(other),
    }
}

fn array_suffix(dims: &[Option<u32>]) -> String {
    dims.iter()
        .map(|d| match d {
            Some(n) => format!("[{n}]"),
            None => "[]".to_string(),
        })
        .collect()
}

fn literal_text(lit: &Literal) -> String {
    match lit {
        Literal::Int(v, NumericSuffix::Unsigned) => format!("{v}u"),
        Literal::Int(v, _) => v.to_string(),
        Literal::Float(v, _) => {
            if v.fract() == 0.0 {
                format!("{v:.1}f")
            } else {
                let mut s = String::new();
                let _ = write!(s, "{v}");
                s.push('f');
                s
            }
        }
        Literal::Bool(b) => b.to_string(),
        Literal::String(s) => format!("\"{s}\""),
        Literal::Char(c) => format!("'{c}'"),
    }
}

fn binary_op_text(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::Le => "<=",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::Shl => "<<",
        BinaryOp::Shr => ">>",
    }
}

fn unary_op_text(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Neg => "-",
        UnaryOp::Not => "!",
        UnaryOp::BitNot => "~",
        UnaryOp::PreInc => "++",
        UnaryOp::PreDec => "--",
    }
}

fn post_unary_op_text(op: PostUnaryOp) -> &'static str {
    match op {
        PostUnaryOp::PostInc => "++",
        PostUnaryOp::PostDec => "--",
    }
}

fn assign_op_text(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::Add => "+=",
        AssignOp::Sub => "-=",
        AssignOp::Mul => "*=",
        AssignOp::Div => "/=",
        AssignOp::Mod => "%=",
        AssignOp::And => "&=",
        AssignOp::Or => "|=",
        AssignOp::Xor => "^=",
        AssignOp::Shl => "<<=",
        AssignOp::Shr => ">>=",
    }
}

/// Renames HLSL intrinsics with a differently-spelled direct GLSL
/// equivalent. `saturate` is handled separately (its GLSL equivalent takes
/// two extra arguments); `mul` is rewritten earlier, by
/// `transform::expr_convert`, into a `Binary(Mul, ..)` and never reaches
/// here.
fn translate_intrinsic(name: &str) -> Option<&'static str> {
    Some(match name {
        "lerp" => "mix",
        "frac" => "fract",
        "rsqrt" => "inversesqrt",
        "atan2" => "atan",
        "ddx" | "ddx_coarse" | "ddx_fine" => "dFdx",
        "ddy" | "ddy_coarse" | "ddy_fine" => "dFdy",
        "fmod" => "mod",
        _ => return None,
    })
}

fn glsl_type_name(ty: &TypeDenoter) -> String {
    match ty.get_aliased() {
        TypeDenoter::Void => "void".to_string(),
        TypeDenoter::Base(b) => base_type_name(*b).to_string(),
        TypeDenoter::Vector(b, n) => format!("{}vec{}", vector_prefix(*b), n),
        TypeDenoter::Matrix(b, r, c) if r == c => format!("mat{r}"),
        TypeDenoter::Matrix(_, r, c) => format!("mat{c}x{r}"),
        TypeDenoter::Buffer(..) => buffer_qualifier(ty.get_aliased()),
        TypeDenoter::Sampler(kind) => match kind {
            SamplerKind::SamplerState => "sampler".to_string(),
            SamplerKind::SamplerComparisonState => "samplerShadow".to_string(),
        },
        TypeDenoter::Struct(_, name) => name.to_string(),
        TypeDenoter::Array(elem, _) => glsl_type_name(elem),
        TypeDenoter::Alias(_, target) => glsl_type_name(target),
    }
}

fn base_type_name(b: BaseType) -> &'static str {
    match b {
        BaseType::Bool => "bool",
        BaseType::Int => "int",
        BaseType::Uint => "uint",
        BaseType::Half => "float",
        BaseType::Float => "float",
        BaseType::Double => "double",
    }
}

fn vector_prefix(b: BaseType) -> &'static str {
    match b {
        BaseType::Bool => "b",
        BaseType::Int => "i",
        BaseType::Uint => "u",
        BaseType::Double => "d",
        BaseType::Half | BaseType::Float => "",
    }
}
