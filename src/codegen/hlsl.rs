//! `HlslGenerator`, per `spec.md` §4.8: re-emits HLSL source text from a
//! transformed [`Program`] targeting [`crate::api::ShaderVersion::Hlsl5`].
//! Unlike the GLSL family, HLSL carries semantics/registers on declarations
//! directly and supports overload resolution, so no entry-point IO
//! flattening or struct suppression ever applies here — `semantic::entry_point`
//! only flattens for `ShaderVersion::is_glsl_family()` targets.

use std::fmt::Write as _;

use crate::api::{Extensions, ShaderOutput};
use crate::ast::{
    Annotation, AssignOp, BaseType, BinaryOp, BufferKind, Decorators, NodeFlags, ParamDir,
    PostUnaryOp, Program, SamplerKind, StmtId, StmtKind, TypeDenoter, UnaryOp, ExprId, ExprKind,
    DeclId, DeclKind,
};
use crate::codegen::writer::IndentedWriter;
use crate::lexer::{Literal, NumericSuffix};

use super::CodeGenerator;

pub struct HlslGenerator;

impl CodeGenerator for HlslGenerator {
    fn generate(&self, program: &Program, output: &ShaderOutput, _extensions: Extensions) -> String {
        let mut ctx = Ctx { program, output, w: IndentedWriter::new() };
        for id in program.globals.clone() {
            if !program.decl(id).flags.contains(NodeFlags::REACHABLE) {
                continue;
            }
            ctx.emit_decl(id);
        }
        ctx.w.into_string()
    }
}

struct Ctx<'a> {
    program: &'a Program,
    output: &'a ShaderOutput,
    w: IndentedWriter,
}

impl<'a> Ctx<'a> {
    fn emit_decl(&mut self, id: DeclId) {
        let decl = self.program.decl(id).clone();
        match &decl.kind {
            DeclKind::Alias(a) => {
                self.w.write_line(&format!("typedef {} {};", hlsl_type_name(&a.target), a.name));
            }
            DeclKind::Struct(s) => {
                self.w.write_line(&format!("struct {} {{", s.name));
                self.w.push_indent();
                for field in &s.fields {
                    let semantic = field
                        .decorators
                        .semantic
                        .as_ref()
                        .map(|sem| format!(" : {}", semantic_text(sem)))
                        .unwrap_or_default();
                    self.w.write_line(&format!(
                        "{} {}{}{};",
                        hlsl_type_name(&field.type_denoter),
                        field.name,
                        array_suffix(&field.array_dims),
                        semantic
                    ));
                }
                self.w.pop_indent();
                self.w.write_line("};");
                self.w.newline();
            }
            DeclKind::Sampler(s) => {
                let name = match sampler_kind(&s.type_denoter) {
                    Some(SamplerKind::SamplerState) => "SamplerState",
                    Some(SamplerKind::SamplerComparisonState) => "SamplerComparisonState",
                    None => "SamplerState",
                };
                self.w.write_line(&format!("{name} {}{};", s.name, decorator_suffix(&s.decorators)));
            }
            DeclKind::Buffer(b) => {
                self.w.write_line(&format!(
                    "{} {}{};",
                    hlsl_type_name(&b.type_denoter),
                    b.name,
                    decorator_suffix(&b.decorators)
                ));
            }
            DeclKind::UniformBuffer(cb) => {
                let keyword = if cb.is_texture_buffer { "tbuffer" } else { "cbuffer" };
                self.w.write_line(&format!("{keyword} {}{} {{", cb.name, decorator_suffix(&cb.decorators)));
                self.w.push_indent();
                for member in &cb.members {
                    self.w.write_line(&format!(
                        "{} {}{};",
                        hlsl_type_name(&member.type_denoter),
                        member.name,
                        array_suffix(&member.array_dims)
                    ));
                }
                self.w.pop_indent();
                self.w.write_line("};");
                self.w.newline();
            }
            DeclKind::Variable(v) => {
                let initializer = match v.initializer {
                    Some(init) => format!(" = {}", self.expr(init)),
                    None => String::new(),
                };
                let qualifier = if v.storage.is_static {
                    "static "
                } else if v.storage.is_uniform {
                    "uniform "
                } else {
                    ""
                };
                self.w.write_line(&format!(
                    "{qualifier}{} {}{}{}{};",
                    hlsl_type_name(&v.type_denoter),
                    v.name,
                    array_suffix(&v.array_dims),
                    decorator_suffix(&v.decorators),
                    initializer
                ));
            }
            DeclKind::Function(f) => {
                for annotation in &f.annotations {
                    self.w.write_line(&annotation_text(self.program, annotation));
                }
                let name = f.mangled_name.clone().unwrap_or_else(|| f.name.clone());
                let params: Vec<String> = f
                    .params
                    .iter()
                    .map(|p| {
                        let dir = match p.dir {
                            ParamDir::In => "",
                            ParamDir::Out => "out ",
                            ParamDir::InOut => "inout ",
                        };
                        let semantic = p
                            .decorators
                            .semantic
                            .as_ref()
                            .map(|sem| format!(" : {}", semantic_text(sem)))
                            .unwrap_or_default();
                        format!(
                            "{dir}{} {}{}{}",
                            hlsl_type_name(&p.type_denoter),
                            p.name,
                            array_suffix(&p.array_dims),
                            semantic
                        )
                    })
                    .collect();
                let return_semantic = f
                    .return_semantic
                    .as_ref()
                    .map(|sem| format!(" : {}", semantic_text(sem)))
                    .unwrap_or_default();
                self.w.write_line(&format!(
                    "{} {}({}){return_semantic}",
                    hlsl_type_name(&f.return_type),
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
                        hlsl_type_name(&v.type_denoter),
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
                self.stmt(body);
            }
            StmtKind::While { condition, body } => {
                self.w.write_line(&format!("while ({})", self.expr(condition)));
                self.stmt(body);
            }
            StmtKind::DoWhile { body, condition } => {
                self.w.write_line("do");
                self.stmt(body);
                self.w.write_line(&format!("while ({});", self.expr(condition)));
            }
            StmtKind::If { condition, then_branch, else_branch } => {
                self.w.write_line(&format!("if ({})", self.expr(condition)));
                self.stmt(then_branch);
                if let Some(else_b) = else_branch {
                    self.w.write_line("else");
                    self.stmt(else_b);
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

    fn stmt_inline(&mut self, id: StmtId) -> String {
        match &self.program.stmt(id).kind {
            StmtKind::VarDecl(decl_id) => {
                if let DeclKind::Variable(v) = &self.program.decl(*decl_id).kind {
                    let initializer = match v.initializer {
                        Some(init) => format!(" = {}", self.expr(init)),
                        None => String::new(),
                    };
                    format!("{} {}{}", hlsl_type_name(&v.type_denoter), v.name, initializer)
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
            ExprKind::Call { callee, args, resolved } => {
                let rendered_args = args.iter().map(|&a| self.expr(a)).collect::<Vec<_>>().join(", ");
                let name = match resolved {
                    Some(decl_id) => match self.program.decl(*decl_id).as_function() {
                        Some(f) => f.mangled_name.clone().unwrap_or_else(|| f.name.clone()),
                        None => callee.clone(),
                    },
                    None => callee.clone(),
                };
                format!("{name}({rendered_args})")
            }
            ExprKind::Bracket(base, index) => format!("{}[{}]", self.expr(*base), self.expr(*index)),
            ExprKind::Object { base: Some(base), member, .. } => format!("{}.{}", self.expr(*base), member),
            ExprKind::Object { base: None, member, resolved } => match resolved {
                Some(decl_id) => self.program.decl(*decl_id).name().to_string(),
                None => member.to_string(),
            },
            ExprKind::Initializer(elems) => {
                format!("{{ {} }}", elems.iter().map(|&e| self.expr(e)).collect::<Vec<_>>().join(", "))
            }
            ExprKind::Cast(ty, operand) => format!("({})({})", hlsl_type_name(ty), self.expr(*operand)),
            ExprKind::TypeSpecifier(ty) => hlsl_type_name(ty),
            ExprKind::Assign(op, target, value) => {
                format!("{} {} {}", self.expr(*target), assign_op_text(*op), self.expr(*value))
            }
        }
    }
}

fn sampler_kind(ty: &TypeDenoter) -> Option<SamplerKind> {
    match ty.get_aliased() {
        TypeDenoter::Sampler(kind) => Some(*kind),
        _ => None,
    }
}

fn decorator_suffix(decorators: &Decorators) -> String {
    let mut parts = Vec::new();
    if let Some(reg) = &decorators.register {
        let space = reg.space.map(|s| format!(", space{s}")).unwrap_or_default();
        parts.push(format!("register({}{}{space})", reg.register_class, reg.slot));
    }
    if let Some(po) = &decorators.pack_offset {
        let component = po.component.map(|c| format!(".{c}")).unwrap_or_default();
        parts.push(format!("packoffset(c{}{component})", po.register));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" : {}", parts.join(", "))
    }
}

fn semantic_text(sem: &crate::ast::Semantic) -> String {
    match sem.index {
        Some(i) => format!("{}{}", sem.name, i),
        None => sem.name.to_string(),
    }
}

fn annotation_text(program: &Program, ann: &Annotation) -> String {
    if ann.args.is_empty() {
        format!("[{}]", ann.name)
    } else {
        let args: Vec<String> = ann
            .args
            .iter()
            .map(|&e| match &program.expr(e).kind {
                ExprKind::Literal(lit) => literal_text(lit),
                ExprKind::Object { base: None, member, .. } => member.to_string(),
                _ => String::new(),
            })
            .collect();
        format!("[{}({})]", ann.name, args.join(", "))
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
        Literal::Int(v, NumericSuffix::Long) => format!("{v}L"),
        Literal::Int(v, _) => v.to_string(),
        Literal::Float(v, suffix) => {
            let mut s = String::new();
            if v.fract() == 0.0 {
                let _ = write!(s, "{v:.1}");
            } else {
                let _ = write!(s, "{v}");
            }
            match suffix {
                NumericSuffix::Half => s.push('h'),
                NumericSuffix::Float => s.push('f'),
                NumericSuffix::Long => s.push('l'),
                NumericSuffix::None | NumericSuffix::Unsigned => {}
            }
            s
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

fn hlsl_type_name(ty: &TypeDenoter) -> String {
    match ty {
        TypeDenoter::Void => "void".to_string(),
        TypeDenoter::Base(b) => base_type_name(*b).to_string(),
        TypeDenoter::Vector(b, n) => format!("{}{n}", base_type_name(*b)),
        TypeDenoter::Matrix(b, r, c) => format!("{}{r}x{c}", base_type_name(*b)),
        TypeDenoter::Buffer(kind, elem) => {
            let name = buffer_kind_name(*kind);
            match elem {
                Some(e) if kind.takes_generic_argument() => format!("{name}<{}>", hlsl_type_name(e)),
                _ => name.to_string(),
            }
        }
        TypeDenoter::Sampler(kind) => match kind {
            SamplerKind::SamplerState => "SamplerState".to_string(),
            SamplerKind::SamplerComparisonState => "SamplerComparisonState".to_string(),
        },
        TypeDenoter::Struct(_, name) => name.to_string(),
        TypeDenoter::Array(elem, _) => hlsl_type_name(elem),
        TypeDenoter::Alias(name, _) => name.to_string(),
    }
}

fn base_type_name(b: BaseType) -> &'static str {
    match b {
        BaseType::Bool => "bool",
        BaseType::Int => "int",
        BaseType::Uint => "uint",
        BaseType::Half => "half",
        BaseType::Float => "float",
        BaseType::Double => "double",
    }
}

fn buffer_kind_name(kind: BufferKind) -> &'static str {
    match kind {
        BufferKind::Buffer => "Buffer",
        BufferKind::Texture1D => "Texture1D",
        BufferKind::Texture2D => "Texture2D",
        BufferKind::Texture3D => "Texture3D",
        BufferKind::TextureCube => "TextureCube",
        BufferKind::Texture2DArray => "Texture2DArray",
        BufferKind::RWBuffer => "RWBuffer",
        BufferKind::RWTexture1D => "RWTexture1D",
        BufferKind::RWTexture2D => "RWTexture2D",
        BufferKind::RWTexture3D => "RWTexture3D",
        BufferKind::StructuredBuffer => "StructuredBuffer",
        BufferKind::RWStructuredBuffer => "RWStructuredBuffer",
        BufferKind::AppendStructuredBuffer => "AppendStructuredBuffer",
        BufferKind::ConsumeStructuredBuffer => "ConsumeStructuredBuffer",
        BufferKind::ConstantBuffer => "ConstantBuffer",
    }
}
