//! Entry-point processing, per `spec.md` §4.6: "identifies the function
//! named by `ShaderInput.entryPoint`, flags it, and — for output dialects
//! that do not carry semantics on parameters — flattens input/output
//! parameter structs into global IO variables, generating a secondary
//! wrapper entry point."

use std::rc::Rc;

use crate::api::{ShaderTarget, ShaderVersion};
use crate::ast::{
    Annotation, ComputeLayout, Decorators, ExprKind, FlattenedIoVar, FragmentLayout, FunctionDecl,
    GeometryLayout, Interpolation, IoSource, NodeFlags, Param, ParamDir, Program, Semantic, StmtKind,
    StorageClass, TessControlLayout, TessEvalLayout, TypeDenoter, VariableDecl,
};
use crate::diagnostics::{Log, Report};
use crate::lexer::Literal;
use crate::source::SourceRange;

/// Parameters of entry-point processing, gathered from `ShaderInput`/
/// `ShaderOutput` so this module has no dependency on the pipeline that
/// drives it.
pub struct EntryPointRequest<'a> {
    pub entry_point: &'a str,
    pub secondary_entry_point: Option<&'a str>,
    pub target: ShaderTarget,
    pub version: ShaderVersion,
}

/// Locates the entry point, flags it, populates `program.stages`, and (for
/// GLSL-family outputs) flattens its IO into global variables behind a
/// synthesized wrapper. Returns `false` (with a `SemanticError`-flavored
/// diagnostic) if the named entry point does not exist or is not a
/// function.
pub fn process(program: &mut Program, request: &EntryPointRequest, log: &mut dyn Log) -> bool {
    let Some(entry_id) = program.find_global_by_name(request.entry_point) else {
        log.report(Report::error(format!(
            "entry point '{}' not found",
            request.entry_point
        )));
        return false;
    };
    if program.decl(entry_id).as_function().is_none() {
        log.report(Report::error(format!("'{}' is not a function", request.entry_point)));
        return false;
    }

    program.decl_mut(entry_id).flags.insert(NodeFlags::IS_ENTRY_POINT);
    program.entry_point = Some(entry_id);

    populate_stage_layout(program, entry_id, request.target, log);

    if request.version.is_glsl_family() {
        flatten_io(program, entry_id, request, log);
    }

    true
}

fn find_annotation<'p>(annotations: &'p [Annotation], name: &str) -> Option<&'p Annotation> {
    annotations.iter().find(|a| a.name.as_ref().eq_ignore_ascii_case(name))
}

fn literal_u32(program: &Program, expr: crate::ast::ExprId) -> Option<u32> {
    match &program.expr(expr).kind {
        ExprKind::Literal(Literal::Int(v, _)) => Some(*v as u32),
        _ => None,
    }
}

fn literal_f32(program: &Program, expr: crate::ast::ExprId) -> Option<f32> {
    match &program.expr(expr).kind {
        ExprKind::Literal(Literal::Float(v, _)) => Some(*v as f32),
        ExprKind::Literal(Literal::Int(v, _)) => Some(*v as f32),
        _ => None,
    }
}

fn annotation_identifier(program: &Program, expr: crate::ast::ExprId) -> Option<Rc<str>> {
    match &program.expr(expr).kind {
        ExprKind::Object { base: None, member, .. } => Some(member.clone()),
        _ => None,
    }
}

/// Reads the per-stage layout attributes (`spec.md` §3) off the entry
/// point's `[attribute(...)]` annotations and stores them on
/// `program.stages`.
fn populate_stage_layout(program: &mut Program, entry_id: crate::ast::DeclId, target: ShaderTarget, log: &mut dyn Log) {
    let annotations = program.decl(entry_id).as_function().unwrap().annotations.clone();

    match target {
        ShaderTarget::Compute => {
            let mut layout = ComputeLayout::default();
            if let Some(ann) = find_annotation(&annotations, "numthreads") {
                if ann.args.len() == 3 {
                    for i in 0..3 {
                        layout.num_threads[i] = literal_u32(program, ann.args[i]).unwrap_or(1);
                    }
                } else {
                    log.report(Report::error("[numthreads] requires exactly 3 arguments"));
                }
            } else {
                log.report(Report::warning("compute entry point is missing a [numthreads] attribute"));
            }
            program.stages.compute = Some(layout);
        }
        ShaderTarget::TessControl => {
            let mut layout = TessControlLayout::default();
            if let Some(ann) = find_annotation(&annotations, "outputcontrolpoints") {
                layout.output_control_points = ann.args.first().and_then(|&e| literal_u32(program, e));
            }
            if let Some(ann) = find_annotation(&annotations, "maxtessfactor") {
                layout.max_tess_factor = ann.args.first().and_then(|&e| literal_f32(program, e));
            }
            if let Some(ann) = find_annotation(&annotations, "partitioning") {
                layout.partitioning = ann.args.first().and_then(|&e| annotation_identifier(program, e));
            }
            if let Some(ann) = find_annotation(&annotations, "outputtopology") {
                layout.output_topology = ann.args.first().and_then(|&e| annotation_identifier(program, e));
            }
            program.stages.tess_control = Some(layout);
        }
        ShaderTarget::TessEval => {
            let mut layout = TessEvalLayout::default();
            if let Some(ann) = find_annotation(&annotations, "domain") {
                layout.domain_type = ann.args.first().and_then(|&e| annotation_identifier(program, e));
            }
            if let Some(ann) = find_annotation(&annotations, "partitioning") {
                layout.partitioning = ann.args.first().and_then(|&e| annotation_identifier(program, e));
            }
            program.stages.tess_eval = Some(layout);
        }
        ShaderTarget::Geometry => {
            let mut layout = GeometryLayout::default();
            if let Some(ann) = find_annotation(&annotations, "maxvertexcount") {
                layout.max_vertices = ann.args.first().and_then(|&e| literal_u32(program, e));
            }
            program.stages.geometry = Some(layout);
        }
        ShaderTarget::Fragment => {
            let layout = FragmentLayout {
                early_depth_stencil: find_annotation(&annotations, "earlydepthstencil").is_some(),
            };
            program.stages.fragment = Some(layout);
        }
        ShaderTarget::Vertex | ShaderTarget::Undefined => {}
    }
}

fn synth_object(program: &mut Program, range: SourceRange, decl_id: crate::ast::DeclId, ty: Rc<TypeDenoter>) -> crate::ast::ExprId {
    let id = program.alloc_expr(range, ExprKind::Object { base: None, member: Rc::from(""), resolved: Some(decl_id) });
    program.expr_mut(id).type_denoter = Some(ty);
    id
}

fn synth_field_access(
    program: &mut Program,
    range: SourceRange,
    base: crate::ast::ExprId,
    field_name: Rc<str>,
    ty: Rc<TypeDenoter>,
) -> crate::ast::ExprId {
    let id = program.alloc_expr(range, ExprKind::Object { base: Some(base), member: field_name, resolved: None });
    program.expr_mut(id).type_denoter = Some(ty);
    id
}

fn synth_assign_stmt(program: &mut Program, range: SourceRange, target: crate::ast::ExprId, value: crate::ast::ExprId) -> crate::ast::StmtId {
    let assign = program.alloc_expr(range, ExprKind::Assign(crate::ast::AssignOp::Assign, target, value));
    program.alloc_stmt(range, StmtKind::Expr(assign))
}

fn synth_global_var(
    program: &mut Program,
    range: SourceRange,
    name: Rc<str>,
    ty: Rc<TypeDenoter>,
    array_dims: Vec<Option<u32>>,
    semantic: Semantic,
) -> crate::ast::DeclId {
    let id = program.alloc_decl(
        range,
        crate::ast::DeclKind::Variable(VariableDecl {
            name,
            storage: StorageClass::default(),
            interpolation: Interpolation::Default,
            type_denoter: ty,
            array_dims,
            decorators: Decorators { semantic: Some(semantic), ..Decorators::default() },
            initializer: None,
            owner_cbuffer: None,
        }),
    );
    program.decl_mut(id).flags.insert(NodeFlags::GENERATED);
    program.globals.push(id);
    id
}

/// Flattens the entry point's struct parameters/return into global IO
/// variables and builds the parameterless wrapper function that calls
/// through to it, per `spec.md` §4.6.
fn flatten_io(program: &mut Program, entry_id: crate::ast::DeclId, request: &EntryPointRequest, log: &mut dyn Log) {
    let range = program.decl(entry_id).range;
    let f: FunctionDecl = program.decl(entry_id).as_function().unwrap().clone();

    let mut io_vars: Vec<FlattenedIoVar> = Vec::new();
    let mut call_args: Vec<crate::ast::ExprId> = Vec::with_capacity(f.params.len());
    let mut pre_call: Vec<crate::ast::StmtId> = Vec::new();
    let mut post_call: Vec<crate::ast::StmtId> = Vec::new();

    for (index, param) in f.params.iter().enumerate() {
        match param.type_denoter.get_aliased() {
            TypeDenoter::Struct(struct_id, _) => {
                let fields = program.decl(*struct_id).as_struct().unwrap().fields.clone();
                let local_name: Rc<str> = Rc::from(format!("_xc_local_{}", param.name));
                let local_id = program.alloc_decl(
                    range,
                    crate::ast::DeclKind::Variable(VariableDecl {
                        name: local_name.clone(),
                        storage: StorageClass::default(),
                        interpolation: Interpolation::Default,
                        type_denoter: param.type_denoter.clone(),
                        array_dims: Vec::new(),
                        decorators: Decorators::default(),
                        initializer: None,
                        owner_cbuffer: None,
                    }),
                );
                program.decl_mut(local_id).flags.insert(NodeFlags::GENERATED);
                let local_decl_stmt = program.alloc_stmt(range, StmtKind::VarDecl(local_id));
                pre_call.push(local_decl_stmt);
                let local_obj = synth_object(program, range, local_id, param.type_denoter.clone());

                for field in &fields {
                    let Some(semantic) = field.decorators.semantic.clone() else {
                        log.report(Report::warning(format!(
                            "field '{}' of '{}' has no semantic; dropped during IO flattening",
                            field.name, param.name
                        )));
                        continue;
                    };
                    let global_name: Rc<str> = Rc::from(format!("_xc_{}_{}", param.name, field.name));
                    let global_id = synth_global_var(
                        program,
                        range,
                        global_name,
                        field.type_denoter.clone(),
                        field.array_dims.clone(),
                        semantic.clone(),
                    );
                    io_vars.push(FlattenedIoVar {
                        global: global_id,
                        semantic,
                        dir: param.dir,
                        source: IoSource::Param { index, field: Some(field.name.clone()) },
                    });

                    if matches!(param.dir, ParamDir::In | ParamDir::InOut) {
                        let target = synth_field_access(program, range, local_obj, field.name.clone(), field.type_denoter.clone());
                        let value = synth_object(program, range, global_id, field.type_denoter.clone());
                        pre_call.push(synth_assign_stmt(program, range, target, value));
                    }
                    if matches!(param.dir, ParamDir::Out | ParamDir::InOut) {
                        let target = synth_object(program, range, global_id, field.type_denoter.clone());
                        let value = synth_field_access(program, range, local_obj, field.name.clone(), field.type_denoter.clone());
                        post_call.push(synth_assign_stmt(program, range, target, value));
                    }
                }
                call_args.push(synth_object(program, range, local_id, param.type_denoter.clone()));
            }
            _ => {
                let Some(semantic) = param.decorators.semantic.clone() else {
                    log.report(Report::warning(format!(
                        "entry-point parameter '{}' has no semantic; dropped during IO flattening",
                        param.name
                    )));
                    let dummy_name: Rc<str> = Rc::from(format!("_xc_unbound_{}", param.name));
                    let dummy_id = program.alloc_decl(
                        range,
                        crate::ast::DeclKind::Variable(VariableDecl {
                            name: dummy_name,
                            storage: StorageClass::default(),
                            interpolation: Interpolation::Default,
                            type_denoter: param.type_denoter.clone(),
                            array_dims: Vec::new(),
                            decorators: Decorators::default(),
                            initializer: None,
                            owner_cbuffer: None,
                        }),
                    );
                    program.decl_mut(dummy_id).flags.insert(NodeFlags::GENERATED);
                    pre_call.push(program.alloc_stmt(range, StmtKind::VarDecl(dummy_id)));
                    call_args.push(synth_object(program, range, dummy_id, param.type_denoter.clone()));
                    continue;
                };
                let global_name: Rc<str> = Rc::from(format!("_xc_{}", param.name));
                let global_id = synth_global_var(
                    program,
                    range,
                    global_name,
                    param.type_denoter.clone(),
                    param.array_dims.clone(),
                    semantic.clone(),
                );
                io_vars.push(FlattenedIoVar {
                    global: global_id,
                    semantic,
                    dir: param.dir,
                    source: IoSource::Param { index, field: None },
                });
                call_args.push(synth_object(program, range, global_id, param.type_denoter.clone()));
            }
        }
    }

    let call_expr = program.alloc_expr(
        range,
        ExprKind::Call { callee: f.name.clone(), args: call_args, resolved: Some(entry_id) },
    );
    program.expr_mut(call_expr).type_denoter = Some(f.return_type.clone());

    let mut body_stmts: Vec<crate::ast::StmtId> = pre_call;

    match f.return_type.get_aliased() {
        TypeDenoter::Void => {
            body_stmts.push(program.alloc_stmt(range, StmtKind::Expr(call_expr)));
        }
        TypeDenoter::Struct(struct_id, _) => {
            let fields = program.decl(*struct_id).as_struct().unwrap().fields.clone();
            let ret_local_name: Rc<str> = Rc::from("_xc_ret");
            let ret_local_id = program.alloc_decl(
                range,
                crate::ast::DeclKind::Variable(VariableDecl {
                    name: ret_local_name,
                    storage: StorageClass::default(),
                    interpolation: Interpolation::Default,
                    type_denoter: f.return_type.clone(),
                    array_dims: Vec::new(),
                    decorators: Decorators::default(),
                    initializer: Some(call_expr),
                    owner_cbuffer: None,
                }),
            );
            body_stmts.push(program.alloc_stmt(range, StmtKind::VarDecl(ret_local_id)));
            let ret_local_obj = synth_object(program, range, ret_local_id, f.return_type.clone());
            for field in &fields {
                let Some(semantic) = field.decorators.semantic.clone() else { continue };
                let global_name: Rc<str> = Rc::from(format!("_xc_ret_{}", field.name));
                let global_id = synth_global_var(
                    program,
                    range,
                    global_name,
                    field.type_denoter.clone(),
                    field.array_dims.clone(),
                    semantic.clone(),
                );
                io_vars.push(FlattenedIoVar {
                    global: global_id,
                    semantic,
                    dir: ParamDir::Out,
                    source: IoSource::Return { field: Some(field.name.clone()) },
                });
                let target = synth_object(program, range, global_id, field.type_denoter.clone());
                let value = synth_field_access(program, range, ret_local_obj, field.name.clone(), field.type_denoter.clone());
                body_stmts.push(synth_assign_stmt(program, range, target, value));
            }
        }
        _ => {
            if let Some(semantic) = f.return_semantic.clone() {
                let global_name: Rc<str> = Rc::from(format!("_xc_out_{}", semantic.name));
                let global_id = synth_global_var(program, range, global_name, f.return_type.clone(), Vec::new(), semantic.clone());
                io_vars.push(FlattenedIoVar {
                    global: global_id,
                    semantic,
                    dir: ParamDir::Out,
                    source: IoSource::Return { field: None },
                });
                let target = synth_object(program, range, global_id, f.return_type.clone());
                body_stmts.push(synth_assign_stmt(program, range, target, call_expr));
            } else {
                log.report(Report::warning("entry point return value has no semantic; value is discarded"));
                body_stmts.push(program.alloc_stmt(range, StmtKind::Expr(call_expr)));
            }
        }
    }

    body_stmts.extend(post_call);
    let body_block = program.alloc_stmt(range, StmtKind::CodeBlock(body_stmts));

    let wrapper_name: Rc<str> = Rc::from(request.secondary_entry_point.unwrap_or("main"));
    let wrapper_id = program.alloc_decl(
        range,
        crate::ast::DeclKind::Function(FunctionDecl {
            name: wrapper_name,
            mangled_name: None,
            return_type: Rc::new(TypeDenoter::Void),
            return_semantic: None,
            params: Vec::<Param>::new(),
            body: Some(body_block),
            annotations: Vec::new(),
            is_entry_point_candidate: false,
        }),
    );
    program.decl_mut(wrapper_id).flags.insert(NodeFlags::GENERATED);
    program.globals.push(wrapper_id);
    program.secondary_entry_point = Some(wrapper_id);
    program.entry_point_io = crate::ast::EntryPointIo { vars: io_vars, wrapper: Some(wrapper_id) };
}
