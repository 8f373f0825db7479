//! Declaration grammar: structs, typedefs, constant/texture buffers,
//! functions, and variables, per `spec.md` §4.4.

use std::rc::Rc;

use crate::ast::{
    AliasDecl, Annotation, BufferDecl, BufferKind, DeclId, DeclKind, FunctionDecl, Interpolation,
    Param, ParamDir, SamplerDecl, SamplerKind, StorageClass, StructDecl, StructField,
    TypeDenoter, UniformBufferDecl, VariableDecl,
};
use crate::ast::types::parse_vector_matrix_type_name;
use crate::diagnostics::{Log, Report};
use crate::lexer::Punct;
use crate::parser::error::SyntaxError;
use crate::parser::Parser;

const STORAGE_KEYWORDS: &[&str] = &[
    "static", "uniform", "extern", "const", "volatile", "inline", "groupshared",
    "row_major", "column_major",
];

const INTERPOLATION_KEYWORDS: &[&str] = &[
    "linear", "centroid", "nointerpolation", "noperspective", "sample",
];

impl Parser {
    /// Parses one top-level declaration. Returns `None` (with a diagnostic
    /// already reported and the cursor synchronized) on a syntax error that
    /// could not be locally recovered.
    pub(super) fn parse_global_decl(&mut self, log: &mut dyn Log) -> Option<DeclId> {
        let annotations = self.parse_annotations(log);

        if self.check_keyword("struct") {
            return self.parse_struct_decl(annotations, log);
        }
        if self.eat_keyword("typedef") {
            return self.parse_typedef_decl(log);
        }
        if self.check_keyword("cbuffer") || self.check_keyword("tbuffer") {
            return self.parse_uniform_buffer_decl(log);
        }

        self.parse_function_or_variable_decl(annotations, log)
    }

    fn parse_storage_class(&mut self) -> StorageClass {
        let mut storage = StorageClass::default();
        loop {
            match &self.peek().kind {
                crate::lexer::TokenKind::Keyword(kw) if STORAGE_KEYWORDS.contains(kw) => {
                    match *kw {
                        "static" => storage.is_static = true,
                        "uniform" => storage.is_uniform = true,
                        "extern" => storage.is_extern = true,
                        "const" => storage.is_const = true,
                        "volatile" => storage.is_volatile = true,
                        "inline" => storage.is_inline = true,
                        "groupshared" => storage.is_groupshared = true,
                        // row_major/column_major affect only matrix layout
                        // in the output, tracked on the type denoter by the
                        // generator config rather than per-declaration
                        // storage; consumed here and otherwise ignored.
                        "row_major" | "column_major" => {}
                        _ => unreachable!(),
                    }
                    self.bump();
                }
                _ => break,
            }
        }
        storage
    }

    fn parse_interpolation(&mut self) -> Interpolation {
        match &self.peek().kind {
            crate::lexer::TokenKind::Keyword(kw) if INTERPOLATION_KEYWORDS.contains(kw) => {
                let interp = match *kw {
                    "linear" => Interpolation::Linear,
                    "centroid" => Interpolation::Centroid,
                    "nointerpolation" => Interpolation::NoInterpolation,
                    "noperspective" => Interpolation::NoPerspective,
                    "sample" => Interpolation::Sample,
                    _ => unreachable!(),
                };
                self.bump();
                interp
            }
            _ => Interpolation::Default,
        }
    }

    /// Attempts to parse a type-specifier starting at the cursor. Returns
    /// `None` (consuming nothing) if the current token cannot start one —
    /// the "type-specifier vs. expression start" disambiguation of
    /// `spec.md` §4.4.
    pub(super) fn try_parse_type_denoter(&mut self, log: &mut dyn Log) -> Option<Rc<TypeDenoter>> {
        if let crate::lexer::TokenKind::Keyword(kw) = &self.peek().kind {
            if let Some(base) = crate::ast::types::BaseType::from_name(kw) {
                self.bump();
                return Some(Rc::new(TypeDenoter::Base(base)));
            }
        }

        let name = self.peek().identifier()?.to_string();

        if let Some(td) = parse_vector_matrix_type_name(&name) {
            self.bump();
            return Some(Rc::new(td));
        }

        if let Some(kind) = BufferKind::from_name(&name) {
            self.bump();
            let elem = if kind.takes_generic_argument() && self.eat_punct(Punct::Lt) {
                let elem = self.try_parse_type_denoter(log);
                self.expect_punct(Punct::Gt, log);
                elem
            } else {
                None
            };
            return Some(Rc::new(TypeDenoter::Buffer(kind, elem)));
        }

        if let Some(kind) = SamplerKind::from_name(&name) {
            self.bump();
            return Some(Rc::new(TypeDenoter::Sampler(kind)));
        }

        if let Some(&decl_id) = self.program.known_type_names.get(name.as_str()) {
            self.bump();
            return Some(Rc::new(TypeDenoter::Struct(decl_id, Rc::from(name.as_str()))));
        }

        None
    }

    /// Parses zero or more trailing `[n]` / `[]` array dimensions.
    pub(super) fn parse_array_dims(&mut self, log: &mut dyn Log) -> Vec<Option<u32>> {
        let mut dims = Vec::new();
        while self.eat_punct(Punct::LBracket) {
            if self.eat_punct(Punct::RBracket) {
                dims.push(None);
                continue;
            }
            let expr = self.parse_assignment_expr(log);
            let n = self.const_fold_to_u32(expr);
            self.expect_punct(Punct::RBracket, log);
            dims.push(n);
        }
        dims
    }

    /// Folds a parsed array-dimension expression to a literal integer when
    /// possible. Array dimensions must be compile-time constant; anything
    /// fancier than a bare literal is left unresolved (`None`, meaning
    /// "unknown until semantic analysis", matching `ArrayDimension`'s
    /// bracket-expr variant in `spec.md` §3) rather than evaluated here —
    /// constant folding beyond literals is the analyzer's job.
    fn const_fold_to_u32(&self, expr: crate::ast::ExprId) -> Option<u32> {
        match &self.program.expr(expr).kind {
            crate::ast::ExprKind::Literal(crate::lexer::Literal::Int(v, _)) => Some(*v as u32),
            _ => None,
        }
    }

    fn parse_struct_decl(&mut self, _annotations: Vec<Annotation>, log: &mut dyn Log) -> Option<DeclId> {
        let start = self.current_range();
        self.bump(); // 'struct'
        let name = self.expect_identifier(log)?;
        self.expect_punct(Punct::LBrace, log);

        let mut fields = Vec::new();
        while !self.check_punct(Punct::RBrace) && !self.at_eof() {
            let _field_annotations = self.parse_annotations(log);
            let interpolation = self.parse_interpolation();
            let Some(type_denoter) = self.try_parse_type_denoter(log) else {
                log.report(
                    Report::error(SyntaxError::expected("a field type", self.peek()).to_string())
                        .at(self.current_range()),
                );
                self.synchronize();
                continue;
            };
            let Some(field_name) = self.expect_identifier(log) else {
                self.synchronize();
                continue;
            };
            let array_dims = self.parse_array_dims(log);
            let decorators = self.parse_trailing_decorators(log);
            self.expect_punct(Punct::Semi, log);
            fields.push(StructField {
                name: field_name,
                type_denoter,
                array_dims,
                interpolation,
                decorators,
            });
        }
        self.expect_punct(Punct::RBrace, log);
        self.eat_punct(Punct::Semi);

        let range = SourceRangeHelper::span(start, self.current_range());
        let decl_id = self.program.alloc_decl(range, DeclKind::Struct(StructDecl {
            name: name.clone(),
            fields,
        }));
        self.program.known_type_names.insert(name.clone(), decl_id);
        self.register_type_name(name);
        Some(decl_id)
    }

    fn parse_typedef_decl(&mut self, log: &mut dyn Log) -> Option<DeclId> {
        let start = self.current_range();
        let target = self.try_parse_type_denoter(log).or_else(|| {
            log.report(
                Report::error(SyntaxError::expected("a type", self.peek()).to_string())
                    .at(self.current_range()),
            );
            None
        })?;
        let name = self.expect_identifier(log)?;
        self.parse_array_dims(log); // typedef of an array type: dims folded into target if present
        self.expect_punct(Punct::Semi, log);

        let range = SourceRangeHelper::span(start, self.current_range());
        let decl_id = self.program.alloc_decl(
            range,
            DeclKind::Alias(AliasDecl {
                name: name.clone(),
                target,
            }),
        );
        self.program.known_type_names.insert(name.clone(), decl_id);
        self.register_type_name(name);
        Some(decl_id)
    }

    fn parse_uniform_buffer_decl(&mut self, log: &mut dyn Log) -> Option<DeclId> {
        let start = self.current_range();
        let is_texture_buffer = self.check_keyword("tbuffer");
        self.bump(); // 'cbuffer' | 'tbuffer'
        let name = self.expect_identifier(log)?;
        let decorators = self.parse_trailing_decorators(log);
        self.expect_punct(Punct::LBrace, log);

        let mut members = Vec::new();
        while !self.check_punct(Punct::RBrace) && !self.at_eof() {
            let storage = self.parse_storage_class();
            let interpolation = self.parse_interpolation();
            let Some(type_denoter) = self.try_parse_type_denoter(log) else {
                log.report(
                    Report::error(SyntaxError::expected("a member type", self.peek()).to_string())
                        .at(self.current_range()),
                );
                self.synchronize();
                continue;
            };
            let Some(member_name) = self.expect_identifier(log) else {
                self.synchronize();
                continue;
            };
            let array_dims = self.parse_array_dims(log);
            let member_decorators = self.parse_trailing_decorators(log);
            let initializer = if self.eat_punct(Punct::Assign) {
                Some(self.parse_assignment_expr(log))
            } else {
                None
            };
            self.expect_punct(Punct::Semi, log);
            members.push(VariableDecl {
                name: member_name,
                storage,
                interpolation,
                type_denoter,
                array_dims,
                decorators: member_decorators,
                initializer,
                owner_cbuffer: None,
            });
        }
        self.expect_punct(Punct::RBrace, log);
        self.eat_punct(Punct::Semi);

        let range = SourceRangeHelper::span(start, self.current_range());
        Some(self.program.alloc_decl(
            range,
            DeclKind::UniformBuffer(UniformBufferDecl {
                name,
                is_texture_buffer,
                members,
                decorators,
                member_decl_ids: Vec::new(),
            }),
        ))
    }

    fn parse_function_or_variable_decl(
        &mut self,
        annotations: Vec<Annotation>,
        log: &mut dyn Log,
    ) -> Option<DeclId> {
        let start = self.current_range();
        let storage = self.parse_storage_class();
        let interpolation = self.parse_interpolation();

        let Some(type_denoter) = self.try_parse_type_denoter(log) else {
            log.report(
                Report::error(SyntaxError::expected("a declaration", self.peek()).to_string())
                    .at(self.current_range()),
            );
            self.synchronize();
            return None;
        };
        let Some(name) = self.expect_identifier(log) else {
            self.synchronize();
            return None;
        };

        if self.check_punct(Punct::LParen) {
            return self.parse_function_decl(start, type_denoter, name, annotations, log);
        }

        self.parse_variable_decl(start, storage, interpolation, type_denoter, name, log)
    }

    fn parse_function_decl(
        &mut self,
        start: crate::source::SourceRange,
        return_type: Rc<TypeDenoter>,
        name: Rc<str>,
        annotations: Vec<Annotation>,
        log: &mut dyn Log,
    ) -> Option<DeclId> {
        self.bump(); // '('
        let mut params = Vec::new();
        if !self.check_punct(Punct::RParen) {
            loop {
                params.push(self.parse_param(log)?);
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RParen, log);

        let return_semantic = if self.eat_punct(Punct::Colon) {
            let semantic_name = self.expect_identifier(log)?;
            Some(crate::ast::Semantic {
                name: semantic_name,
                index: None,
            })
        } else {
            None
        };

        let fn_annotations = {
            let mut a = annotations;
            a.extend(self.parse_annotations(log));
            a
        };

        let body = if self.check_punct(Punct::LBrace) {
            Some(self.parse_block_stmt(log))
        } else {
            self.expect_punct(Punct::Semi, log);
            None
        };

        let range = SourceRangeHelper::span(start, self.current_range());
        Some(self.program.alloc_decl(
            range,
            DeclKind::Function(FunctionDecl {
                name,
                mangled_name: None,
                return_type,
                return_semantic,
                params,
                body,
                annotations: fn_annotations,
                is_entry_point_candidate: false,
            }),
        ))
    }

    fn parse_param(&mut self, log: &mut dyn Log) -> Option<Param> {
        let start = self.current_range();
        let mut dir = ParamDir::In;
        loop {
            if self.eat_keyword("in") {
                dir = ParamDir::In;
            } else if self.eat_keyword("out") {
                dir = ParamDir::Out;
            } else if self.eat_keyword("inout") {
                dir = ParamDir::InOut;
            } else if self.check_keyword("uniform") || self.check_keyword("const") {
                self.bump(); // storage on a parameter; legality checked by the analyzer
            } else {
                break;
            }
        }
        let interpolation = self.parse_interpolation();
        let type_denoter = self.try_parse_type_denoter(log).or_else(|| {
            log.report(
                Report::error(SyntaxError::expected("a parameter type", self.peek()).to_string())
                    .at(self.current_range()),
            );
            None
        })?;
        let name = self.expect_identifier(log)?;
        let array_dims = self.parse_array_dims(log);
        let decorators = self.parse_trailing_decorators(log);
        let default_value = if self.eat_punct(Punct::Assign) {
            Some(self.parse_assignment_expr(log))
        } else {
            None
        };
        let range = SourceRangeHelper::span(start, self.current_range());
        Some(Param {
            name,
            dir,
            interpolation,
            type_denoter,
            array_dims,
            decorators,
            default_value,
            range,
            resolved_field_of: None,
            shadow_decl: None,
        })
    }

    fn parse_variable_decl(
        &mut self,
        start: crate::source::SourceRange,
        storage: StorageClass,
        interpolation: Interpolation,
        type_denoter: Rc<TypeDenoter>,
        name: Rc<str>,
        log: &mut dyn Log,
    ) -> Option<DeclId> {
        let array_dims = self.parse_array_dims(log);
        let decorators = self.parse_trailing_decorators(log);
        let initializer = if self.eat_punct(Punct::Assign) {
            Some(self.parse_initializer_or_assignment_expr(log))
        } else {
            None
        };

        let kind = match type_denoter.get_aliased() {
            TypeDenoter::Buffer(..) => DeclKind::Buffer(BufferDecl {
                name: name.clone(),
                type_denoter: type_denoter.clone(),
                decorators: decorators.clone(),
            }),
            TypeDenoter::Sampler(..) => DeclKind::Sampler(SamplerDecl {
                name: name.clone(),
                type_denoter: type_denoter.clone(),
                decorators: decorators.clone(),
            }),
            _ => DeclKind::Variable(VariableDecl {
                name: name.clone(),
                storage,
                interpolation,
                type_denoter: type_denoter.clone(),
                array_dims,
                decorators,
                initializer,
                owner_cbuffer: None,
            }),
        };
        let range = SourceRangeHelper::span(start, self.current_range());
        let first_id = Some(self.program.alloc_decl(range, kind));

        // Additional comma-separated declarators sharing the same base
        // type (`float a, b = 1;`), each becoming its own sibling
        // declaration pushed by the caller alongside the first.
        while self.eat_punct(Punct::Comma) {
            let Some(extra_name) = self.expect_identifier(log) else {
                break;
            };
            let extra_dims = self.parse_array_dims(log);
            let extra_decorators = self.parse_trailing_decorators(log);
            let extra_init = if self.eat_punct(Punct::Assign) {
                Some(self.parse_initializer_or_assignment_expr(log))
            } else {
                None
            };
            let extra_range = self.current_range();
            let extra_id = self.program.alloc_decl(
                extra_range,
                DeclKind::Variable(VariableDecl {
                    name: extra_name,
                    storage,
                    interpolation,
                    type_denoter: type_denoter.clone(),
                    array_dims: extra_dims,
                    decorators: extra_decorators,
                    initializer: extra_init,
                    owner_cbuffer: None,
                }),
            );
            self.extra_decls.push(extra_id);
        }

        self.expect_punct(Punct::Semi, log);
        first_id
    }

    /// Parses either a brace-delimited initializer list or a plain
    /// assignment expression on the right of `=`.
    pub(super) fn parse_initializer_or_assignment_expr(&mut self, log: &mut dyn Log) -> crate::ast::ExprId {
        if self.check_punct(Punct::LBrace) {
            self.parse_initializer_list(log)
        } else {
            self.parse_assignment_expr(log)
        }
    }

    fn parse_initializer_list(&mut self, log: &mut dyn Log) -> crate::ast::ExprId {
        let start = self.current_range();
        self.bump(); // '{'
        let mut elems = Vec::new();
        if !self.check_punct(Punct::RBrace) {
            loop {
                elems.push(self.parse_initializer_or_assignment_expr(log));
                if !self.eat_punct(Punct::Comma) {
                    break;
                }
            }
        }
        self.expect_punct(Punct::RBrace, log);
        let range = SourceRangeHelper::span(start, self.current_range());
        self.program.alloc_expr(range, crate::ast::ExprKind::Initializer(elems))
    }
}

/// Small helper so declaration parsers can build a range spanning "from the
/// first token consumed to just before the current token" without every
/// call site re-deriving it by hand.
pub(super) struct SourceRangeHelper;
impl SourceRangeHelper {
    pub(super) fn span(
        start: crate::source::SourceRange,
        end: crate::source::SourceRange,
    ) -> crate::source::SourceRange {
        crate::source::SourceRange::new(start.start, end.end)
    }
}
