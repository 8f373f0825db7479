//! `FuncNameConverter`, per `spec.md` §4.7: output dialects that lack HLSL's
//! overload resolution need one distinct emitted name per overload, and
//! user-chosen names that collide with an output-dialect reserved word need
//! a safe prefix.

use std::collections::HashMap;

use crate::api::NameMangling;
use crate::ast::{DeclId, Program};

/// Target-language keywords a user function name might otherwise collide
/// with. Deliberately small: just the GLSL/ESSL keywords unlikely to be
/// covered by the HLSL reserved-word set the parser already rejects as
/// identifiers (`spec.md` §4.2).
const GLSL_RESERVED_WORDS: &[&str] = &[
    "input", "output", "discard", "precision", "varying", "attribute", "buffer", "shared",
    "coherent", "readonly", "writeonly", "layout", "flat", "smooth", "noperspective",
];

/// Assigns [`crate::ast::FunctionDecl::mangled_name`] to every function
/// declaration in the program:
///
/// - names with a single overload keep their source name, prefixed with
///   `mangling.reserved_word` only if they collide with a GLSL keyword;
/// - names with more than one overload additionally get a numeric suffix
///   per candidate, so every emitted name is distinct (`spec.md` §4.7:
///   "assigns each a distinct emitted name since the target language has no
///   overload resolution of its own").
///
/// Namespacing (`mangling.namespace`) prefixes every mangled name uniformly,
/// when set, to avoid collisions with names the caller is known to reserve
/// for wrapper/glue code.
pub fn mangle_function_names(program: &mut Program, mangling: &NameMangling) {
    let mut by_name: HashMap<String, Vec<DeclId>> = HashMap::new();
    for (id, f) in program.all_functions() {
        by_name.entry(f.name.to_string()).or_default().push(id);
    }

    for (name, ids) in by_name {
        let needs_reserved_prefix = GLSL_RESERVED_WORDS.contains(&name.as_str());
        let overloaded = ids.len() > 1;

        for (index, id) in ids.into_iter().enumerate() {
            let mut mangled = name.clone();
            if needs_reserved_prefix {
                mangled = format!("{}{}", mangling.reserved_word, mangled);
            }
            if overloaded {
                mangled = format!("{mangled}_{index}");
            }
            if let Some(ns) = &mangling.namespace {
                mangled = format!("{ns}{mangled}");
            }
            if let Some(f) = program.decl_mut(id).as_function_mut() {
                f.mangled_name = Some(std::rc::Rc::from(mangled));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{DeclKind, FunctionDecl, TypeDenoter};
    use crate::source::{FileId, SourcePosition, SourceRange};
    use std::rc::Rc;

    fn range() -> SourceRange {
        SourceRange::point(SourcePosition::new(FileId(0), 1, 1))
    }

    fn make_fn(program: &mut Program, name: &str) -> DeclId {
        program.alloc_decl(
            range(),
            DeclKind::Function(FunctionDecl {
                name: Rc::from(name),
                mangled_name: None,
                return_type: Rc::new(TypeDenoter::Void),
                return_semantic: None,
                params: Vec::new(),
                body: None,
                annotations: Vec::new(),
                is_entry_point_candidate: false,
            }),
        )
    }

    #[test]
    fn overloads_get_distinct_names_singles_keep_theirs() {
        let mut program = Program::new();
        let a = make_fn(&mut program, "lerp");
        let b = make_fn(&mut program, "lerp");
        let solo = make_fn(&mut program, "computeLight");
        program.globals = vec![a, b, solo];

        mangle_function_names(&mut program, &NameMangling::default());

        let name_a = program.decl(a).as_function().unwrap().mangled_name.clone().unwrap();
        let name_b = program.decl(b).as_function().unwrap().mangled_name.clone().unwrap();
        assert_ne!(name_a, name_b);
        assert_eq!(
            program.decl(solo).as_function().unwrap().mangled_name.as_deref(),
            Some("computeLight")
        );
    }

    #[test]
    fn reserved_word_collision_gets_prefixed() {
        let mut program = Program::new();
        let f = make_fn(&mut program, "discard");
        program.globals = vec![f];

        mangle_function_names(&mut program, &NameMangling::default());

        assert_eq!(
            program.decl(f).as_function().unwrap().mangled_name.as_deref(),
            Some("xc_discard")
        );
    }
}
