//! Hierarchical symbol table: a stack of scopes mapping identifiers to
//! declarations, per `spec.md` §4.5.

use std::collections::HashMap;
use std::rc::Rc;

use crate::ast::DeclId;

/// What kind of lexical region a [`Scope`] was opened for. Several analyzer
/// checks key off this (e.g. `static` is rejected on a parameter found in a
/// `FunctionBody` scope's parameter list but not in a `CodeBlock`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    FunctionBody,
    StructBody,
    CodeBlock,
    ForInit,
}

/// Decides whether a new declaration may replace an existing one already
/// bound to the same name in the same scope. Returns `true` to accept the
/// new binding (replacing the old), `false` to reject it (analyzer reports a
/// redefinition diagnostic).
pub type OverridePolicy = fn(existing: DeclId, incoming: DeclId) -> bool;

/// Functions never override by identity — overloads are tracked
/// side-by-side via `find_all`, never by replacing the prior binding.
pub fn reject_override(_existing: DeclId, _incoming: DeclId) -> bool {
    false
}

/// Default override policy: first declaration wins, later ones are
/// redefinition errors.
pub fn default_override_policy() -> OverridePolicy {
    reject_override
}

struct Scope {
    kind: ScopeKind,
    bindings: HashMap<Rc<str>, Vec<DeclId>>,
}

impl Scope {
    fn new(kind: ScopeKind) -> Self {
        Self {
            kind,
            bindings: HashMap::new(),
        }
    }
}

/// A stack of lexical scopes. Overload sets are modeled as multiple bindings
/// under the same name within one scope; `find` returns the innermost
/// scope's full set (the analyzer's overload resolution narrows it further).
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(ScopeKind::Global)],
        }
    }

    pub fn push_scope(&mut self, kind: ScopeKind) {
        self.scopes.push(Scope::new(kind));
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn current_kind(&self) -> ScopeKind {
        self.scopes.last().expect("global scope always present").kind
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Registers `decl` under `name` in the current scope. `policy` is
    /// consulted only when `name` already has a *non-function* binding in
    /// this scope (functions always coexist as overload candidates; the
    /// analyzer disambiguates them later by signature, never by override
    /// policy).
    pub fn register(
        &mut self,
        name: Rc<str>,
        decl: DeclId,
        allow_overload: bool,
        policy: OverridePolicy,
    ) -> Result<(), DeclId> {
        let scope = self.scopes.last_mut().expect("global scope always present");
        match scope.bindings.get_mut(&name) {
            None => {
                scope.bindings.insert(name, vec![decl]);
                Ok(())
            }
            Some(existing) if allow_overload => {
                existing.push(decl);
                Ok(())
            }
            Some(existing) => {
                let prior = existing[0];
                if policy(prior, decl) {
                    existing[0] = decl;
                    Ok(())
                } else {
                    Err(prior)
                }
            }
        }
    }

    /// Innermost binding for `name` (the first one registered in that
    /// scope, or for overload sets, an arbitrary representative — callers
    /// needing the whole set should use [`SymbolTable::find_all`]).
    pub fn find(&self, name: &str) -> Option<DeclId> {
        for scope in self.scopes.iter().rev() {
            if let Some(ids) = scope.bindings.get(name) {
                return ids.first().copied();
            }
        }
        None
    }

    /// Like [`SymbolTable::find`] but also returns how many scopes were
    /// crossed to find it (0 = current scope).
    pub fn find_with_depth(&self, name: &str) -> Option<(DeclId, usize)> {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if let Some(ids) = scope.bindings.get(name) {
                return ids.first().copied().map(|id| (id, depth));
            }
        }
        None
    }

    pub fn find_in_current_scope(&self, name: &str) -> Option<DeclId> {
        self.scopes
            .last()
            .and_then(|s| s.bindings.get(name))
            .and_then(|ids| ids.first().copied())
    }

    /// The full overload set for `name`, from the innermost scope that
    /// binds it at all (scopes are not merged across levels, matching
    /// ordinary shadowing rules).
    pub fn find_all(&self, name: &str) -> Vec<DeclId> {
        for scope in self.scopes.iter().rev() {
            if let Some(ids) = scope.bindings.get(name) {
                return ids.clone();
            }
        }
        Vec::new()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_outer() {
        let mut table = SymbolTable::new();
        table.register(Rc::from("x"), DeclId(0), false, reject_override).unwrap();
        table.push_scope(ScopeKind::CodeBlock);
        table.register(Rc::from("x"), DeclId(1), false, reject_override).unwrap();
        assert_eq!(table.find("x"), Some(DeclId(1)));
        table.pop_scope();
        assert_eq!(table.find("x"), Some(DeclId(0)));
    }

    #[test]
    fn redefinition_in_same_scope_is_rejected_by_default_policy() {
        let mut table = SymbolTable::new();
        table.register(Rc::from("x"), DeclId(0), false, reject_override).unwrap();
        let result = table.register(Rc::from("x"), DeclId(1), false, reject_override);
        assert_eq!(result, Err(DeclId(0)));
    }

    #[test]
    fn overloads_coexist_in_find_all() {
        let mut table = SymbolTable::new();
        table.register(Rc::from("f"), DeclId(0), true, reject_override).unwrap();
        table.register(Rc::from("f"), DeclId(1), true, reject_override).unwrap();
        assert_eq!(table.find_all("f"), vec![DeclId(0), DeclId(1)]);
    }
}
