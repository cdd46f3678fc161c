//! Lexical scopes and symbol resolution
//!
//! Scopes live in a flat arena and refer to their parent by index, so child
//! scopes stay addressable after they close. Names are interned once and
//! compared as symbols; the interner also backs "did you mean" suggestions by
//! letting a scope chain enumerate everything visible from it.

use crate::common::Span;
use crate::types::Type;
use string_interner::{DefaultStringInterner, DefaultSymbol};

/// How a binding may be written after its declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    /// `val`: single assignment
    Val,
    /// `var`: freely reassignable
    Var,
    /// `const val`: single assignment, compile-time constant initializer
    Const,
}

/// What kind of entity a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Class,
}

/// A resolved binding
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: DefaultSymbol,
    pub ty: Type,
    pub mutability: Mutability,
    pub kind: SymbolKind,
    /// Where the binding was introduced, for secondary labels
    pub decl_span: Span,
    /// Whether a `val` without initializer has been assigned yet
    pub initialized: bool,
}

/// Index of a scope in the arena
pub type ScopeId = usize;

struct ScopeRecord {
    parent: Option<ScopeId>,
    symbols: Vec<Symbol>,
}

/// Arena of lexical scopes.
///
/// `push_scope`/`pop_scope` track the current scope during traversal;
/// definition and lookup always operate on the current chain.
pub struct ScopeArena {
    scopes: Vec<ScopeRecord>,
    current: ScopeId,
    interner: DefaultStringInterner,
}

impl ScopeArena {
    /// Create an arena holding only the global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![ScopeRecord {
                parent: None,
                symbols: Vec::new(),
            }],
            current: 0,
            interner: DefaultStringInterner::default(),
        }
    }

    /// Open a child of the current scope and enter it
    pub fn push_scope(&mut self) -> ScopeId {
        let id = self.scopes.len();
        self.scopes.push(ScopeRecord {
            parent: Some(self.current),
            symbols: Vec::new(),
        });
        self.current = id;
        id
    }

    /// Leave the current scope, returning to its parent
    pub fn pop_scope(&mut self) {
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
    }

    pub fn current_scope(&self) -> ScopeId {
        self.current
    }

    pub fn intern(&mut self, name: &str) -> DefaultSymbol {
        self.interner.get_or_intern(name)
    }

    pub fn resolve_name(&self, symbol: DefaultSymbol) -> &str {
        self.interner.resolve(symbol).unwrap_or("<unknown>")
    }

    /// Define a binding in the current scope.
    ///
    /// Returns the shadowed symbol's declaration span when the name is already
    /// bound in this same scope; shadowing an outer scope is permitted.
    pub fn define(
        &mut self,
        name: &str,
        ty: Type,
        mutability: Mutability,
        kind: SymbolKind,
        decl_span: Span,
        initialized: bool,
    ) -> Result<(), Span> {
        let symbol = self.intern(name);
        let scope = &mut self.scopes[self.current];
        if let Some(existing) = scope.symbols.iter().find(|s| s.name == symbol) {
            return Err(existing.decl_span);
        }
        scope.symbols.push(Symbol {
            name: symbol,
            ty,
            mutability,
            kind,
            decl_span,
            initialized,
        });
        Ok(())
    }

    /// Resolve a name through the current scope chain, innermost first
    pub fn lookup(&mut self, name: &str) -> Option<&Symbol> {
        let symbol = self.interner.get_or_intern(name);
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let record = &self.scopes[id];
            if let Some(found) = record.symbols.iter().find(|s| s.name == symbol) {
                return Some(found);
            }
            scope = record.parent;
        }
        None
    }

    /// Mutable resolution, for recording assignments and smart casts
    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        let symbol = self.interner.get_or_intern(name);
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if self.scopes[id].symbols.iter().any(|s| s.name == symbol) {
                return self.scopes[id]
                    .symbols
                    .iter_mut()
                    .find(|s| s.name == symbol);
            }
            scope = self.scopes[id].parent;
        }
        None
    }

    /// Every name visible from the current scope, for suggestions
    pub fn visible_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            let record = &self.scopes[id];
            for symbol in &record.symbols {
                let name = self.resolve_name(symbol.name).to_string();
                if !names.contains(&name) {
                    names.push(name);
                }
            }
            scope = record.parent;
        }
        names
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn define_var(arena: &mut ScopeArena, name: &str, ty: Type) -> Result<(), Span> {
        arena.define(
            name,
            ty,
            Mutability::Var,
            SymbolKind::Variable,
            Span::default(),
            true,
        )
    }

    #[test]
    fn test_lookup_through_chain() {
        let mut arena = ScopeArena::new();
        define_var(&mut arena, "outer", Type::Int).unwrap();
        arena.push_scope();
        define_var(&mut arena, "inner", Type::String).unwrap();

        assert_eq!(arena.lookup("inner").unwrap().ty, Type::String);
        assert_eq!(arena.lookup("outer").unwrap().ty, Type::Int);
        assert!(arena.lookup("missing").is_none());
    }

    #[test]
    fn test_inner_binding_invisible_after_pop() {
        let mut arena = ScopeArena::new();
        arena.push_scope();
        define_var(&mut arena, "local", Type::Int).unwrap();
        arena.pop_scope();

        assert!(arena.lookup("local").is_none());
    }

    #[test]
    fn test_duplicate_in_same_scope_rejected() {
        let mut arena = ScopeArena::new();
        define_var(&mut arena, "x", Type::Int).unwrap();
        assert!(define_var(&mut arena, "x", Type::String).is_err());
    }

    #[test]
    fn test_shadowing_outer_scope_allowed() {
        let mut arena = ScopeArena::new();
        define_var(&mut arena, "x", Type::Int).unwrap();
        arena.push_scope();
        define_var(&mut arena, "x", Type::String).unwrap();

        assert_eq!(arena.lookup("x").unwrap().ty, Type::String);
        arena.pop_scope();
        assert_eq!(arena.lookup("x").unwrap().ty, Type::Int);
    }

    #[test]
    fn test_visible_names_innermost_first() {
        let mut arena = ScopeArena::new();
        define_var(&mut arena, "alpha", Type::Int).unwrap();
        arena.push_scope();
        define_var(&mut arena, "beta", Type::Int).unwrap();

        assert_eq!(arena.visible_names(), vec!["beta", "alpha"]);
    }
}
