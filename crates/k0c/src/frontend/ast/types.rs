//! Syntactic type annotations
//!
//! These are what the parser saw (`Int`, `String?`, `Array<Int>`); resolution
//! to a semantic [`crate::types::Type`] happens during analysis, where class
//! names can be checked against the declaration table.

use crate::common::Span;

/// A type annotation as written in source
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExprKind {
    /// A primitive or class name: `Int`, `String`, `Result`
    Named(String),
    /// `Array<T>`
    Array(Box<TypeExpr>),
    /// `T?`
    Nullable(Box<TypeExpr>),
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TypeExprKind::Named(name) => write!(f, "{name}"),
            TypeExprKind::Array(element) => write!(f, "Array<{element}>"),
            TypeExprKind::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}
