//! k0 declaration AST nodes

use super::{Block, Expr, TypeExpr};
use crate::common::Span;

/// A complete k0 source unit
#[derive(Debug, Clone)]
pub struct Program {
    pub decls: Vec<Decl>,
    pub span: Span,
}

impl Program {
    pub fn new(decls: Vec<Decl>, span: Span) -> Self {
        Self { decls, span }
    }
}

/// A top-level declaration
#[derive(Debug, Clone)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
}

impl Decl {
    pub fn new(kind: DeclKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone)]
pub enum DeclKind {
    Fun(FunDecl),
    Class(ClassDecl),
    Var(VarDecl),
}

/// A function declaration
#[derive(Debug, Clone)]
pub struct FunDecl {
    pub name: String,
    pub name_span: Span,
    pub params: Vec<Param>,
    /// Absent means Unit for block bodies; inferred for `= expr` bodies
    pub return_type: Option<TypeExpr>,
    pub body: FunBody,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum FunBody {
    Block(Block),
    /// Single-expression form: fun double(x: Int) = x * 2
    Expr(Box<Expr>),
}

/// A function parameter; parameter types are always explicit in k0
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
    pub span: Span,
}

/// A class declaration: `sealed class Result` or
/// `class Success(val value: String) : Result()`
#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub name: String,
    pub name_span: Span,
    pub sealed: bool,
    pub supertype: Option<String>,
    pub fields: Vec<ClassField>,
    pub span: Span,
}

/// A constructor field: `val value: String`
#[derive(Debug, Clone)]
pub struct ClassField {
    pub name: String,
    pub ty: TypeExpr,
    pub mutable: bool,
    pub span: Span,
}

/// A val/var declaration, at top level or inside a block.
///
/// Both the annotation and the initializer are optional in the grammar
/// (`var c: Int` with a later assignment appears in real sources); the
/// analyzer rejects declarations where neither pins down a type.
#[derive(Debug, Clone)]
pub struct VarDecl {
    pub name: String,
    pub name_span: Span,
    pub mutable: bool,
    pub is_const: bool,
    pub declared_type: Option<TypeExpr>,
    pub init: Option<Expr>,
    pub span: Span,
}
