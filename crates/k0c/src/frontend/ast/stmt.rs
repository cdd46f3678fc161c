//! k0 statement AST nodes

use super::{Expr, VarDecl};
use crate::common::Span;

/// A braced sequence of statements
#[derive(Debug, Clone)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }
}

/// A k0 statement
#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Statement kinds
#[derive(Debug, Clone)]
pub enum StmtKind {
    /// val/var declaration
    Var(VarDecl),

    /// if (cond) { } else { }; the else branch is another If for chains
    If {
        condition: Expr,
        then_block: Block,
        else_block: Option<Box<Stmt>>,
    },
    /// while (cond) { }
    While { condition: Expr, body: Block },
    /// do { } while (cond)
    DoWhile { body: Block, condition: Expr },
    /// for (ident in iterable) { }
    For {
        binding: String,
        binding_span: Span,
        iterable: Expr,
        body: Block,
    },
    /// when [(subject)] { arms }
    When(WhenStmt),

    /// return [expr]
    Return(Option<Expr>),
    /// break
    Break,
    /// continue
    Continue,

    /// A bare block
    Block(Block),
    /// An expression used as a statement (calls, assignments, i++)
    Expr(Expr),
}

/// A `when` construct.
///
/// With a subject the arms are patterns matched against it; without one each
/// arm condition is a boolean guard. At most one `else` arm is permitted (the
/// parser enforces the count, the analyzer enforces exhaustiveness).
#[derive(Debug, Clone)]
pub struct WhenStmt {
    pub subject: Option<Expr>,
    pub arms: Vec<WhenArm>,
    pub span: Span,
}

/// One `pattern -> body` arm
#[derive(Debug, Clone)]
pub struct WhenArm {
    pub pattern: WhenPattern,
    pub body: Block,
    pub span: Span,
}

/// Arm patterns
#[derive(Debug, Clone)]
pub enum WhenPattern {
    /// Equality against the subject, or a boolean guard when there is none
    Expr(Expr),
    /// `in range`
    In(Expr),
    /// `is TypeName`
    Is { name: String, span: Span },
    /// `else`
    Else,
}
