//! k0 expression AST nodes

use super::TypeExpr;
use crate::common::Span;
use crate::types::Type;

/// A k0 expression.
///
/// `ty` starts out `None` and is written exactly once per node during
/// semantic analysis; on a successful run no expression is left unresolved.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
    pub ty: Option<Type>,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self {
            kind,
            span,
            ty: None,
        }
    }
}

/// Expression kinds
#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal: 42
    IntLiteral(i64),
    /// Float literal: 3.14, 2.5f (`is_single` for the `f` suffix)
    FloatLiteral { value: f64, is_single: bool },
    /// Boolean literal: true, false
    BoolLiteral(bool),
    /// Character literal: 'a'
    CharLiteral(char),
    /// String literal without embedded expressions, escapes decoded
    StringLiteral(String),
    /// String with embedded expressions: "Sum: $c", "${a + b}"
    StringTemplate(Vec<TemplateSegment>),
    /// null
    NullLiteral,

    /// Identifier: x, counter
    Identifier(String),

    /// Binary operation: a + b
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Unary prefix operation: -x, !x
    Unary { op: UnaryOp, operand: Box<Expr> },
    /// Increment/decrement: ++i, i++, --i, i--
    IncDec {
        op: IncDecOp,
        prefix: bool,
        target: Box<Expr>,
    },

    /// Assignment: x = 5, x += 1, arr[i] = v
    Assign {
        target: Box<Expr>,
        op: Option<BinOp>, // None for =, Some for += and -=
        value: Box<Expr>,
    },

    /// Function call: foo(x, y), java.lang.Math.abs(n)
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// Index: arr[i]
    Index { base: Box<Expr>, index: Box<Expr> },
    /// Member access: s.length (safe for s?.length)
    Member {
        base: Box<Expr>,
        name: String,
        safe: bool,
    },

    /// Lambda: { 0 }, { it -> it * 2 }
    Lambda {
        params: Vec<(String, Span)>,
        body: Box<Expr>,
    },
    /// Array constructor: Array<Int>(4) { 0 }
    ArrayLiteral {
        element: TypeExpr,
        size: Box<Expr>,
        init: Box<Expr>,
    },

    /// Range: 1..5, 0..<n (`inclusive` distinguishes `..` from `..<`)
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        inclusive: bool,
    },
    /// Type check: x is Success
    Is { value: Box<Expr>, ty_name: String },
    /// Membership check: i in 1..10
    InRange { value: Box<Expr>, range: Box<Expr> },
    /// Elvis: a ?: b
    Elvis {
        value: Box<Expr>,
        fallback: Box<Expr>,
    },

    /// Grouped expression: (expr)
    Paren(Box<Expr>),
}

/// One segment of a string template, in source order
#[derive(Debug, Clone)]
pub enum TemplateSegment {
    Text(String),
    Expr(Box<Expr>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add, // +
    Sub, // -
    Mul, // *
    Div, // /
    Rem, // %

    // Logical
    And, // &&
    Or,  // ||

    // Comparison
    Eq,    // ==
    Ne,    // !=
    RefEq, // ===
    Lt,    // <
    Le,    // <=
    Gt,    // >
    Ge,    // >=
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::RefEq | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem
        )
    }
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinOp::Add => write!(f, "+"),
            BinOp::Sub => write!(f, "-"),
            BinOp::Mul => write!(f, "*"),
            BinOp::Div => write!(f, "/"),
            BinOp::Rem => write!(f, "%"),
            BinOp::And => write!(f, "&&"),
            BinOp::Or => write!(f, "||"),
            BinOp::Eq => write!(f, "=="),
            BinOp::Ne => write!(f, "!="),
            BinOp::RefEq => write!(f, "==="),
            BinOp::Lt => write!(f, "<"),
            BinOp::Le => write!(f, "<="),
            BinOp::Gt => write!(f, ">"),
            BinOp::Ge => write!(f, ">="),
        }
    }
}

/// Unary prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg, // -
    Not, // !
}

impl std::fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnaryOp::Neg => write!(f, "-"),
            UnaryOp::Not => write!(f, "!"),
        }
    }
}

/// Increment/decrement operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc, // ++
    Dec, // --
}

impl IncDecOp {
    /// The arithmetic this desugars to, for mutability/type checking
    pub fn bin_op(&self) -> BinOp {
        match self {
            IncDecOp::Inc => BinOp::Add,
            IncDecOp::Dec => BinOp::Sub,
        }
    }
}
