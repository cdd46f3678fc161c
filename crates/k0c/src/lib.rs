//! k0 Compiler Frontend
//!
//! A frontend for k0, a small statically-typed language with Kotlin-flavored
//! syntax: `val`/`var` bindings, nullable types with safe calls and elvis,
//! string templates, ranges, `when` matching, and sealed class hierarchies.
//!
//! ## Architecture
//!
//! The pipeline is three stages, each consuming the previous one's output:
//! - **Lexer** (`frontend/lexer/`): logos-driven tokenizer with error recovery
//! - **Parser** (`frontend/parser/`): recursive descent producing the AST
//!   (`frontend/ast/`), with statement-boundary resynchronization
//! - **Semantic analyzer** (`frontend/sema/`): scoped symbol tables, type
//!   inference and widening, mutability, nullability, and exhaustiveness
//! - **Common** (`common/`): diagnostics, spans, reporting
//! - **Types** (`types/`): the k0 type system shared by all stages

pub mod common;
pub mod frontend;
pub mod stdlib;
pub mod types;

// Re-exports for convenience
pub use common::{CompileError, CompileResult, Diagnostic, DiagnosticReporter, Severity, Span};
pub use frontend::{Analysis, check, parse, tokenize};
pub use types::{FnSignature, Type};
