//! Common infrastructure shared across the frontend stages

mod error;
mod span;

pub use error::{CompileError, CompileResult, Diagnostic, DiagnosticReporter, Severity, Stage};
pub use span::Span;
