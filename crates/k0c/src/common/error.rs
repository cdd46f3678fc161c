//! Diagnostics and error types

use super::Span;
use codespan_reporting::diagnostic::{self, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

/// Hard failure that stops the driver outright.
///
/// Itemized per-stage findings are [`Diagnostic`]s; `CompileError` is only
/// for conditions where a later stage cannot proceed at all.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error("Parser error at {span:?}: {message}")]
    Parser { message: String, span: Span },

    #[error("fatal: {message}")]
    Fatal { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CompileError {
    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::Parser {
            message: message.into(),
            span,
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal {
            message: message.into(),
        }
    }
}

pub type CompileResult<T> = Result<T, CompileError>;

/// Which stage produced a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Lex,
    Syntax,
    Semantic,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Lex => write!(f, "lex error"),
            Stage::Syntax => write!(f, "syntax error"),
            Stage::Semantic => write!(f, "semantic error"),
        }
    }
}

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A single finding with its source location.
///
/// Diagnostics are collected in emission order and never dropped; all three
/// stages append to the same list so one run surfaces as many independent
/// problems as possible.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    pub message: String,
    pub span: Span,
    /// Optional secondary note, e.g. "declared immutable here".
    pub note: Option<(String, Span)>,
}

impl Diagnostic {
    pub fn lex(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            stage: Stage::Lex,
            message: message.into(),
            span,
            note: None,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            stage: Stage::Syntax,
            message: message.into(),
            span,
            note: None,
        }
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            stage: Stage::Semantic,
            message: message.into(),
            span,
            note: None,
        }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            stage: Stage::Semantic,
            message: message.into(),
            span,
            note: None,
        }
    }

    pub fn with_note(mut self, message: impl Into<String>, span: Span) -> Self {
        self.note = Some((message.into(), span));
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl From<CompileError> for Diagnostic {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::Parser { message, span } => Diagnostic::syntax(message, span),
            CompileError::Fatal { message } => Diagnostic::semantic(message, Span::default()),
            CompileError::Io(e) => Diagnostic::semantic(e.to_string(), Span::default()),
        }
    }
}

/// Diagnostic reporter for pretty error output
pub struct DiagnosticReporter {
    files: SimpleFiles<String, String>,
    writer: StandardStream,
    config: term::Config,
}

impl DiagnosticReporter {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            writer: StandardStream::stderr(ColorChoice::Auto),
            config: term::Config::default(),
        }
    }

    pub fn add_file(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        self.files.add(name.into(), source.into())
    }

    pub fn report(&self, file_id: usize, diag: &Diagnostic) {
        let mut labels = vec![
            Label::primary(file_id, diag.span.start..diag.span.end).with_message(&diag.message),
        ];
        if let Some((note, span)) = &diag.note {
            labels.push(Label::secondary(file_id, span.start..span.end).with_message(note));
        }

        let rendered = match diag.severity {
            Severity::Error => diagnostic::Diagnostic::error(),
            Severity::Warning => diagnostic::Diagnostic::warning(),
        }
        .with_message(diag.stage.to_string())
        .with_labels(labels);

        let _ = term::emit(&mut self.writer.lock(), &self.config, &self.files, &rendered);
    }

    pub fn report_all(&self, file_id: usize, diags: &[Diagnostic]) {
        for diag in diags {
            self.report(file_id, diag);
        }
    }
}

impl Default for DiagnosticReporter {
    fn default() -> Self {
        Self::new()
    }
}
