//! A single diagnostic message

use codespan_reporting::diagnostic::{Diagnostic as CodespanDiagnostic, Label};
use derive_more::Display;
use sb_span::{FileId, FileSpan};

/// How serious a diagnostic is
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Counts against the error budget
    #[display("error")]
    Error,
    /// Reported, compilation unaffected
    #[display("warning")]
    Warning,
    /// Extra context
    #[display("note")]
    Note,
}

/// A reported problem at a source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity
    pub severity: Severity,
    /// Stable machine-readable code, e.g. `resolve::ambiguous`
    pub code: Option<&'static str>,
    /// Primary message
    pub message: String,
    /// Where it was reported
    pub span: FileSpan,
    /// Secondary notes (candidate names, earlier declarations)
    pub notes: Vec<String>,
}

impl Diagnostic {
    /// Create a diagnostic with no code and no notes
    pub fn new(severity: Severity, span: FileSpan, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            span,
            notes: Vec::new(),
        }
    }

    /// Error at `span`
    pub fn error(span: FileSpan, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, span, message)
    }

    /// Warning at `span`
    pub fn warning(span: FileSpan, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, span, message)
    }

    /// Attach a code
    #[must_use]
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }

    /// Attach a note
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan diagnostic for rustc-style output
    pub fn to_codespan(&self) -> CodespanDiagnostic<FileId> {
        let diag = match self.severity {
            Severity::Error => CodespanDiagnostic::error(),
            Severity::Warning => CodespanDiagnostic::warning(),
            Severity::Note => CodespanDiagnostic::note(),
        };
        let diag = diag
            .with_message(self.message.clone())
            .with_labels(vec![Label::primary(self.span.file, self.span.range())])
            .with_notes(self.notes.clone());
        match self.code {
            Some(code) => diag.with_code(code),
            None => diag,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{code}]")?;
        }
        write!(f, " at {}: {}", self.span, self.message)?;
        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }
        Ok(())
    }
}
