//! Diagnostic collector with an error budget

use crate::diagnostic::{Diagnostic, Severity};
use miette::Diagnostic as MietteDiagnostic;
use sb_span::FileSpan;
use serde::Deserialize;
use thiserror::Error;

/// Limits applied by the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Abort once this many errors have been reported; `0` disables the limit
    pub max_errors: usize,
    /// Count warnings as errors
    pub warnings_as_errors: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            max_errors: 100,
            warnings_as_errors: false,
        }
    }
}

/// The error budget is exhausted; the run must stop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, MietteDiagnostic)]
#[error("aborting after {limit} errors")]
#[diagnostic(code(diagnostics::error_limit), help("fix the reported errors or raise `max_errors`"))]
pub struct ErrorLimitReached {
    /// The configured limit
    pub limit: usize,
}

/// Collects every diagnostic of one compilation unit
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    config: DiagnosticsConfig,
    diagnostics: Vec<Diagnostic>,
    errors: usize,
    warnings: usize,
}

impl DiagnosticSink {
    /// Create a sink with the default budget
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink with an explicit budget
    pub fn with_config(config: DiagnosticsConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Report an error at `span`
    ///
    /// # Errors
    ///
    /// Returns `ErrorLimitReached` when this error spends the last of the budget.
    pub fn report(&mut self, span: FileSpan, message: impl Into<String>) -> Result<(), ErrorLimitReached> {
        self.emit(Diagnostic::error(span, message))
    }

    /// Report a warning at `span`
    ///
    /// # Errors
    ///
    /// Only fails when warnings are promoted to errors and the budget runs out.
    pub fn warn(&mut self, span: FileSpan, message: impl Into<String>) -> Result<(), ErrorLimitReached> {
        self.emit(Diagnostic::warning(span, message))
    }

    /// Record a pre-built diagnostic
    ///
    /// # Errors
    ///
    /// Returns `ErrorLimitReached` once the error count reaches `max_errors`.
    pub fn emit(&mut self, mut diagnostic: Diagnostic) -> Result<(), ErrorLimitReached> {
        if diagnostic.severity == Severity::Warning && self.config.warnings_as_errors {
            diagnostic.severity = Severity::Error;
        }
        match diagnostic.severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Note => {}
        }
        self.diagnostics.push(diagnostic);

        if self.config.max_errors > 0 && self.errors >= self.config.max_errors {
            return Err(ErrorLimitReached {
                limit: self.config.max_errors,
            });
        }
        Ok(())
    }

    /// Whether any error was reported
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    /// Number of errors reported
    pub fn error_count(&self) -> usize {
        self.errors
    }

    /// Number of warnings reported
    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    /// All diagnostics in report order
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Take the collected diagnostics, resetting the counters
    pub fn take(&mut self) -> Vec<Diagnostic> {
        self.errors = 0;
        self.warnings = 0;
        std::mem::take(&mut self.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut sink = DiagnosticSink::new();
        sink.report(FileSpan::synthetic(), "first").unwrap();
        sink.warn(FileSpan::synthetic(), "second").unwrap();
        assert!(sink.has_errors());
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 1);
        assert_eq!(sink.diagnostics().len(), 2);
    }

    #[test]
    fn test_budget_exhaustion() {
        let mut sink = DiagnosticSink::with_config(DiagnosticsConfig {
            max_errors: 2,
            warnings_as_errors: false,
        });
        assert!(sink.report(FileSpan::synthetic(), "one").is_ok());
        let err = sink.report(FileSpan::synthetic(), "two").unwrap_err();
        assert_eq!(err.limit, 2);
        assert_eq!(err.to_string(), "aborting after 2 errors");
    }

    #[test]
    fn test_warnings_as_errors() {
        let mut sink = DiagnosticSink::with_config(DiagnosticsConfig {
            max_errors: 0,
            warnings_as_errors: true,
        });
        sink.warn(FileSpan::synthetic(), "promoted").unwrap();
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.warning_count(), 0);
        assert_eq!(sink.diagnostics()[0].severity, Severity::Error);
    }

    #[test]
    fn test_take_resets() {
        let mut sink = DiagnosticSink::new();
        sink.report(FileSpan::synthetic(), "gone").unwrap();
        let taken = sink.take();
        assert_eq!(taken.len(), 1);
        assert!(!sink.has_errors());
        assert!(sink.diagnostics().is_empty());
    }
}
