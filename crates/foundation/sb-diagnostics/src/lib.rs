//! Diagnostics collection for name resolution
//!
//! Every recoverable problem the resolver finds (ambiguity, bad qualifier,
//! conflicting redeclaration) is reported through one [`DiagnosticSink`].
//! The sink counts errors and warnings and aborts the run once the
//! configured error budget is spent.

pub mod diagnostic;
pub mod sink;

pub use diagnostic::{Diagnostic, Severity};
pub use sink::{DiagnosticSink, DiagnosticsConfig, ErrorLimitReached};
