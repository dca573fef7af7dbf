//! Errors raised by name resolution
//!
//! [`ResolveError`] covers problems in the program being compiled: they are
//! reported through the diagnostic sink and resolution carries on.
//! [`Fatal`] covers conditions after which nothing else can be trusted:
//! engine bugs, an exhausted error budget, runaway recursion.

#![allow(unused_assignments)]

use crate::entity::TableId;
use crate::role::Role;
use crate::table::TableError;
use miette::Diagnostic as MietteDiagnostic;
use sb_diagnostics::{Diagnostic, ErrorLimitReached};
use sb_intern::{Interner, Symbol};
use sb_span::FileSpan;
use thiserror::Error;

/// A recoverable resolution error in the source program
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum ResolveError {
    /// A name resolved to nothing
    #[error("cannot find `{name}` in this scope")]
    #[diagnostic(code(resolve::undefined))]
    Undefined {
        /// The name as written
        name: String,
        /// Use site
        span: FileSpan,
        /// Similar visible names
        suggestions: Vec<String>,
    },

    /// Several distinct entities answer the same query
    #[error("reference to `{name}` is ambiguous")]
    #[diagnostic(code(resolve::ambiguous), help("qualify the name to pick one candidate"))]
    Ambiguous {
        /// The name as written
        name: String,
        /// Use site
        span: FileSpan,
        /// Qualified names of every candidate
        candidates: Vec<String>,
    },

    /// A qualifier segment is neither a class nor a namespace
    #[error("`{name}` is not a class or namespace")]
    #[diagnostic(code(resolve::not_a_scope))]
    NotAScope {
        /// The offending segment
        name: String,
        /// Segment position
        span: FileSpan,
    },

    /// A name is redeclared as a different kind of entity
    #[error("`{name}` redeclared as {role}")]
    #[diagnostic(code(resolve::conflicting_kind))]
    ConflictingKind {
        /// The name
        name: String,
        /// New declaration
        span: FileSpan,
        /// Role of the new declaration
        role: Role,
        /// Qualified name of the earlier declaration
        prior: String,
        /// Role of the earlier declaration
        prior_role: Role,
    },

    /// Same name and role, incompatible declarations
    #[error("conflicting declaration of `{name}`")]
    #[diagnostic(code(resolve::redeclaration))]
    Redeclaration {
        /// The name
        name: String,
        /// New declaration
        span: FileSpan,
        /// Qualified name of the earlier declaration
        prior: String,
        /// Earlier declaration
        prior_span: FileSpan,
    },

    /// A free function overloaded inside a function body
    #[error("cannot overload `{name}` in block scope")]
    #[diagnostic(code(resolve::local_overload), help("move the overloads to namespace scope"))]
    LocalOverload {
        /// The function name
        name: String,
        /// New declaration
        span: FileSpan,
    },
}

impl ResolveError {
    /// Where the error is reported
    pub fn span(&self) -> FileSpan {
        match self {
            Self::Undefined { span, .. }
            | Self::Ambiguous { span, .. }
            | Self::NotAScope { span, .. }
            | Self::ConflictingKind { span, .. }
            | Self::Redeclaration { span, .. }
            | Self::LocalOverload { span, .. } => *span,
        }
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Undefined { .. } => "resolve::undefined",
            Self::Ambiguous { .. } => "resolve::ambiguous",
            Self::NotAScope { .. } => "resolve::not_a_scope",
            Self::ConflictingKind { .. } => "resolve::conflicting_kind",
            Self::Redeclaration { .. } => "resolve::redeclaration",
            Self::LocalOverload { .. } => "resolve::local_overload",
        }
    }

    /// Convert for the diagnostic sink
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diag = Diagnostic::error(self.span(), self.to_string()).with_code(self.code());
        match self {
            Self::Undefined { suggestions, .. } => suggestions
                .iter()
                .fold(diag, |diag, name| diag.with_note(format!("did you mean `{name}`?"))),
            Self::Ambiguous { candidates, .. } => candidates
                .iter()
                .fold(diag, |diag, name| diag.with_note(format!("candidate: `{name}`"))),
            Self::ConflictingKind {
                prior, prior_role, ..
            } => diag.with_note(format!("`{prior}` was declared as {prior_role}")),
            Self::Redeclaration {
                prior, prior_span, ..
            } => diag.with_note(format!("`{prior}` first declared at {prior_span}")),
            Self::NotAScope { .. } | Self::LocalOverload { .. } => diag,
        }
    }

    /// Up to three visible names within edit distance 3 of `name`, closest first
    pub fn compute_suggestions(name: Symbol, interner: &Interner, available: &[Symbol]) -> Vec<String> {
        let target = interner.resolve(name);
        let mut suggestions: Vec<(&str, usize)> = available
            .iter()
            .filter(|&&candidate| candidate != name)
            .map(|&candidate| {
                let text = interner.resolve(candidate);
                (text, levenshtein_distance(target, text))
            })
            .filter(|(_, distance)| *distance <= 3)
            .collect();

        suggestions.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        suggestions.dedup_by(|a, b| a.0 == b.0);
        suggestions
            .into_iter()
            .take(3)
            .map(|(text, _)| text.to_owned())
            .collect()
    }
}

/// A condition that aborts the compilation unit
#[derive(Debug, Clone, PartialEq, Eq, Error, MietteDiagnostic)]
pub enum Fatal {
    /// The diagnostic sink ran out of budget
    #[error(transparent)]
    #[diagnostic(transparent)]
    ErrorLimit(#[from] ErrorLimitReached),

    /// A scope was closed out of order
    #[error("scope stack imbalance: expected to close {expected:?}, but {found:?} is innermost")]
    #[diagnostic(code(resolve::scope_imbalance))]
    ScopeImbalance {
        /// Table the caller meant to close
        expected: TableId,
        /// Table actually on top
        found: TableId,
    },

    /// Attempt to close the global scope
    #[error("the global scope cannot be closed")]
    #[diagnostic(code(resolve::pop_global))]
    PopGlobal,

    /// Scopes still open at end of input
    #[error("{open} scope(s) left open at end of input")]
    #[diagnostic(code(resolve::unclosed_scopes))]
    UnclosedScopes {
        /// Number of open scopes above the global one
        open: usize,
    },

    /// An entity of the wrong shape reached a table
    #[error("malformed entity `{name}`: {reason}")]
    #[diagnostic(code(resolve::malformed_entity))]
    MalformedEntity {
        /// Entity name
        name: String,
        /// What is wrong with it
        reason: String,
    },

    /// A complete class was modified
    #[error("class `{class}` is complete and can no longer change")]
    #[diagnostic(code(resolve::sealed_class))]
    SealedClass {
        /// Qualified class name
        class: String,
    },

    /// Any other structural refusal by a table
    #[error("cannot file `{name}`")]
    #[diagnostic(code(resolve::table))]
    Table {
        /// Entity name
        name: String,
        /// Refusal
        #[source]
        source: TableError,
    },

    /// A handle outlived its entity or table
    #[error("stale {what} handle")]
    #[diagnostic(code(resolve::stale_handle))]
    StaleHandle {
        /// `entity` or `table`
        what: &'static str,
    },

    /// Nested qualified-name, base-class or using recursion went too deep
    #[error("name resolution nested deeper than {limit} levels")]
    #[diagnostic(code(resolve::recursion_limit), help("raise `max_depth` if the program is legitimate"))]
    RecursionLimit {
        /// Configured depth limit
        limit: usize,
    },

    /// A function-only operation outside any function body
    #[error("no enclosing function scope")]
    #[diagnostic(code(resolve::not_in_function))]
    NotInFunction,
}

/// Compute Levenshtein distance between two strings
fn levenshtein_distance(source: &str, target: &str) -> usize {
    let source: Vec<char> = source.chars().collect();
    let target: Vec<char> = target.chars().collect();
    if source.is_empty() {
        return target.len();
    }
    if target.is_empty() {
        return source.len();
    }

    let mut previous: Vec<usize> = (0..=target.len()).collect();
    let mut current = vec![0; target.len() + 1];
    for (idx, source_char) in source.iter().enumerate() {
        current[0] = idx + 1;
        for (jdx, target_char) in target.iter().enumerate() {
            let cost = usize::from(source_char != target_char);
            current[jdx + 1] = (previous[jdx + 1] + 1)
                .min(current[jdx] + 1)
                .min(previous[jdx] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[target.len()]
}
