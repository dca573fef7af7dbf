//! Per-operation resolution context

use crate::error::{Fatal, ResolveError};
use sb_diagnostics::DiagnosticSink;
use tracing::debug;

/// State threaded through recursive lookups
///
/// Carries the diagnostic sink and the current recursion depth so the
/// engine keeps no process-wide counters.
#[derive(Debug)]
pub struct ResolveCx<'a> {
    sink: &'a mut DiagnosticSink,
    depth: usize,
    max_depth: usize,
}

impl<'a> ResolveCx<'a> {
    /// Context reporting into `sink`, allowing `max_depth` nested levels
    pub fn new(sink: &'a mut DiagnosticSink, max_depth: usize) -> Self {
        Self {
            sink,
            depth: 0,
            max_depth,
        }
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Report a recoverable error
    ///
    /// # Errors
    ///
    /// Returns `Fatal::ErrorLimit` when the error budget is exhausted.
    pub fn report(&mut self, error: ResolveError) -> Result<(), Fatal> {
        debug!(code = error.code(), span = %error.span(), "{error}");
        self.sink.emit(error.to_diagnostic())?;
        Ok(())
    }

    /// Run `f` one level deeper
    ///
    /// # Errors
    ///
    /// Returns `Fatal::RecursionLimit` when the depth limit would be
    /// exceeded, or whatever `f` returns.
    pub fn descend<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, Fatal>) -> Result<T, Fatal> {
        if self.depth >= self.max_depth {
            return Err(Fatal::RecursionLimit {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nest(cx: &mut ResolveCx<'_>, levels: usize) -> Result<usize, Fatal> {
        if levels == 0 {
            return Ok(cx.depth());
        }
        cx.descend(|cx| nest(cx, levels - 1))
    }

    #[test]
    fn test_descend_tracks_depth() {
        let mut sink = DiagnosticSink::new();
        let mut cx = ResolveCx::new(&mut sink, 8);
        assert_eq!(nest(&mut cx, 5), Ok(5));
        assert_eq!(cx.depth(), 0);
    }

    #[test]
    fn test_descend_limit_is_fatal() {
        let mut sink = DiagnosticSink::new();
        let mut cx = ResolveCx::new(&mut sink, 4);
        assert_eq!(nest(&mut cx, 10), Err(Fatal::RecursionLimit { limit: 4 }));
        assert_eq!(cx.depth(), 0);
    }
}
