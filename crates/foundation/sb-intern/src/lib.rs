//! String interning for short names
//!
//! Every name the resolver compares (entity names, qualifier segments) is
//! interned once, so lookups hash and compare a `u32` key.

pub use lasso::Spur as Symbol;
use lasso::ThreadedRodeo;
use std::fmt;
use std::sync::Arc;

/// Shared string interner
///
/// Cloning is cheap; all clones intern into the same table.
#[derive(Clone, Default)]
pub struct Interner {
    inner: Arc<ThreadedRodeo>,
}

impl Interner {
    /// Create an empty interner
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `text`, returning the existing symbol if it was seen before
    pub fn intern(&self, text: &str) -> Symbol {
        self.inner.get_or_intern(text)
    }

    /// Look up a symbol without interning
    pub fn get(&self, text: &str) -> Option<Symbol> {
        self.inner.get(text)
    }

    /// Text of a symbol produced by this interner
    pub fn resolve(&self, sym: Symbol) -> &str {
        self.inner.resolve(&sym)
    }

    /// Text of a symbol, or `None` if it was interned elsewhere
    pub fn try_resolve(&self, sym: Symbol) -> Option<&str> {
        self.inner.try_resolve(&sym)
    }

    /// Number of distinct strings interned so far
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether nothing has been interned yet
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl fmt::Debug for Interner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interner").field("len", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_is_idempotent() {
        let interner = Interner::new();
        let first = interner.intern("Base");
        let second = interner.intern("Base");
        assert_eq!(first, second);
        assert_eq!(interner.resolve(first), "Base");
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_clones_share_storage() {
        let interner = Interner::new();
        let clone = interner.clone();
        let sym = clone.intern("x");
        assert_eq!(interner.get("x"), Some(sym));
        assert!(interner.get("y").is_none());
    }
}
