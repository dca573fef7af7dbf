//! Qualified name lookup (`A::B::x`, `::x`)

use crate::ambiguity::AmbiguityChecker;
use crate::context::ResolveCx;
use crate::entity::{EntityId, TableId};
use crate::error::{Fatal, ResolveError};
use crate::forest::SymbolForest;
use crate::names::{LookupResult, NameManager, SearchMode};
use crate::role::RoleList;
use crate::stack::ScopeStack;
use crate::table::TableKind;
use sb_intern::{Interner, Symbol};
use sb_span::FileSpan;
use tracing::trace;

/// One `::`-separated segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameSegment {
    /// Short name
    pub name: Symbol,
    /// Segment position
    pub span: FileSpan,
}

/// A possibly qualified name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// Leading `::`: lookup starts at the global table
    pub global: bool,
    /// Segments, outermost first
    pub segments: Vec<NameSegment>,
}

impl QualifiedName {
    /// Unqualified name
    pub fn simple(name: Symbol, span: FileSpan) -> Self {
        Self {
            global: false,
            segments: vec![NameSegment { name, span }],
        }
    }

    /// Split `text` on `::`, interning every segment
    ///
    /// Segment spans are offsets into `text` relative to `at`. Returns
    /// `None` for an empty segment.
    pub fn parse(interner: &Interner, text: &str, at: FileSpan) -> Option<Self> {
        let (global, body, mut offset) = match text.strip_prefix("::") {
            Some(rest) => (true, rest, 2),
            None => (false, text, 0),
        };
        let mut segments = Vec::new();
        for part in body.split("::") {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                return None;
            }
            let lead = part.len() - part.trim_start().len();
            let start = at.span.start + offset + lead as u32;
            segments.push(NameSegment {
                name: interner.intern(trimmed),
                span: FileSpan::new(at.file, start, start + trimmed.len() as u32),
            });
            offset += part.len() as u32 + 2;
        }
        Some(Self { global, segments })
    }

    /// The last segment
    pub fn last(&self) -> Option<NameSegment> {
        self.segments.last().copied()
    }
}

/// Outcome of a qualified lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QualifiedLookup {
    /// What the last segment denotes
    pub roles: RoleList,
    /// Classes and namespaces traversed, outermost first, global table omitted
    pub qualifiers: Vec<EntityId>,
    /// Aliases followed along the way
    pub synonyms: Vec<EntityId>,
}

impl QualifiedLookup {
    /// Whether the name denotes nothing
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Resolves `::`-separated chains
#[derive(Debug, Clone, Copy)]
pub struct QualifiedNameManager<'a> {
    forest: &'a SymbolForest,
    names: NameManager<'a>,
}

impl<'a> QualifiedNameManager<'a> {
    /// Manager over the given forest and open scopes
    pub fn new(forest: &'a SymbolForest, stack: &'a ScopeStack) -> Self {
        Self {
            forest,
            names: NameManager::new(forest, stack),
        }
    }

    /// Resolve `name`, starting in `bind` or by deep search
    ///
    /// A segment that is not a class or namespace is reported and the whole
    /// chain yields an empty result.
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle, when the recursion limit is hit or
    /// when the error budget runs out.
    pub fn resolve(
        &self,
        cx: &mut ResolveCx<'_>,
        name: &QualifiedName,
        bind: Option<TableId>,
    ) -> Result<QualifiedLookup, Fatal> {
        let start = if name.global {
            Some(self.forest.global())
        } else {
            bind
        };
        let mut out = QualifiedLookup::default();
        let mut scope: Option<(EntityId, TableId)> = None;

        for (position, segment) in name.segments.iter().enumerate() {
            let found = match scope {
                None => self.names.lookup(cx, segment.name, start, SearchMode::Symbol)?,
                Some((owner, table)) => cx.descend(|cx| self.member(cx, owner, table, segment.name))?,
            };
            out.synonyms.extend(found.synonyms.iter().copied());

            if position + 1 == name.segments.len() {
                out.roles = found.roles;
                trace!(segments = name.segments.len(), hits = out.roles.len(), "resolved qualified name");
                return Ok(out);
            }

            let checker = AmbiguityChecker::new(self.forest);
            let next = match checker.scope(cx, &found.roles, segment.name, segment.span)? {
                Some(entity) => self.forest.region_of(entity)?.map(|table| (entity, table)),
                None => None,
            };
            let Some((entity, table)) = next else {
                cx.report(ResolveError::NotAScope {
                    name: self.forest.name(segment.name).to_owned(),
                    span: segment.span,
                })?;
                return Ok(QualifiedLookup::default());
            };
            if self.forest.table(table)?.kind() != TableKind::Global {
                out.qualifiers.push(entity);
            }
            scope = Some((entity, table));
        }
        Ok(out)
    }

    /// Lookup of `name` restricted to the class or namespace `table`
    ///
    /// Naming a class by its own name yields its constructors.
    fn member(
        &self,
        cx: &mut ResolveCx<'_>,
        owner: EntityId,
        table: TableId,
        name: Symbol,
    ) -> Result<LookupResult, Fatal> {
        let owner = self.forest.entity(owner)?;
        let is_class = self.forest.table(table)?.kind() == TableKind::Class;
        if is_class && owner.name == name {
            return Ok(LookupResult {
                roles: self.forest.constructors(table)?,
                synonyms: Vec::new(),
            });
        }
        let raw = if is_class {
            self.forest.class_lookup(cx, table, name)?
        } else {
            self.forest.find_in_scope(table, name)?
        };
        self.names.classify(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_span::FileId;

    #[test]
    fn test_parse_segments() {
        let interner = Interner::new();
        let name = QualifiedName::parse(&interner, "::A::B::x", FileSpan::new(FileId(1), 10, 19)).unwrap();
        assert!(name.global);
        let texts: Vec<&str> = name.segments.iter().map(|seg| interner.resolve(seg.name)).collect();
        assert_eq!(texts, vec!["A", "B", "x"]);
        assert_eq!(name.segments[0].span, FileSpan::new(FileId(1), 12, 13));
        assert_eq!(name.segments[2].span, FileSpan::new(FileId(1), 18, 19));
    }

    #[test]
    fn test_parse_rejects_empty_segment() {
        let interner = Interner::new();
        assert!(QualifiedName::parse(&interner, "A::::x", FileSpan::synthetic()).is_none());
        assert!(QualifiedName::parse(&interner, "A::", FileSpan::synthetic()).is_none());
        assert!(QualifiedName::parse(&interner, "", FileSpan::synthetic()).is_none());
    }
}
