//! Unqualified name lookup

use crate::context::ResolveCx;
use crate::entity::{AliasTarget, EntityId, EntityKind, TableId};
use crate::error::Fatal;
use crate::forest::SymbolForest;
use crate::role::{Role, RoleList};
use crate::stack::ScopeStack;
use sb_intern::Symbol;
use tracing::trace;

/// Which table operation a lookup uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Own entries, inherited members and using peers
    #[default]
    Symbol,
    /// Own entries only
    InScope,
}

/// Outcome of a lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupResult {
    /// What the name denotes, aliases already followed
    pub roles: RoleList,
    /// Aliases that were followed to produce `roles`
    pub synonyms: Vec<EntityId>,
}

impl LookupResult {
    /// Whether the name denotes nothing
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// Resolves one unqualified name
#[derive(Debug, Clone, Copy)]
pub struct NameManager<'a> {
    forest: &'a SymbolForest,
    stack: &'a ScopeStack,
}

impl<'a> NameManager<'a> {
    /// Manager over the given forest and open scopes
    pub fn new(forest: &'a SymbolForest, stack: &'a ScopeStack) -> Self {
        Self { forest, stack }
    }

    /// Resolve `name` in `bind`, or by deep search through the open scopes
    ///
    /// Deep search stops at the innermost table with any hit; results from
    /// different nesting levels are never merged.
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle or when the recursion limit is hit.
    pub fn lookup(
        &self,
        cx: &mut ResolveCx<'_>,
        name: Symbol,
        bind: Option<TableId>,
        mode: SearchMode,
    ) -> Result<LookupResult, Fatal> {
        if let Some(table) = bind {
            let raw = self.raw(cx, table, name, mode)?;
            return self.classify(raw);
        }
        for table in self.stack.iter() {
            let raw = self.raw(cx, table, name, mode)?;
            if !raw.is_empty() {
                trace!(name = self.forest.name(name), ?table, "deep search hit");
                return self.classify(raw);
            }
        }
        trace!(name = self.forest.name(name), "deep search found nothing");
        Ok(LookupResult::default())
    }

    fn raw(&self, cx: &mut ResolveCx<'_>, table: TableId, name: Symbol, mode: SearchMode) -> Result<RoleList, Fatal> {
        match mode {
            SearchMode::Symbol => self.forest.find_symbol(cx, table, name),
            SearchMode::InScope => self.forest.find_in_scope(table, name),
        }
    }

    /// Replace alias hits by what they alias, remembering the aliases
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn classify(&self, raw: RoleList) -> Result<LookupResult, Fatal> {
        let mut result = LookupResult::default();
        for entry in raw {
            let entity = self.forest.entity(entry.entity)?;
            let target = match &entity.kind {
                EntityKind::UsingAlias(AliasTarget::Entity(target)) => Some(*target),
                EntityKind::NamespaceAlias { target } => Some(*target),
                _ => None,
            };
            match target {
                Some(target) => {
                    let role = self.forest.role_of(target)?;
                    trace!(alias = ?entry.entity, ?target, %role, "followed alias");
                    result.roles.push(target, role);
                    if !result.synonyms.contains(&entry.entity) {
                        result.synonyms.push(entry.entity);
                    }
                }
                None => result.roles.push(entry.entity, entry.role),
            }
        }
        Ok(result)
    }

    /// Deep search keeping only the hits that answer a query for `role`
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle or when the recursion limit is hit.
    pub fn lookup_role(&self, cx: &mut ResolveCx<'_>, name: Symbol, role: Role) -> Result<RoleList, Fatal> {
        let found = self.lookup(cx, name, None, SearchMode::Symbol)?;
        Ok(found.roles.with_role(role).collect())
    }
}
