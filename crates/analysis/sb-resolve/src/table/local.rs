//! Nested block tables

use super::{file_member, set_entries, EntrySlot, OverloadSets, Scope, TableError, TableKind};
use crate::entity::{EntityId, TableId};
use sb_intern::Symbol;

/// What opened a block table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalKind {
    /// `{ ... }`
    Block,
    /// `catch (...) { ... }`
    Catch,
}

/// One nested block; names here shadow every enclosing table
#[derive(Debug, Clone)]
pub struct LocalTable {
    kind: LocalKind,
    parent: TableId,
    entries: OverloadSets,
}

impl LocalTable {
    /// Block nested in `parent`
    pub fn new(kind: LocalKind, parent: TableId) -> Self {
        Self {
            kind,
            parent,
            entries: OverloadSets::default(),
        }
    }

    /// What opened this block
    pub fn local_kind(&self) -> LocalKind {
        self.kind
    }
}

impl Scope for LocalTable {
    fn kind(&self) -> TableKind {
        TableKind::Local
    }

    fn parent(&self) -> Option<TableId> {
        Some(self.parent)
    }

    fn owner(&self) -> Option<EntityId> {
        None
    }

    fn entries(&self, name: Symbol) -> Vec<EntityId> {
        set_entries(&self.entries, name)
    }

    fn insert(&mut self, name: Symbol, entity: EntityId, slot: EntrySlot) -> Result<usize, TableError> {
        match slot {
            EntrySlot::Member => Ok(file_member(&mut self.entries, name, entity)),
            _ => Err(TableError::SlotNotAllowed {
                slot,
                kind: TableKind::Local,
            }),
        }
    }

    fn names(&self) -> Vec<Symbol> {
        self.entries.keys().copied().collect()
    }

    fn owned(&self) -> Vec<EntityId> {
        self.entries.values().flatten().copied().collect()
    }
}
