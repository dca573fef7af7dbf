//! Global and namespace tables

use super::{file_member, set_entries, EntrySlot, OverloadSets, Scope, TableError, TableKind};
use crate::entity::{EntityId, TableId};
use sb_intern::Symbol;

/// Table of the global scope or of one namespace
///
/// Re-opening a namespace reuses its table, so every body of `namespace N`
/// files into the same overload sets.
#[derive(Debug, Clone, Default)]
pub struct NamespaceTable {
    owner: Option<EntityId>,
    parent: Option<TableId>,
    entries: OverloadSets,
    usings: Vec<TableId>,
}

impl NamespaceTable {
    /// The global table
    pub fn global() -> Self {
        Self::default()
    }

    /// Body of namespace `owner`, nested in `parent`
    pub fn new(owner: EntityId, parent: TableId) -> Self {
        Self {
            owner: Some(owner),
            parent: Some(parent),
            ..Self::default()
        }
    }
}

impl Scope for NamespaceTable {
    fn kind(&self) -> TableKind {
        if self.owner.is_some() {
            TableKind::Namespace
        } else {
            TableKind::Global
        }
    }

    fn parent(&self) -> Option<TableId> {
        self.parent
    }

    fn owner(&self) -> Option<EntityId> {
        self.owner
    }

    fn entries(&self, name: Symbol) -> Vec<EntityId> {
        set_entries(&self.entries, name)
    }

    fn insert(&mut self, name: Symbol, entity: EntityId, slot: EntrySlot) -> Result<usize, TableError> {
        match slot {
            EntrySlot::Member => Ok(file_member(&mut self.entries, name, entity)),
            _ => Err(TableError::SlotNotAllowed {
                slot,
                kind: self.kind(),
            }),
        }
    }

    fn usings(&self) -> &[TableId] {
        &self.usings
    }

    fn add_using(&mut self, peer: TableId) -> Result<(), TableError> {
        if !self.usings.contains(&peer) {
            self.usings.push(peer);
        }
        Ok(())
    }

    fn names(&self) -> Vec<Symbol> {
        self.entries.keys().copied().collect()
    }

    fn owned(&self) -> Vec<EntityId> {
        self.entries.values().flatten().copied().collect()
    }
}
