//! Function body tables

use super::{file_member, set_entries, EntrySlot, OverloadSets, Scope, TableError, TableKind};
use crate::entity::{EntityId, TableId};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use sb_intern::Symbol;

/// Parameters, outermost-block locals and labels of one function
#[derive(Debug, Clone)]
pub struct FunctionTable {
    owner: EntityId,
    parent: TableId,
    params: Vec<(Symbol, EntityId)>,
    locals: OverloadSets,
    labels: IndexMap<Symbol, EntityId, FxBuildHasher>,
    usings: Vec<TableId>,
}

impl FunctionTable {
    /// Body of function `owner`, nested in `parent`
    pub fn new(owner: EntityId, parent: TableId) -> Self {
        Self {
            owner,
            parent,
            params: Vec::new(),
            locals: OverloadSets::default(),
            labels: IndexMap::default(),
            usings: Vec::new(),
        }
    }

    /// Parameters in declaration order
    pub fn params(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.params.iter().map(|(_, entity)| *entity)
    }

    /// Label named `name`; labels have function-wide scope
    pub fn find_label(&self, name: Symbol) -> Option<EntityId> {
        self.labels.get(&name).copied()
    }
}

impl Scope for FunctionTable {
    fn kind(&self) -> TableKind {
        TableKind::Function
    }

    fn parent(&self) -> Option<TableId> {
        Some(self.parent)
    }

    fn owner(&self) -> Option<EntityId> {
        Some(self.owner)
    }

    fn entries(&self, name: Symbol) -> Vec<EntityId> {
        let locals = set_entries(&self.locals, name);
        if !locals.is_empty() {
            return locals;
        }
        self.params
            .iter()
            .filter(|(param, _)| *param == name)
            .map(|(_, entity)| *entity)
            .collect()
    }

    fn insert(&mut self, name: Symbol, entity: EntityId, slot: EntrySlot) -> Result<usize, TableError> {
        match slot {
            EntrySlot::Member => Ok(file_member(&mut self.locals, name, entity)),
            EntrySlot::Parameter => {
                self.params.push((name, entity));
                Ok(self.params.len() - 1)
            }
            EntrySlot::Label => {
                self.labels.insert(name, entity);
                Ok(0)
            }
            EntrySlot::Constructor | EntrySlot::Destructor | EntrySlot::Cast => {
                Err(TableError::SlotNotAllowed {
                    slot,
                    kind: TableKind::Function,
                })
            }
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
        let mut names: Vec<Symbol> = self.locals.keys().copied().collect();
        for (name, _) in &self.params {
            if !names.contains(name) {
                names.push(*name);
            }
        }
        names
    }

    fn owned(&self) -> Vec<EntityId> {
        let mut owned: Vec<EntityId> = self.params().collect();
        owned.extend(self.locals.values().flatten().copied());
        owned.extend(self.labels.values().copied());
        owned
    }
}
