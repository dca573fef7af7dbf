//! Class tables

use super::{file_member, set_entries, EntrySlot, OverloadSets, Scope, TableError, TableKind};
use crate::entity::{Access, EntityId, TableId};
use sb_intern::Symbol;

/// One base-class specifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseSpec {
    /// The base class entity
    pub class: EntityId,
    /// `public`, `protected` or `private` derivation
    pub access: Access,
    /// `virtual` derivation
    pub is_virtual: bool,
}

impl BaseSpec {
    /// Non-virtual base with the given access
    pub fn new(class: EntityId, access: Access) -> Self {
        Self {
            class,
            access,
            is_virtual: false,
        }
    }
}

/// Construction phase of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassState {
    /// Body still being read: members, bases and peers may be added
    #[default]
    Open,
    /// Body complete: read-only
    Sealed,
}

/// Members of one class
///
/// Constructors live only in their own list: inside the class the class
/// name keeps denoting the class. Destructors and conversion operators are
/// filed both by name and in their dedicated slots.
#[derive(Debug, Clone)]
pub struct ClassTable {
    owner: EntityId,
    parent: TableId,
    members: OverloadSets,
    bases: Vec<BaseSpec>,
    usings: Vec<TableId>,
    constructors: Vec<EntityId>,
    destructor: Option<EntityId>,
    casts: Vec<EntityId>,
    state: ClassState,
}

impl ClassTable {
    /// Body of class `owner`, nested in `parent`
    pub fn new(owner: EntityId, parent: TableId) -> Self {
        Self {
            owner,
            parent,
            members: OverloadSets::default(),
            bases: Vec::new(),
            usings: Vec::new(),
            constructors: Vec::new(),
            destructor: None,
            casts: Vec::new(),
            state: ClassState::Open,
        }
    }

    /// Direct bases in declaration order
    pub fn bases(&self) -> &[BaseSpec] {
        &self.bases
    }

    /// Add a direct base
    ///
    /// # Errors
    ///
    /// Returns `TableError::Sealed` once the class is complete.
    pub fn add_base(&mut self, base: BaseSpec) -> Result<(), TableError> {
        self.ensure_open()?;
        self.bases.push(base);
        Ok(())
    }

    /// Constructors in declaration order
    pub fn constructors(&self) -> &[EntityId] {
        &self.constructors
    }

    /// The destructor, if declared
    pub fn destructor(&self) -> Option<EntityId> {
        self.destructor
    }

    /// Conversion operators in declaration order
    pub fn casts(&self) -> &[EntityId] {
        &self.casts
    }

    /// Construction phase
    pub fn state(&self) -> ClassState {
        self.state
    }

    /// Whether the class is complete
    pub fn is_sealed(&self) -> bool {
        self.state == ClassState::Sealed
    }

    /// Mark the class complete; idempotent
    pub fn seal(&mut self) {
        self.state = ClassState::Sealed;
    }

    fn ensure_open(&self) -> Result<(), TableError> {
        match self.state {
            ClassState::Open => Ok(()),
            ClassState::Sealed => Err(TableError::Sealed),
        }
    }
}

impl Scope for ClassTable {
    fn kind(&self) -> TableKind {
        TableKind::Class
    }

    fn parent(&self) -> Option<TableId> {
        Some(self.parent)
    }

    fn owner(&self) -> Option<EntityId> {
        Some(self.owner)
    }

    fn entries(&self, name: Symbol) -> Vec<EntityId> {
        set_entries(&self.members, name)
    }

    fn insert(&mut self, name: Symbol, entity: EntityId, slot: EntrySlot) -> Result<usize, TableError> {
        self.ensure_open()?;
        match slot {
            EntrySlot::Member => Ok(file_member(&mut self.members, name, entity)),
            EntrySlot::Constructor => {
                self.constructors.push(entity);
                Ok(self.constructors.len() - 1)
            }
            EntrySlot::Destructor => {
                if self.destructor.is_some() {
                    return Err(TableError::DuplicateDestructor);
                }
                self.destructor = Some(entity);
                Ok(file_member(&mut self.members, name, entity))
            }
            EntrySlot::Cast => {
                self.casts.push(entity);
                Ok(file_member(&mut self.members, name, entity))
            }
            EntrySlot::Parameter | EntrySlot::Label => Err(TableError::SlotNotAllowed {
                slot,
                kind: TableKind::Class,
            }),
        }
    }

    fn usings(&self) -> &[TableId] {
        &self.usings
    }

    fn add_using(&mut self, peer: TableId) -> Result<(), TableError> {
        self.ensure_open()?;
        if !self.usings.contains(&peer) {
            self.usings.push(peer);
        }
        Ok(())
    }

    fn names(&self) -> Vec<Symbol> {
        self.members.keys().copied().collect()
    }

    fn owned(&self) -> Vec<EntityId> {
        let mut owned: Vec<EntityId> = self.members.values().flatten().copied().collect();
        owned.extend(self.constructors.iter().copied());
        owned
    }
}
