//! Symbol tables: one declarative region each
//!
//! Four variants share the [`Scope`] contract:
//! - [`NamespaceTable`]: the global table and every namespace body
//! - [`ClassTable`]: class members plus base specifiers and special members
//! - [`FunctionTable`]: parameters, outermost-block locals and labels
//! - [`LocalTable`]: a nested block or catch handler
//!
//! Tables only store; they never decide whether an insertion is legal.
//! Lookups that cross tables (using peers, base classes) live on
//! [`SymbolForest`](crate::SymbolForest).

mod class;
mod function;
mod local;
mod namespace;

pub use class::{BaseSpec, ClassState, ClassTable};
pub use function::FunctionTable;
pub use local::{LocalKind, LocalTable};
pub use namespace::NamespaceTable;

use crate::entity::{EntityId, TableId};
use derive_more::Display;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use sb_intern::Symbol;
use thiserror::Error;

/// Names to overload sets, in first-declaration order
pub type OverloadSets = IndexMap<Symbol, Vec<EntityId>, FxBuildHasher>;

/// Variant of a symbol table
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// The single global table
    #[display("global")]
    Global,
    /// A namespace body
    #[display("namespace")]
    Namespace,
    /// A class body
    #[display("class")]
    Class,
    /// A function body (parameters and outermost block)
    #[display("function")]
    Function,
    /// A nested block or catch handler
    #[display("block")]
    Local,
}

impl TableKind {
    /// Function or block
    pub fn is_function_scope(self) -> bool {
        matches!(self, Self::Function | Self::Local)
    }
}

/// Where inside a table an entity is filed
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum EntrySlot {
    /// Ordinary name lookup entry
    #[display("member")]
    Member,
    /// Class constructor list
    #[display("constructor")]
    Constructor,
    /// Class destructor slot
    #[display("destructor")]
    Destructor,
    /// Class conversion-operator list, also visible by name
    #[display("conversion operator")]
    Cast,
    /// Function parameter list
    #[display("parameter")]
    Parameter,
    /// Function label namespace
    #[display("label")]
    Label,
}

/// Structural refusal by a table; always an engine bug
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// The table has no slot of this kind
    #[error("a {kind} table has no {slot} slot")]
    SlotNotAllowed {
        /// Requested slot
        slot: EntrySlot,
        /// Table kind
        kind: TableKind,
    },
    /// The class was already sealed
    #[error("the class is complete and can no longer change")]
    Sealed,
    /// A second destructor
    #[error("the class already has a destructor")]
    DuplicateDestructor,
}

/// Contract shared by every table variant
pub trait Scope {
    /// Variant
    fn kind(&self) -> TableKind;

    /// Lexically enclosing table; `None` only for the global table
    fn parent(&self) -> Option<TableId>;

    /// Entity whose body this table is
    fn owner(&self) -> Option<EntityId>;

    /// Own entries named `name`, without using peers or base classes
    fn entries(&self, name: Symbol) -> Vec<EntityId>;

    /// File `entity` under `name`; returns its index within the slot
    ///
    /// # Errors
    ///
    /// Returns a `TableError` when the slot does not exist in this variant
    /// or the table no longer accepts entries.
    fn insert(&mut self, name: Symbol, entity: EntityId, slot: EntrySlot) -> Result<usize, TableError>;

    /// Tables consulted by `find_symbol` after this one
    fn usings(&self) -> &[TableId] {
        &[]
    }

    /// Register a using peer
    ///
    /// # Errors
    ///
    /// Fails for variants without peers and for sealed classes.
    fn add_using(&mut self, _peer: TableId) -> Result<(), TableError> {
        Err(TableError::SlotNotAllowed {
            slot: EntrySlot::Member,
            kind: self.kind(),
        })
    }

    /// Names with at least one entry, in declaration order
    fn names(&self) -> Vec<Symbol>;

    /// Every entity this table owns, in any slot
    fn owned(&self) -> Vec<EntityId>;
}

/// A symbol table of any variant
#[derive(Debug, Clone)]
pub enum SymbolTable {
    /// Global or namespace table
    Namespace(NamespaceTable),
    /// Class table
    Class(ClassTable),
    /// Function table
    Function(FunctionTable),
    /// Block table
    Local(LocalTable),
}

impl SymbolTable {
    /// Shared contract
    pub fn as_scope(&self) -> &dyn Scope {
        match self {
            Self::Namespace(table) => table,
            Self::Class(table) => table,
            Self::Function(table) => table,
            Self::Local(table) => table,
        }
    }

    /// Shared contract, mutably
    pub fn as_scope_mut(&mut self) -> &mut dyn Scope {
        match self {
            Self::Namespace(table) => table,
            Self::Class(table) => table,
            Self::Function(table) => table,
            Self::Local(table) => table,
        }
    }

    /// Variant
    pub fn kind(&self) -> TableKind {
        self.as_scope().kind()
    }

    /// Class payload
    pub fn as_class(&self) -> Option<&ClassTable> {
        match self {
            Self::Class(table) => Some(table),
            _ => None,
        }
    }

    /// Class payload, mutably
    pub fn as_class_mut(&mut self) -> Option<&mut ClassTable> {
        match self {
            Self::Class(table) => Some(table),
            _ => None,
        }
    }

    /// Function payload
    pub fn as_function(&self) -> Option<&FunctionTable> {
        match self {
            Self::Function(table) => Some(table),
            _ => None,
        }
    }
}

pub(crate) fn file_member(sets: &mut OverloadSets, name: Symbol, entity: EntityId) -> usize {
    let set = sets.entry(name).or_default();
    set.push(entity);
    set.len() - 1
}

pub(crate) fn set_entries(sets: &OverloadSets, name: Symbol) -> Vec<EntityId> {
    sets.get(&name).cloned().unwrap_or_default()
}
