//! Scope and name resolution for a C++-like front end
//!
//! This crate tracks every declared entity of a compilation unit in a forest
//! of symbol tables, answers unqualified and qualified lookups the way the
//! language's scoping rules demand, and decides whether a new declaration
//! redeclares, overloads or conflicts with what is already visible.
//!
//! # Architecture
//!
//! - **Entities and tables**: [`SymbolForest`] owns both arenas; handles are
//!   generation-checked so a dropped function body cannot be reached again
//! - **Roles**: how a lookup hit is seen ([`Role`]), derived from the entity
//!   kind and where it lives
//! - **Lookup**: [`NameManager`] for plain names, [`QualifiedNameManager`]
//!   for `A::B::x`, [`AmbiguityChecker`] to narrow a hit list
//! - **Checking**: [`decl_equal`] and [`RedeclarationChecker`]
//! - **Driving**: [`Engine`] ties the forest, the [`ScopeStack`] and the
//!   diagnostic sink together
//!
//! # Usage
//!
//! ```rust,ignore
//! use sb_resolve::{Engine, EntityDraft, OpenScope};
//!
//! let mut engine = Engine::new(interner);
//! let ns = engine.declare(EntityDraft::namespace(name, span))?.entity();
//! engine.open_scope(OpenScope::Namespace(ns))?;
//! // declare members, resolve names ...
//! engine.close_scope()?;
//! let diagnostics = engine.finish()?;
//! ```

pub mod ambiguity;
pub mod config;
pub mod context;
pub mod decl_eq;
pub mod engine;
pub mod entity;
pub mod error;
pub mod forest;
pub mod names;
pub mod qualified;
pub mod redecl;
pub mod role;
pub mod stack;
pub mod table;

pub use ambiguity::{AmbiguityChecker, OverloadMode};
pub use config::{ConfigError, EngineConfig};
pub use context::ResolveCx;
pub use decl_eq::{EqMode, decl_equal, params_match};
pub use engine::{Declared, Engine, OpenScope};
pub use entity::{
    Access, AliasTarget, ClassKey, Entity, EntityDraft, EntityId, EntityKind, FunctionFlavor, Storage, TableId,
    Type,
};
pub use error::{Fatal, ResolveError};
pub use forest::{Inserted, SymbolForest};
pub use names::{LookupResult, NameManager, SearchMode};
pub use qualified::{NameSegment, QualifiedLookup, QualifiedName, QualifiedNameManager};
pub use redecl::{RedeclOutcome, RedeclarationChecker};
pub use role::{Role, RoleEntry, RoleList};
pub use stack::ScopeStack;
pub use table::{BaseSpec, TableKind};
