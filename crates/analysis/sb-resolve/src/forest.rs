//! The symbol-table forest of one compilation unit
//!
//! Owns every entity and every table. Tables refer to entities and to each
//! other through generation-checked handles, so discarding a finished
//! function body leaves stale handles behind instead of dangling ones.

use crate::context::ResolveCx;
use crate::entity::{
    Access, AliasTarget, Derived, Entity, EntityDraft, EntityId, EntityKind, FunctionFlavor, TableId,
};
use crate::error::Fatal;
use crate::role::{Role, RoleList};
use crate::table::{
    BaseSpec, ClassTable, EntrySlot, FunctionTable, LocalKind, LocalTable, NamespaceTable, Scope,
    SymbolTable, TableError, TableKind,
};
use rustc_hash::FxHashSet;
use sb_arena::GenArena;
use sb_intern::{Interner, Symbol};
use tracing::{debug, trace};

/// Where an entity was filed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    /// The new entity
    pub entity: EntityId,
    /// Position within its overload set or slot, used to suffix generated names
    pub index: usize,
}

/// Every entity and symbol table of one compilation unit
#[derive(Debug)]
pub struct SymbolForest {
    entities: GenArena<Entity>,
    tables: GenArena<SymbolTable>,
    global: TableId,
    interner: Interner,
}

impl SymbolForest {
    /// Forest holding only the global table
    pub fn new(interner: Interner) -> Self {
        let mut tables = GenArena::new();
        let global = tables.alloc(SymbolTable::Namespace(NamespaceTable::global()));
        Self {
            entities: GenArena::new(),
            tables,
            global,
            interner,
        }
    }

    /// The single global table
    pub fn global(&self) -> TableId {
        self.global
    }

    /// Interner for short names
    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    /// Text of a short name
    pub fn name(&self, name: Symbol) -> &str {
        self.interner.resolve(name)
    }

    /// Look up an entity
    ///
    /// # Errors
    ///
    /// Returns `Fatal::StaleHandle` if the entity was discarded.
    pub fn entity(&self, id: EntityId) -> Result<&Entity, Fatal> {
        self.entities.get(id).ok_or(Fatal::StaleHandle { what: "entity" })
    }

    fn entity_mut(&mut self, id: EntityId) -> Result<&mut Entity, Fatal> {
        self.entities.get_mut(id).ok_or(Fatal::StaleHandle { what: "entity" })
    }

    /// Look up a table
    ///
    /// # Errors
    ///
    /// Returns `Fatal::StaleHandle` if the table was discarded.
    pub fn table(&self, id: TableId) -> Result<&SymbolTable, Fatal> {
        self.tables.get(id).ok_or(Fatal::StaleHandle { what: "table" })
    }

    fn table_mut(&mut self, id: TableId) -> Result<&mut SymbolTable, Fatal> {
        self.tables.get_mut(id).ok_or(Fatal::StaleHandle { what: "table" })
    }

    /// Whether the entity handle is still live
    pub fn contains_entity(&self, id: EntityId) -> bool {
        self.entities.contains(id)
    }

    /// Whether the table handle is still live
    pub fn contains_table(&self, id: TableId) -> bool {
        self.tables.contains(id)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of live tables
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Create the body table of `function`, nested in the function's owner
    ///
    /// # Errors
    ///
    /// Fails fatally if `function` is stale or not a function.
    pub fn open_function(&mut self, function: EntityId) -> Result<TableId, Fatal> {
        let entity = self.entity(function)?;
        if entity.kind.as_function().is_none() {
            return Err(Fatal::MalformedEntity {
                name: self.name(entity.name).to_owned(),
                reason: format!("a {} has no function body", entity.kind.describe()),
            });
        }
        let parent = entity.owner;
        let table = self
            .tables
            .alloc(SymbolTable::Function(FunctionTable::new(function, parent)));
        self.entity_mut(function)?.scope = Some(table);
        debug!(?table, ?function, "created function table");
        Ok(table)
    }

    /// Create a block table nested in `parent`
    ///
    /// # Errors
    ///
    /// Returns `Fatal::NotInFunction` unless `parent` is a function or block table.
    pub fn open_block(&mut self, kind: LocalKind, parent: TableId) -> Result<TableId, Fatal> {
        if !self.table(parent)?.kind().is_function_scope() {
            return Err(Fatal::NotInFunction);
        }
        let table = self
            .tables
            .alloc(SymbolTable::Local(LocalTable::new(kind, parent)));
        debug!(?table, ?parent, ?kind, "created block table");
        Ok(table)
    }

    /// Release a function or block table and every entity it owns
    ///
    /// Body tables of released classes go with them. Returns the number of
    /// entities released. Handles to them go stale.
    ///
    /// # Errors
    ///
    /// Fails fatally for the global table or a stale handle.
    pub fn remove_table(&mut self, table: TableId) -> Result<usize, Fatal> {
        if table == self.global {
            return Err(Fatal::PopGlobal);
        }
        let removed = self
            .tables
            .remove(table)
            .ok_or(Fatal::StaleHandle { what: "table" })?;
        let scope = removed.as_scope();
        if let Some(entity) = scope.owner().and_then(|owner| self.entities.get_mut(owner)) {
            if entity.scope == Some(table) {
                entity.scope = None;
            }
        }
        let mut released = 0;
        for id in scope.owned() {
            let Some(entity) = self.entities.remove(id) else {
                continue;
            };
            released += 1;
            if let Some(body) = entity.scope.filter(|&body| body != table && self.tables.contains(body)) {
                released += self.remove_table(body)?;
            }
        }
        debug!(?table, released, "discarded table");
        Ok(released)
    }

    /// File a new entity into `table`
    ///
    /// Classes and namespaces get their body table here. No redeclaration
    /// checking happens: callers consult the redeclaration checker first.
    ///
    /// # Errors
    ///
    /// Fails fatally when the entity is malformed, the table has no slot
    /// for it, or the table is a sealed class.
    pub fn add_entity(&mut self, table: TableId, draft: EntityDraft) -> Result<Inserted, Fatal> {
        let table_kind = self.table(table)?.kind();
        self.validate(&draft, table_kind)?;

        let slot = slot_for(&draft.kind);
        let EntityDraft {
            name,
            kind,
            access,
            span,
        } = draft;
        let body = match kind {
            EntityKind::Namespace => Some(true),
            EntityKind::Class(_) => Some(false),
            _ => None,
        };
        let entity = self.entities.alloc(Entity {
            name,
            owner: table,
            kind,
            access,
            span,
            scope: None,
        });

        let filed = self.table_mut(table)?.as_scope_mut().insert(name, entity, slot);
        let index = match filed {
            Ok(index) => index,
            Err(source) => {
                self.entities.remove(entity);
                return Err(self.table_error(table, name, source));
            }
        };

        if let Some(is_namespace) = body {
            let region = if is_namespace {
                SymbolTable::Namespace(NamespaceTable::new(entity, table))
            } else {
                SymbolTable::Class(ClassTable::new(entity, table))
            };
            let region = self.tables.alloc(region);
            self.entity_mut(entity)?.scope = Some(region);
        }

        debug!(name = self.name(name), ?entity, ?table, %slot, index, "inserted entity");
        Ok(Inserted { entity, index })
    }

    fn validate(&self, draft: &EntityDraft, table_kind: TableKind) -> Result<(), Fatal> {
        let malformed = |reason: &str| Fatal::MalformedEntity {
            name: self.name(draft.name).to_owned(),
            reason: reason.to_owned(),
        };
        match &draft.kind {
            EntityKind::Function(data) => {
                if !matches!(data.ty.derived.first(), Some(Derived::Function(_))) {
                    return Err(malformed("function type does not start with a signature"));
                }
            }
            EntityKind::Namespace | EntityKind::NamespaceAlias { .. }
                if !matches!(table_kind, TableKind::Global | TableKind::Namespace) =>
            {
                return Err(malformed("namespaces belong at namespace scope"));
            }
            EntityKind::NamespaceAlias { target } => {
                if !matches!(self.entity(*target)?.kind, EntityKind::Namespace) {
                    return Err(malformed("alias target is not a namespace"));
                }
            }
            EntityKind::UsingAlias(AliasTarget::Entity(target)) => {
                if matches!(
                    self.entity(*target)?.kind,
                    EntityKind::UsingAlias(_) | EntityKind::NamespaceAlias { .. }
                ) {
                    return Err(malformed("an alias cannot name another alias"));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn table_error(&self, table: TableId, name: Symbol, source: TableError) -> Fatal {
        match source {
            TableError::Sealed => Fatal::SealedClass {
                class: self
                    .table(table)
                    .ok()
                    .and_then(|table| table.as_scope().owner())
                    .and_then(|owner| self.qualified_name(owner).ok())
                    .unwrap_or_default(),
            },
            TableError::SlotNotAllowed { .. } => Fatal::MalformedEntity {
                name: self.name(name).to_owned(),
                reason: source.to_string(),
            },
            TableError::DuplicateDestructor => Fatal::Table {
                name: self.name(name).to_owned(),
                source,
            },
        }
    }

    /// Register `peer` as a using peer of `table`
    ///
    /// # Errors
    ///
    /// Fails fatally for block tables, sealed classes and stale handles.
    pub fn add_using(&mut self, table: TableId, peer: TableId) -> Result<(), Fatal> {
        self.table(peer)?;
        let added = self.table_mut(table)?.as_scope_mut().add_using(peer);
        added.map_err(|source| self.table_error(table, self.interner.intern("using"), source))?;
        debug!(?table, ?peer, "added using peer");
        Ok(())
    }

    /// Add a direct base to an open class
    ///
    /// # Errors
    ///
    /// Fails fatally when `class` is not a class table or is sealed.
    pub fn add_base(&mut self, class: TableId, base: BaseSpec) -> Result<(), Fatal> {
        let base_name = self.entity(base.class)?.name;
        let added = match self.table_mut(class)?.as_class_mut() {
            Some(table) => table.add_base(base),
            None => Err(TableError::SlotNotAllowed {
                slot: EntrySlot::Member,
                kind: TableKind::Class,
            }),
        };
        added.map_err(|source| self.table_error(class, base_name, source))
    }

    /// Mark a class complete
    ///
    /// # Errors
    ///
    /// Fails fatally when `class` is not a class table.
    pub fn seal(&mut self, class: TableId) -> Result<(), Fatal> {
        match self.table_mut(class)?.as_class_mut() {
            Some(table) => {
                table.seal();
                debug!(?class, "sealed class");
                Ok(())
            }
            None => Err(Fatal::MalformedEntity {
                name: String::new(),
                reason: "only classes can be sealed".to_owned(),
            }),
        }
    }

    /// Role of an entity, derived from its kind and owning table
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn role_of(&self, id: EntityId) -> Result<Role, Fatal> {
        let entity = self.entity(id)?;
        let in_class = self.table(entity.owner)?.kind() == TableKind::Class;
        let role = Role::derive(&entity.kind, in_class);
        trace!(entity = ?id, %role, "derived role");
        Ok(role)
    }

    /// Role a draft would have once filed into `table`
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn role_for_draft(&self, draft: &EntityDraft, table: TableId) -> Result<Role, Fatal> {
        let in_class = self.table(table)?.kind() == TableKind::Class;
        Ok(Role::derive(&draft.kind, in_class))
    }

    fn roles_of(&self, entities: impl IntoIterator<Item = EntityId>) -> Result<RoleList, Fatal> {
        let mut roles = RoleList::new();
        for entity in entities {
            roles.push(entity, self.role_of(entity)?);
        }
        Ok(roles)
    }

    /// Own entries of `table` named `name`
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn find_in_scope(&self, table: TableId, name: Symbol) -> Result<RoleList, Fatal> {
        self.roles_of(self.table(table)?.as_scope().entries(name))
    }

    /// Own entries plus inherited class members plus every transitively
    /// reachable using peer
    ///
    /// Each table is visited at most once, so mutually using namespaces
    /// terminate.
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle or when the recursion limit is hit.
    pub fn find_symbol(&self, cx: &mut ResolveCx<'_>, table: TableId, name: Symbol) -> Result<RoleList, Fatal> {
        let mut visited = FxHashSet::default();
        let mut found = RoleList::new();
        self.collect_symbol(cx, table, name, &mut visited, &mut found)?;
        trace!(name = self.name(name), ?table, hits = found.len(), "find_symbol");
        Ok(found)
    }

    fn collect_symbol(
        &self,
        cx: &mut ResolveCx<'_>,
        table: TableId,
        name: Symbol,
        visited: &mut FxHashSet<TableId>,
        found: &mut RoleList,
    ) -> Result<(), Fatal> {
        if !visited.insert(table) {
            return Ok(());
        }
        let scope = self.table(table)?;
        let own = match scope {
            SymbolTable::Class(class) => self.class_members(cx, class, name)?,
            _ => self.find_in_scope(table, name)?,
        };
        found.extend(own);
        for &peer in scope.as_scope().usings() {
            cx.descend(|cx| self.collect_symbol(cx, peer, name, visited, found))?;
        }
        Ok(())
    }

    /// Members of a class named `name`, searching bases on a miss
    ///
    /// An own member hides every base member of the same name. Hits from
    /// several bases are merged; the same entity reached twice counts once.
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle or when the recursion limit is hit.
    pub fn class_lookup(&self, cx: &mut ResolveCx<'_>, table: TableId, name: Symbol) -> Result<RoleList, Fatal> {
        match self.table(table)? {
            SymbolTable::Class(class) => self.class_members(cx, class, name),
            _ => self.find_in_scope(table, name),
        }
    }

    fn class_members(&self, cx: &mut ResolveCx<'_>, class: &ClassTable, name: Symbol) -> Result<RoleList, Fatal> {
        let own = class.entries(name);
        if !own.is_empty() {
            return self.roles_of(own);
        }
        let mut found = RoleList::new();
        for base in class.bases() {
            let Some(body) = self.entity(base.class)?.scope else {
                continue;
            };
            let Some(base_table) = self.table(body)?.as_class() else {
                continue;
            };
            found.extend(cx.descend(|cx| self.class_members(cx, base_table, name))?);
        }
        Ok(found)
    }

    /// Constructors of a class table, in declaration order
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn constructors(&self, table: TableId) -> Result<RoleList, Fatal> {
        match self.table(table)?.as_class() {
            Some(class) => self.roles_of(class.constructors().iter().copied()),
            None => Ok(RoleList::new()),
        }
    }

    /// Label `name` of a function table
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn find_label(&self, table: TableId, name: Symbol) -> Result<Option<EntityId>, Fatal> {
        Ok(self
            .table(table)?
            .as_function()
            .and_then(|function| function.find_label(name)))
    }

    /// The class or namespace body an entity designates, following
    /// namespace aliases and typedefs of classes
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn region_of(&self, id: EntityId) -> Result<Option<TableId>, Fatal> {
        let entity = self.entity(id)?;
        let target = match &entity.kind {
            EntityKind::NamespaceAlias { target } | EntityKind::UsingAlias(AliasTarget::Entity(target)) => *target,
            EntityKind::UsingAlias(AliasTarget::Type(ty)) => match ty.named_entity() {
                Some(target) => target,
                None => return Ok(None),
            },
            _ => id,
        };
        let target = self.entity(target)?;
        Ok(if target.kind.opens_region() {
            target.scope
        } else {
            None
        })
    }

    /// Chain of base specifiers leading from class `from` to class `to`
    ///
    /// Depth-first in declaration order; `Some(vec![])` when they coincide.
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle or when the recursion limit is hit.
    pub fn base_path(
        &self,
        cx: &mut ResolveCx<'_>,
        from: EntityId,
        to: EntityId,
    ) -> Result<Option<Vec<BaseSpec>>, Fatal> {
        if from == to {
            return Ok(Some(Vec::new()));
        }
        let Some(body) = self.entity(from)?.scope else {
            return Ok(None);
        };
        let Some(class) = self.table(body)?.as_class() else {
            return Ok(None);
        };
        for base in class.bases() {
            if let Some(mut path) = cx.descend(|cx| self.base_path(cx, base.class, to))? {
                path.insert(0, *base);
                return Ok(Some(path));
            }
        }
        Ok(None)
    }

    /// Access of a member reached through a chain of base specifiers
    pub fn effective_access(member: Access, through: &[BaseSpec]) -> Access {
        through
            .iter()
            .fold(member, |access, base| access.stricter(base.access))
    }

    /// Display name such as `A::B::x`
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn qualified_name(&self, id: EntityId) -> Result<String, Fatal> {
        let entity = self.entity(id)?;
        let mut parts = vec![self.name(entity.name)];
        let mut table = Some(entity.owner);
        while let Some(current) = table {
            let scope = self.table(current)?.as_scope();
            if let Some(owner) = scope.owner() {
                parts.push(self.name(self.entity(owner)?.name));
            }
            table = scope.parent();
        }
        parts.reverse();
        Ok(parts.join("::"))
    }

    /// Names visible in `table` and its direct using peers
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn visible_names(&self, table: TableId) -> Result<Vec<Symbol>, Fatal> {
        let scope = self.table(table)?.as_scope();
        let mut names = scope.names();
        for &peer in scope.usings() {
            names.extend(self.table(peer)?.as_scope().names());
        }
        Ok(names)
    }

    /// Human-readable listing of a table
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle.
    pub fn dump(&self, table: TableId) -> Result<String, Fatal> {
        let symbol_table = self.table(table)?;
        let scope = symbol_table.as_scope();
        let title = match scope.owner() {
            Some(owner) => self.qualified_name(owner)?,
            None if table == self.global => "<global>".to_owned(),
            None => "<block>".to_owned(),
        };
        let mut lines = vec![format!("{} {title}", scope.kind())];

        if let Some(class) = symbol_table.as_class() {
            for base in class.bases() {
                let virtual_kw = if base.is_virtual { " virtual" } else { "" };
                lines.push(format!(
                    "  base {}{virtual_kw} {}",
                    base.access,
                    self.qualified_name(base.class)?
                ));
            }
            if !class.constructors().is_empty() {
                lines.push(format!("  constructors: {}", class.constructors().len()));
            }
        }
        if let Some(function) = symbol_table.as_function() {
            let params = function
                .params()
                .map(|param| -> Result<&str, Fatal> { Ok(self.name(self.entity(param)?.name)) })
                .collect::<Result<Vec<_>, _>>()?;
            lines.push(format!("  params: ({})", params.join(", ")));
        }
        for name in scope.names() {
            let roles = self.find_in_scope(table, name)?;
            let roles: Vec<String> = roles.iter().map(|entry| entry.role.to_string()).collect();
            lines.push(format!("  {}: {}", self.name(name), roles.join(", ")));
        }
        if symbol_table.as_class().is_some_and(ClassTable::is_sealed) {
            lines.push("  (sealed)".to_owned());
        }
        Ok(lines.join("\n"))
    }
}

fn slot_for(kind: &EntityKind) -> EntrySlot {
    match kind {
        EntityKind::Parameter(_) => EntrySlot::Parameter,
        EntityKind::Label => EntrySlot::Label,
        EntityKind::Function(data) => match data.flavor {
            FunctionFlavor::Constructor => EntrySlot::Constructor,
            FunctionFlavor::Destructor => EntrySlot::Destructor,
            FunctionFlavor::Cast => EntrySlot::Cast,
            FunctionFlavor::Plain | FunctionFlavor::Operator => EntrySlot::Member,
        },
        _ => EntrySlot::Member,
    }
}
