//! The engine facade used by declaration builders
//!
//! Ties the forest, the scope stack and the diagnostic sink together and
//! exposes the operations a parser drives: opening and closing scopes,
//! resolving names, checking and inserting declarations.

use crate::ambiguity::AmbiguityChecker;
use crate::config::EngineConfig;
use crate::context::ResolveCx;
use crate::entity::{Access, EntityDraft, EntityId, EntityKind, FunctionFlavor, TableId};
use crate::error::{Fatal, ResolveError};
use crate::forest::{Inserted, SymbolForest};
use crate::names::{LookupResult, NameManager, SearchMode};
use crate::qualified::{QualifiedLookup, QualifiedName, QualifiedNameManager};
use crate::redecl::{RedeclOutcome, RedeclarationChecker};
use crate::role::{Role, RoleEntry, RoleList};
use crate::stack::ScopeStack;
use crate::table::{BaseSpec, LocalKind, Scope, TableKind};
use sb_diagnostics::DiagnosticSink;
use sb_intern::{Interner, Symbol};
use sb_span::FileSpan;
use tracing::debug;

/// A lexical construct being entered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenScope {
    /// Body of a declared namespace
    Namespace(EntityId),
    /// Body of a declared class
    Class(EntityId),
    /// Body of a declared function; a fresh table is created
    Function(EntityId),
    /// Nested block
    Block,
    /// Catch handler
    Catch,
}

/// What [`Engine::declare`] did with a draft
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declared {
    /// Inserted as a new entity
    New(Inserted),
    /// Same declaration as an existing entity, which was kept
    Redeclared(EntityId),
    /// Conflicted with an existing entity, which was kept; already reported
    Rejected(EntityId),
}

impl Declared {
    /// The entity later code should refer to
    pub fn entity(&self) -> EntityId {
        match self {
            Self::New(inserted) => inserted.entity,
            Self::Redeclared(entity) | Self::Rejected(entity) => *entity,
        }
    }

    /// Whether a new entity was inserted
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// Scope and name-resolution engine of one compilation unit
#[derive(Debug)]
pub struct Engine {
    forest: SymbolForest,
    stack: ScopeStack,
    sink: DiagnosticSink,
    config: EngineConfig,
}

impl Engine {
    /// Engine with the default configuration
    pub fn new(interner: Interner) -> Self {
        Self::with_config(interner, EngineConfig::default())
    }

    /// Engine with an explicit configuration
    pub fn with_config(interner: Interner, config: EngineConfig) -> Self {
        let forest = SymbolForest::new(interner);
        let stack = ScopeStack::new(forest.global());
        Self {
            forest,
            stack,
            sink: DiagnosticSink::with_config(config.diagnostics),
            config,
        }
    }

    /// The symbol-table forest
    pub fn forest(&self) -> &SymbolForest {
        &self.forest
    }

    /// The open scopes
    pub fn stack(&self) -> &ScopeStack {
        &self.stack
    }

    /// Diagnostics reported so far
    pub fn diagnostics(&self) -> &DiagnosticSink {
        &self.sink
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Intern a short name
    pub fn intern(&self, text: &str) -> Symbol {
        self.forest.interner().intern(text)
    }

    /// Innermost open table
    pub fn current(&self) -> TableId {
        self.stack.current()
    }

    /// Enter a lexical construct
    ///
    /// # Errors
    ///
    /// Fails fatally when the entity does not open a region of the requested
    /// kind, or a block is opened outside a function.
    pub fn open_scope(&mut self, scope: OpenScope) -> Result<TableId, Fatal> {
        let table = match scope {
            OpenScope::Namespace(entity) => self.region(entity, TableKind::Namespace)?,
            OpenScope::Class(entity) => self.region(entity, TableKind::Class)?,
            OpenScope::Function(entity) => self.forest.open_function(entity)?,
            OpenScope::Block => self.forest.open_block(LocalKind::Block, self.stack.current())?,
            OpenScope::Catch => self.forest.open_block(LocalKind::Catch, self.stack.current())?,
        };
        self.stack.push(table);
        debug!(?scope, ?table, "opened scope");
        Ok(table)
    }

    fn region(&self, entity: EntityId, kind: TableKind) -> Result<TableId, Fatal> {
        if let Some(table) = self.forest.region_of(entity)? {
            if self.forest.table(table)?.kind() == kind {
                return Ok(table);
            }
        }
        Err(Fatal::MalformedEntity {
            name: self.forest.qualified_name(entity)?,
            reason: format!("does not open a {kind} scope"),
        })
    }

    /// Leave the innermost construct
    ///
    /// Function and block tables are released when `discard_closed_scopes`
    /// is set; namespace and class tables always persist.
    ///
    /// # Errors
    ///
    /// Returns `Fatal::PopGlobal` when only the global scope is open.
    pub fn close_scope(&mut self) -> Result<TableId, Fatal> {
        let table = self.stack.pop()?;
        if self.config.discard_closed_scopes && self.forest.table(table)?.kind().is_function_scope() {
            self.forest.remove_table(table)?;
        }
        debug!(?table, "closed scope");
        Ok(table)
    }

    /// Leave the innermost construct, which must be `expected`
    ///
    /// # Errors
    ///
    /// Returns `Fatal::ScopeImbalance` when another table is innermost.
    pub fn close_scope_checked(&mut self, expected: TableId) -> Result<TableId, Fatal> {
        let found = self.stack.current();
        if found != expected {
            return Err(Fatal::ScopeImbalance { expected, found });
        }
        self.close_scope()
    }

    /// Open the bodies of a qualifier chain, e.g. before an out-of-class
    /// member definition; returns the count to pass to [`pop_chain`](Self::pop_chain)
    ///
    /// # Errors
    ///
    /// Fails fatally when a qualifier is not a class or namespace.
    pub fn push_chain(&mut self, qualifiers: &[EntityId]) -> Result<usize, Fatal> {
        let mut tables = Vec::with_capacity(qualifiers.len());
        for &qualifier in qualifiers {
            let table = self.forest.region_of(qualifier)?.ok_or_else(|| Fatal::MalformedEntity {
                name: self.forest.qualified_name(qualifier).unwrap_or_default(),
                reason: "qualifier is not a class or namespace".to_owned(),
            })?;
            tables.push(table);
        }
        Ok(self.stack.push_chain(&tables))
    }

    /// Close a chain opened by [`push_chain`](Self::push_chain)
    ///
    /// # Errors
    ///
    /// Returns `Fatal::PopGlobal` if fewer scopes are open.
    pub fn pop_chain(&mut self, count: usize) -> Result<(), Fatal> {
        self.stack.pop_chain(count)
    }

    /// Resolve an unqualified name in `bind`, or by deep search
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle or when the recursion limit is hit.
    pub fn resolve(&mut self, name: Symbol, bind: Option<TableId>, mode: SearchMode) -> Result<LookupResult, Fatal> {
        let mut cx = ResolveCx::new(&mut self.sink, self.config.max_depth);
        NameManager::new(&self.forest, &self.stack).lookup(&mut cx, name, bind, mode)
    }

    /// Resolve a qualified name
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle, when the recursion limit is hit or
    /// when reporting exhausts the error budget.
    pub fn resolve_qualified(&mut self, name: &QualifiedName, bind: Option<TableId>) -> Result<QualifiedLookup, Fatal> {
        let mut cx = ResolveCx::new(&mut self.sink, self.config.max_depth);
        QualifiedNameManager::new(&self.forest, &self.stack).resolve(&mut cx, name, bind)
    }

    /// Check `draft` against `prior` as if filed into the current table
    ///
    /// # Errors
    ///
    /// Fails fatally on a malformed draft or an exhausted error budget.
    pub fn check_redeclaration(
        &mut self,
        draft: &EntityDraft,
        prior: &RoleList,
        role: Role,
    ) -> Result<RedeclOutcome, Fatal> {
        let target = self.target_for(draft)?;
        let mut cx = ResolveCx::new(&mut self.sink, self.config.max_depth);
        RedeclarationChecker::new(&self.forest).check(&mut cx, draft, target, prior, role)
    }

    /// Insert `draft` into the current table without checking
    ///
    /// Labels go to the enclosing function table.
    ///
    /// # Errors
    ///
    /// Fails fatally when the current table cannot hold the entity.
    pub fn insert(&mut self, draft: EntityDraft) -> Result<Inserted, Fatal> {
        let target = self.target_for(&draft)?;
        self.forest.add_entity(target, draft)
    }

    /// Insert `draft` into `table` without checking
    ///
    /// # Errors
    ///
    /// Fails fatally when the table cannot hold the entity.
    pub fn insert_into(&mut self, table: TableId, draft: EntityDraft) -> Result<Inserted, Fatal> {
        self.forest.add_entity(table, draft)
    }

    /// Full declaration protocol in the current table: look up prior
    /// declarations, check, then insert or reuse
    ///
    /// # Errors
    ///
    /// Fails fatally on a malformed draft, a sealed class or an exhausted
    /// error budget.
    pub fn declare(&mut self, draft: EntityDraft) -> Result<Declared, Fatal> {
        let target = self.target_for(&draft)?;
        self.declare_in(target, draft)
    }

    /// Full declaration protocol in `table`
    ///
    /// # Errors
    ///
    /// Same as [`declare`](Self::declare).
    pub fn declare_in(&mut self, table: TableId, draft: EntityDraft) -> Result<Declared, Fatal> {
        let prior = self.prior_declarations(table, &draft)?;
        let role = self.forest.role_for_draft(&draft, table)?;
        let outcome = {
            let mut cx = ResolveCx::new(&mut self.sink, self.config.max_depth);
            RedeclarationChecker::new(&self.forest).check(&mut cx, &draft, table, &prior, role)?
        };
        let declared = match outcome {
            RedeclOutcome::Accepted => Declared::New(self.forest.add_entity(table, draft)?),
            RedeclOutcome::Matched(entity) => Declared::Redeclared(entity),
            RedeclOutcome::Conflict(entity) => Declared::Rejected(entity),
        };
        debug!(%role, ?declared, "declared");
        Ok(declared)
    }

    fn prior_declarations(&self, table: TableId, draft: &EntityDraft) -> Result<RoleList, Fatal> {
        match &draft.kind {
            EntityKind::Function(data) if data.flavor == FunctionFlavor::Constructor => {
                self.forest.constructors(table)
            }
            EntityKind::Label => {
                let mut prior = RoleList::new();
                if let Some(label) = self.forest.find_label(table, draft.name)? {
                    prior.push(label, Role::Label);
                }
                Ok(prior)
            }
            _ => self.forest.find_in_scope(table, draft.name),
        }
    }

    fn target_for(&self, draft: &EntityDraft) -> Result<TableId, Fatal> {
        match draft.kind {
            EntityKind::Label => self.stack.nearest_function_table(&self.forest),
            _ => Ok(self.stack.current()),
        }
    }

    /// Make the members of namespace `target` visible from the current scope
    ///
    /// Inside a block the directive attaches to the enclosing function.
    ///
    /// # Errors
    ///
    /// Fails fatally when `target` is not a namespace or class, or the
    /// current table is a sealed class.
    pub fn add_using(&mut self, target: EntityId) -> Result<(), Fatal> {
        let peer = self.forest.region_of(target)?.ok_or_else(|| Fatal::MalformedEntity {
            name: self.forest.qualified_name(target).unwrap_or_default(),
            reason: "using target is not a namespace".to_owned(),
        })?;
        let mut table = self.stack.current();
        if self.forest.table(table)?.kind() == TableKind::Local {
            table = self.stack.nearest_function_table(&self.forest)?;
        }
        self.forest.add_using(table, peer)
    }

    /// Add a direct base to an open class
    ///
    /// # Errors
    ///
    /// Fails fatally when either side is not a class or the class is sealed.
    pub fn add_base(&mut self, class: EntityId, base: BaseSpec) -> Result<(), Fatal> {
        if !self.forest.role_of(base.class)?.is_class() {
            return Err(Fatal::MalformedEntity {
                name: self.forest.qualified_name(base.class)?,
                reason: "base is not a class".to_owned(),
            });
        }
        let table = self.region(class, TableKind::Class)?;
        self.forest.add_base(table, base)
    }

    /// Mark a class complete
    ///
    /// # Errors
    ///
    /// Fails fatally when `class` is not a class.
    pub fn seal_class(&mut self, class: EntityId) -> Result<(), Fatal> {
        let table = self.region(class, TableKind::Class)?;
        self.forest.seal(table)
    }

    /// Label `name` of the enclosing function
    ///
    /// # Errors
    ///
    /// Returns `Fatal::NotInFunction` outside a function body.
    pub fn find_label(&self, name: Symbol) -> Result<Option<EntityId>, Fatal> {
        let table = self.stack.nearest_function_table(&self.forest)?;
        self.forest.find_label(table, name)
    }

    /// Run `f` with an ambiguity checker and a resolution context
    ///
    /// # Errors
    ///
    /// Whatever `f` returns.
    pub fn with_checker<T>(
        &mut self,
        f: impl FnOnce(&AmbiguityChecker<'_>, &mut ResolveCx<'_>) -> Result<T, Fatal>,
    ) -> Result<T, Fatal> {
        let mut cx = ResolveCx::new(&mut self.sink, self.config.max_depth);
        f(&AmbiguityChecker::new(&self.forest), &mut cx)
    }

    /// The single entity of `roles` seen as `role`, reporting ambiguity
    ///
    /// # Errors
    ///
    /// Fails fatally when reporting exhausts the error budget.
    pub fn unique(&mut self, roles: &RoleList, role: Role, name: Symbol, span: FileSpan) -> Result<Option<EntityId>, Fatal> {
        self.with_checker(|checker, cx| checker.unique(cx, roles, role, name, span))
    }

    /// Interpret `roles` as a type name, reporting ambiguity
    ///
    /// # Errors
    ///
    /// Fails fatally when reporting exhausts the error budget.
    pub fn type_name(&mut self, roles: &RoleList, name: Symbol, span: FileSpan) -> Result<Option<RoleEntry>, Fatal> {
        self.with_checker(|checker, cx| checker.type_name(cx, roles, name, span))
    }

    /// Report that `name` resolved to nothing, with spelling suggestions
    /// drawn from the open scopes
    ///
    /// # Errors
    ///
    /// Fails fatally when reporting exhausts the error budget.
    pub fn report_undefined(&mut self, name: Symbol, span: FileSpan) -> Result<(), Fatal> {
        let mut visible = Vec::new();
        for table in self.stack.iter() {
            visible.extend(self.forest.visible_names(table)?);
        }
        let suggestions = ResolveError::compute_suggestions(name, self.forest.interner(), &visible);
        let error = ResolveError::Undefined {
            name: self.forest.name(name).to_owned(),
            span,
            suggestions,
        };
        ResolveCx::new(&mut self.sink, self.config.max_depth).report(error)
    }

    /// Access of `member` when named through an object of class `through`
    ///
    /// `None` when the member's class is not `through` or one of its bases.
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle or when the recursion limit is hit.
    pub fn effective_access(&mut self, member: EntityId, through: EntityId) -> Result<Option<Access>, Fatal> {
        let entity = self.forest.entity(member)?;
        let access = entity.access;
        let owner = self.forest.table(entity.owner)?;
        if owner.kind() != TableKind::Class {
            return Ok(Some(access));
        }
        let Some(class) = owner.as_scope().owner() else {
            return Ok(None);
        };
        let mut cx = ResolveCx::new(&mut self.sink, self.config.max_depth);
        let path = self.forest.base_path(&mut cx, through, class)?;
        Ok(path.map(|path| SymbolForest::effective_access(access, &path)))
    }

    /// End of input: every scope but the global one must be closed
    ///
    /// # Errors
    ///
    /// Returns `Fatal::UnclosedScopes` otherwise.
    pub fn finish(self) -> Result<DiagnosticSink, Fatal> {
        let open = self.stack.depth() - 1;
        if open > 0 {
            return Err(Fatal::UnclosedScopes { open });
        }
        Ok(self.sink)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{FunctionSig, Storage, Type};

    fn function_draft(engine: &Engine, name: &str) -> EntityDraft {
        EntityDraft::function(
            engine.intern(name),
            Type::function(Type::int(), FunctionSig::new(vec![])),
            FileSpan::synthetic(),
        )
    }

    #[test]
    fn test_closing_function_discards_locals() {
        let mut engine = Engine::new(Interner::new());
        let main = engine.declare(function_draft(&engine, "main")).unwrap().entity();
        let body = engine.open_scope(OpenScope::Function(main)).unwrap();
        let x = engine.intern("x");
        let local = engine
            .declare(EntityDraft::object(x, Type::int(), Storage::None, FileSpan::synthetic()))
            .unwrap()
            .entity();
        assert_eq!(engine.resolve(x, None, SearchMode::Symbol).unwrap().roles.entities(), vec![local]);

        engine.close_scope_checked(body).unwrap();
        assert!(!engine.forest().contains_entity(local));
        assert!(engine.resolve(x, None, SearchMode::Symbol).unwrap().is_empty());
        assert!(engine.finish().is_ok());
    }

    #[test]
    fn test_imbalance_and_unclosed_scopes() {
        let mut engine = Engine::new(Interner::new());
        let main = engine.declare(function_draft(&engine, "main")).unwrap().entity();
        let body = engine.open_scope(OpenScope::Function(main)).unwrap();
        let block = engine.open_scope(OpenScope::Block).unwrap();
        assert_eq!(
            engine.close_scope_checked(body),
            Err(Fatal::ScopeImbalance { expected: body, found: block })
        );
        assert_eq!(engine.finish().unwrap_err(), Fatal::UnclosedScopes { open: 2 });
    }

    #[test]
    fn test_block_outside_function_is_fatal() {
        let mut engine = Engine::new(Interner::new());
        assert_eq!(engine.open_scope(OpenScope::Block), Err(Fatal::NotInFunction));
        assert_eq!(engine.close_scope(), Err(Fatal::PopGlobal));
    }

    #[test]
    fn test_labels_live_in_the_function() {
        let mut engine = Engine::new(Interner::new());
        let main = engine.declare(function_draft(&engine, "main")).unwrap().entity();
        engine.open_scope(OpenScope::Function(main)).unwrap();
        engine.open_scope(OpenScope::Block).unwrap();
        let done = engine.intern("done");
        let label = engine
            .declare(EntityDraft::label(done, FileSpan::synthetic()))
            .unwrap();
        assert!(label.is_new());
        engine.close_scope().unwrap();
        assert_eq!(engine.find_label(done).unwrap(), Some(label.entity()));

        let again = engine
            .declare(EntityDraft::label(done, FileSpan::synthetic()))
            .unwrap();
        assert_eq!(again, Declared::Rejected(label.entity()));
        assert_eq!(engine.diagnostics().error_count(), 1);
    }

    #[test]
    fn test_report_undefined_suggests() {
        let mut engine = Engine::new(Interner::new());
        let counter = engine.intern("counter");
        engine
            .declare(EntityDraft::object(counter, Type::int(), Storage::None, FileSpan::synthetic()))
            .unwrap();
        let typo = engine.intern("countr");
        engine.report_undefined(typo, FileSpan::synthetic()).unwrap();
        let diag = &engine.diagnostics().diagnostics()[0];
        assert_eq!(diag.message, "cannot find `countr` in this scope");
        assert_eq!(diag.notes, vec!["did you mean `counter`?"]);
    }
}
