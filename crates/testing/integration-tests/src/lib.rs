//! Integration test utilities for the Sable resolution engine

use anyhow::{Context, Result};
use sb_intern::{Interner, Symbol};
use sb_resolve::entity::{ClassKey, FunctionSig};
use sb_resolve::{
    Declared, Engine, EngineConfig, EntityDraft, EntityId, OpenScope, QualifiedLookup, QualifiedName, RoleList,
    SearchMode, Storage, TableId, Type,
};
use sb_span::{FileId, FileSpan};

/// Test fixture helper
///
/// Every declaration gets a distinct span in one synthetic file, so rendered
/// diagnostics are stable across runs.
pub struct TestFixture {
    /// Engine under test
    pub engine: Engine,
    file: FileId,
    cursor: u32,
}

impl TestFixture {
    /// Creates a new test fixture
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates a fixture with an explicit engine configuration
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            engine: Engine::with_config(Interner::new(), config),
            file: FileId(1),
            cursor: 0,
        }
    }

    /// Interns `text`
    pub fn sym(&self, text: &str) -> Symbol {
        self.engine.intern(text)
    }

    /// Next span covering `text`
    pub fn span(&mut self, text: &str) -> FileSpan {
        let start = self.cursor;
        let end = start + text.len() as u32;
        self.cursor = end + 1;
        FileSpan::new(self.file, start, end)
    }

    /// Declares (or re-opens) namespace `name` in the current scope
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails fatally
    pub fn namespace(&mut self, name: &str) -> Result<EntityId> {
        let span = self.span(name);
        let draft = EntityDraft::namespace(self.sym(name), span);
        Ok(self.engine.declare(draft)?.entity())
    }

    /// Declares class `name` in the current scope
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails fatally
    pub fn class(&mut self, name: &str) -> Result<EntityId> {
        let span = self.span(name);
        let draft = EntityDraft::class(self.sym(name), ClassKey::Class, span);
        Ok(self.engine.declare(draft)?.entity())
    }

    /// Declares object `name` of type `ty` in the current scope
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails fatally
    pub fn object(&mut self, name: &str, ty: Type) -> Result<Declared> {
        let span = self.span(name);
        let draft = EntityDraft::object(self.sym(name), ty, Storage::None, span);
        Ok(self.engine.declare(draft)?)
    }

    /// Declares `void name(params...)` in the current scope
    ///
    /// # Errors
    ///
    /// Returns an error if the engine fails fatally
    pub fn function(&mut self, name: &str, params: Vec<Type>) -> Result<Declared> {
        let span = self.span(name);
        let ty = Type::function(Type::void(), FunctionSig::new(params));
        let draft = EntityDraft::function(self.sym(name), ty, span);
        Ok(self.engine.declare(draft)?)
    }

    /// Runs `body` inside the scope opened by `scope`
    ///
    /// # Errors
    ///
    /// Returns an error if opening, `body` or closing fails
    pub fn within<T>(&mut self, scope: OpenScope, body: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let table = self.engine.open_scope(scope)?;
        let value = body(self)?;
        self.engine.close_scope_checked(table)?;
        Ok(value)
    }

    /// Body table of a class or namespace
    ///
    /// # Errors
    ///
    /// Returns an error if `entity` does not open a region
    pub fn body(&self, entity: EntityId) -> Result<TableId> {
        self.engine
            .forest()
            .region_of(entity)?
            .context("entity has no body")
    }

    /// Resolves a possibly qualified name written as text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a qualified name or lookup fails fatally
    pub fn lookup(&mut self, text: &str) -> Result<QualifiedLookup> {
        let at = self.span(text);
        let name = QualifiedName::parse(self.engine.forest().interner(), text, at)
            .with_context(|| format!("not a qualified name: {text}"))?;
        Ok(self.engine.resolve_qualified(&name, None)?)
    }

    /// `find_symbol` inside the body of `class`
    ///
    /// # Errors
    ///
    /// Returns an error if lookup fails fatally
    pub fn find_symbol(&mut self, class: EntityId, name: &str) -> Result<RoleList> {
        let table = self.body(class)?;
        let name = self.sym(name);
        Ok(self.engine.resolve(name, Some(table), SearchMode::Symbol)?.roles)
    }

    /// Qualified display names of every entity in `roles`
    ///
    /// # Errors
    ///
    /// Returns an error on a stale handle
    pub fn names(&self, roles: &RoleList) -> Result<Vec<String>> {
        roles
            .iter()
            .map(|entry| Ok(self.engine.forest().qualified_name(entry.entity)?))
            .collect()
    }

    /// Table dump of the body of `entity`
    ///
    /// # Errors
    ///
    /// Returns an error if `entity` has no body
    pub fn dump(&self, entity: EntityId) -> Result<String> {
        Ok(self.engine.forest().dump(self.body(entity)?)?)
    }

    /// Every diagnostic reported so far, one per line
    pub fn rendered_diagnostics(&self) -> String {
        self.engine
            .diagnostics()
            .diagnostics()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
