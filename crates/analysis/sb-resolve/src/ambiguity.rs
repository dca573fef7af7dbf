//! Narrowing a role list down to one entity

use crate::context::ResolveCx;
use crate::entity::{AliasTarget, EntityId, EntityKind};
use crate::error::{Fatal, ResolveError};
use crate::forest::SymbolForest;
use crate::role::{Role, RoleEntry, RoleList};
use sb_intern::Symbol;
use sb_span::FileSpan;
use tracing::warn;

/// Whether `roles` denotes exactly one entity, seen as `role`
pub fn is_unique(roles: &RoleList, role: Role) -> bool {
    let mut entries = roles.iter();
    let Some(first) = entries.next() else {
        return false;
    };
    first.role.is_a(role) && entries.all(|entry| entry.role.is_a(role) && entry.entity == first.entity)
}

/// Whether several distinct entities answer a query for `role`
pub fn is_ambiguous(roles: &RoleList, role: Role) -> bool {
    let mut matching = roles.with_role(role);
    match matching.next() {
        Some(first) => matching.any(|entry| entry.entity != first.entity),
        None => false,
    }
}

/// How classes and enums share their name with other entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverloadMode {
    /// Every hit must be of the queried kind
    #[default]
    Exclusive,
    /// Functions and constants of the same spelling are ignored
    WithOverload,
}

/// Answers "does this role list denote a T?" and reports ambiguities
///
/// On ambiguity the first candidate is returned so the caller can carry on.
#[derive(Debug, Clone, Copy)]
pub struct AmbiguityChecker<'a> {
    forest: &'a SymbolForest,
}

impl<'a> AmbiguityChecker<'a> {
    /// Checker over `forest`
    pub fn new(forest: &'a SymbolForest) -> Self {
        Self { forest }
    }

    /// The single entity of role `role`
    ///
    /// # Errors
    ///
    /// Fails fatally when reporting the ambiguity exhausts the error budget.
    pub fn unique(
        &self,
        cx: &mut ResolveCx<'_>,
        roles: &RoleList,
        role: Role,
        name: Symbol,
        span: FileSpan,
    ) -> Result<Option<EntityId>, Fatal> {
        let candidates: Vec<RoleEntry> = roles.with_role(role).collect();
        self.pick(cx, &candidates, name, span)
    }

    /// Interpret `roles` as a type name
    ///
    /// Tried in order: template type parameter, typedef, class, enum. The
    /// first interpretation with any hit wins.
    ///
    /// # Errors
    ///
    /// Fails fatally when reporting an ambiguity exhausts the error budget.
    pub fn type_name(
        &self,
        cx: &mut ResolveCx<'_>,
        roles: &RoleList,
        name: Symbol,
        span: FileSpan,
    ) -> Result<Option<RoleEntry>, Fatal> {
        let groups: [&dyn Fn(Role) -> bool; 4] = [
            &|role: Role| role == Role::TypeTemplateParam,
            &|role: Role| role == Role::Typedef,
            &Role::is_class,
            &|role: Role| role == Role::Enum,
        ];
        for accepts in groups {
            let candidates: Vec<RoleEntry> = roles.iter().filter(|entry| accepts(entry.role)).collect();
            if let Some(entity) = self.pick(cx, &candidates, name, span)? {
                return Ok(candidates.into_iter().find(|entry| entry.entity == entity));
            }
        }
        Ok(None)
    }

    /// The single namespace `roles` denotes
    ///
    /// # Errors
    ///
    /// Fails fatally when reporting an ambiguity exhausts the error budget.
    pub fn namespace(
        &self,
        cx: &mut ResolveCx<'_>,
        roles: &RoleList,
        name: Symbol,
        span: FileSpan,
    ) -> Result<Option<EntityId>, Fatal> {
        self.unique(cx, roles, Role::Namespace, name, span)
    }

    /// The single class template `roles` denotes
    ///
    /// # Errors
    ///
    /// Fails fatally when reporting an ambiguity exhausts the error budget.
    pub fn template_class(
        &self,
        cx: &mut ResolveCx<'_>,
        roles: &RoleList,
        name: Symbol,
        span: FileSpan,
    ) -> Result<Option<EntityId>, Fatal> {
        self.unique(cx, roles, Role::TemplateClass, name, span)
    }

    /// The single class, union or class template `roles` denotes
    ///
    /// # Errors
    ///
    /// Fails fatally when reporting an ambiguity exhausts the error budget.
    pub fn class(
        &self,
        cx: &mut ResolveCx<'_>,
        roles: &RoleList,
        mode: OverloadMode,
        name: Symbol,
        span: FileSpan,
    ) -> Result<Option<EntityId>, Fatal> {
        self.of_kind(cx, roles, mode, Role::is_class, name, span)
    }

    /// The single enumeration `roles` denotes
    ///
    /// # Errors
    ///
    /// Fails fatally when reporting an ambiguity exhausts the error budget.
    pub fn enumeration(
        &self,
        cx: &mut ResolveCx<'_>,
        roles: &RoleList,
        mode: OverloadMode,
        name: Symbol,
        span: FileSpan,
    ) -> Result<Option<EntityId>, Fatal> {
        self.of_kind(cx, roles, mode, |role| role == Role::Enum, name, span)
    }

    fn of_kind(
        &self,
        cx: &mut ResolveCx<'_>,
        roles: &RoleList,
        mode: OverloadMode,
        accepts: impl Fn(Role) -> bool,
        name: Symbol,
        span: FileSpan,
    ) -> Result<Option<EntityId>, Fatal> {
        if mode == OverloadMode::Exclusive && roles.iter().any(|entry| !accepts(entry.role)) {
            return Ok(None);
        }
        let candidates: Vec<RoleEntry> = roles.iter().filter(|entry| accepts(entry.role)).collect();
        self.pick(cx, &candidates, name, span)
    }

    /// The class or namespace `roles` designates as a qualifier
    ///
    /// Typedefs naming a class count as that class.
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle or when reporting an ambiguity
    /// exhausts the error budget.
    pub fn scope(
        &self,
        cx: &mut ResolveCx<'_>,
        roles: &RoleList,
        name: Symbol,
        span: FileSpan,
    ) -> Result<Option<EntityId>, Fatal> {
        let mut candidates = RoleList::new();
        for entry in roles.iter() {
            if entry.role.is_class() || entry.role == Role::Namespace {
                candidates.push(entry.entity, entry.role);
            } else if entry.role == Role::Typedef {
                if let Some(class) = self.typedef_class(entry.entity)? {
                    candidates.push(class, self.forest.role_of(class)?);
                }
            }
        }
        let candidates: Vec<RoleEntry> = candidates.into_iter().collect();
        self.pick(cx, &candidates, name, span)
    }

    fn typedef_class(&self, typedef: EntityId) -> Result<Option<EntityId>, Fatal> {
        let target = match &self.forest.entity(typedef)?.kind {
            EntityKind::UsingAlias(AliasTarget::Entity(target)) => Some(*target),
            EntityKind::UsingAlias(AliasTarget::Type(ty)) => ty.named_entity(),
            _ => None,
        };
        let Some(target) = target else {
            return Ok(None);
        };
        Ok(self.forest.role_of(target)?.is_class().then_some(target))
    }

    fn pick(
        &self,
        cx: &mut ResolveCx<'_>,
        candidates: &[RoleEntry],
        name: Symbol,
        span: FileSpan,
    ) -> Result<Option<EntityId>, Fatal> {
        let Some(first) = candidates.first() else {
            return Ok(None);
        };
        if candidates.iter().all(|entry| entry.entity == first.entity) {
            return Ok(Some(first.entity));
        }

        let mut names = Vec::with_capacity(candidates.len());
        for entry in candidates {
            let qualified = self.forest.qualified_name(entry.entity)?;
            if !names.contains(&qualified) {
                names.push(qualified);
            }
        }
        let text = self.forest.name(name).to_owned();
        warn!(name = %text, candidates = candidates.len(), "ambiguous name, continuing with the first candidate");
        cx.report(ResolveError::Ambiguous {
            name: text,
            span,
            candidates: names,
        })?;
        Ok(Some(first.entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ClassKey, EntityDraft, Storage, Type};
    use sb_diagnostics::DiagnosticSink;
    use sb_intern::Interner;

    fn two_classes() -> (SymbolForest, EntityId, EntityId) {
        let mut forest = SymbolForest::new(Interner::new());
        let global = forest.global();
        let a = forest.interner().intern("A");
        let b = forest.interner().intern("B");
        let a = forest
            .add_entity(global, EntityDraft::class(a, ClassKey::Class, FileSpan::synthetic()))
            .unwrap()
            .entity;
        let b = forest
            .add_entity(global, EntityDraft::class(b, ClassKey::Class, FileSpan::synthetic()))
            .unwrap()
            .entity;
        (forest, a, b)
    }

    #[test]
    fn test_same_entity_twice_is_unique() {
        let (_forest, a, b) = two_classes();
        let roles: RoleList = [
            RoleEntry { entity: a, role: Role::Class },
            RoleEntry { entity: a, role: Role::Class },
        ]
        .into_iter()
        .collect();
        assert!(is_unique(&roles, Role::Class));
        assert!(!is_ambiguous(&roles, Role::Class));

        let mut both = roles.clone();
        both.push(b, Role::Class);
        assert!(!is_unique(&both, Role::Class));
        assert!(is_ambiguous(&both, Role::Class));
        assert!(!is_unique(&RoleList::new(), Role::Class));
    }

    #[test]
    fn test_ambiguity_reports_and_picks_first() {
        let (forest, a, b) = two_classes();
        let mut roles = RoleList::new();
        roles.push(a, Role::Class);
        roles.push(b, Role::Class);

        let mut sink = DiagnosticSink::new();
        let mut cx = ResolveCx::new(&mut sink, 8);
        let checker = AmbiguityChecker::new(&forest);
        let name = forest.interner().intern("T");
        let picked = checker
            .class(&mut cx, &roles, OverloadMode::Exclusive, name, FileSpan::synthetic())
            .unwrap();
        assert_eq!(picked, Some(a));
        assert_eq!(sink.error_count(), 1);
        assert_eq!(sink.diagnostics()[0].notes, vec!["candidate: `A`", "candidate: `B`"]);
    }

    #[test]
    fn test_class_with_overload_ignores_functions() {
        let (mut forest, a, _) = two_classes();
        let global = forest.global();
        let name = forest.interner().intern("A");
        let object = forest
            .add_entity(global, EntityDraft::object(name, Type::int(), Storage::None, FileSpan::synthetic()))
            .unwrap()
            .entity;
        let mut roles = RoleList::new();
        roles.push(a, Role::Class);
        roles.push(object, Role::Object);

        let mut sink = DiagnosticSink::new();
        let mut cx = ResolveCx::new(&mut sink, 8);
        let checker = AmbiguityChecker::new(&forest);
        let exclusive = checker
            .class(&mut cx, &roles, OverloadMode::Exclusive, name, FileSpan::synthetic())
            .unwrap();
        let overloaded = checker
            .class(&mut cx, &roles, OverloadMode::WithOverload, name, FileSpan::synthetic())
            .unwrap();
        assert_eq!(exclusive, None);
        assert_eq!(overloaded, Some(a));
        assert!(!sink.has_errors());
    }

    #[test]
    fn test_type_name_prefers_typedef_over_class() {
        let (mut forest, a, _) = two_classes();
        let global = forest.global();
        let t = forest.interner().intern("T");
        let typedef = forest
            .add_entity(global, EntityDraft::alias(t, AliasTarget::Type(Type::int()), FileSpan::synthetic()))
            .unwrap()
            .entity;
        let mut roles = RoleList::new();
        roles.push(a, Role::Class);
        roles.push(typedef, Role::Typedef);

        let mut sink = DiagnosticSink::new();
        let mut cx = ResolveCx::new(&mut sink, 8);
        let checker = AmbiguityChecker::new(&forest);
        let found = checker.type_name(&mut cx, &roles, t, FileSpan::synthetic()).unwrap();
        assert_eq!(found, Some(RoleEntry { entity: typedef, role: Role::Typedef }));
    }

    #[test]
    fn test_typedef_of_class_is_a_scope() {
        let (mut forest, a, _) = two_classes();
        let global = forest.global();
        let t = forest.interner().intern("T");
        let typedef = forest
            .add_entity(global, EntityDraft::alias(t, AliasTarget::Type(Type::named(a)), FileSpan::synthetic()))
            .unwrap()
            .entity;
        let mut roles = RoleList::new();
        roles.push(typedef, Role::Typedef);

        let mut sink = DiagnosticSink::new();
        let mut cx = ResolveCx::new(&mut sink, 8);
        let checker = AmbiguityChecker::new(&forest);
        assert_eq!(checker.scope(&mut cx, &roles, t, FileSpan::synthetic()).unwrap(), Some(a));
    }
}
