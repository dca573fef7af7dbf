//! Redeclaration and overload checking
//!
//! Decides whether a new declaration is new, the same declaration as an
//! earlier one, or a conflict. Conflicts are reported here; the caller keeps
//! the earlier entity and drops the new one.

use crate::context::ResolveCx;
use crate::decl_eq::{decl_equal, params_match, EqMode};
use crate::entity::{AliasTarget, EntityDraft, EntityId, EntityKind, Storage, TableId, Type};
use crate::error::{Fatal, ResolveError};
use crate::forest::SymbolForest;
use crate::role::{Role, RoleEntry, RoleList};
use tracing::trace;

/// Verdict on one declaration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeclOutcome {
    /// Nothing prior to match; insert the new entity
    Accepted,
    /// Same declaration as this earlier entity; reuse it
    Matched(EntityId),
    /// Incompatible with this earlier entity; already reported
    Conflict(EntityId),
}

/// Validates a draft against the entities already declared under its name
#[derive(Debug, Clone, Copy)]
pub struct RedeclarationChecker<'a> {
    forest: &'a SymbolForest,
}

impl<'a> RedeclarationChecker<'a> {
    /// Checker over `forest`
    pub fn new(forest: &'a SymbolForest) -> Self {
        Self { forest }
    }

    /// Check `draft`, about to be filed into `target` as `role`, against `prior`
    ///
    /// # Errors
    ///
    /// Fails fatally on a stale handle, a function draft without a
    /// signature, or an exhausted error budget.
    pub fn check(
        &self,
        cx: &mut ResolveCx<'_>,
        draft: &EntityDraft,
        target: TableId,
        prior: &RoleList,
        role: Role,
    ) -> Result<RedeclOutcome, Fatal> {
        if prior.is_empty() {
            return Ok(RedeclOutcome::Accepted);
        }
        if let Some(other) = prior.iter().find(|entry| !compatible(entry.role, role)) {
            return self.conflicting_kind(cx, draft, other, role);
        }

        let same: Vec<EntityId> = prior
            .iter()
            .filter(|entry| entry.role == role)
            .map(|entry| entry.entity)
            .collect();
        let Some(&first) = same.first() else {
            trace!(%role, "coexists with prior declarations");
            return Ok(RedeclOutcome::Accepted);
        };

        match role {
            _ if role.is_function_like() => self.check_function(cx, draft, target, &same, role),
            _ if role.is_type() || role == Role::Namespace => Ok(RedeclOutcome::Matched(first)),
            Role::Object | Role::DataMember => self.check_object(cx, draft, &same, role),
            Role::Typedef | Role::NamespaceAlias => {
                if self.same_alias_target(&draft.kind, first)? {
                    Ok(RedeclOutcome::Matched(first))
                } else {
                    self.conflict(cx, draft, first)
                }
            }
            _ => self.conflict(cx, draft, first),
        }
    }

    fn check_object(
        &self,
        cx: &mut ResolveCx<'_>,
        draft: &EntityDraft,
        same: &[EntityId],
        role: Role,
    ) -> Result<RedeclOutcome, Fatal> {
        let EntityKind::Object(new) = &draft.kind else {
            return self.conflict(cx, draft, same[0]);
        };
        for &prior in same {
            let EntityKind::Object(old) = &self.forest.entity(prior)?.kind else {
                continue;
            };
            if decl_equal(&old.ty, &new.ty, EqMode::Declaration) && storage_compatible(old.storage, new.storage, role) {
                return Ok(RedeclOutcome::Matched(prior));
            }
        }
        self.conflict(cx, draft, same[0])
    }

    fn check_function(
        &self,
        cx: &mut ResolveCx<'_>,
        draft: &EntityDraft,
        target: TableId,
        same: &[EntityId],
        role: Role,
    ) -> Result<RedeclOutcome, Fatal> {
        let new_ty = function_type(&draft.kind);
        let Some(new_sig) = new_ty.and_then(Type::signature) else {
            return Err(Fatal::MalformedEntity {
                name: self.forest.name(draft.name).to_owned(),
                reason: "function type does not start with a signature".to_owned(),
            });
        };
        for &prior in same {
            let Some(old_ty) = function_type(&self.forest.entity(prior)?.kind) else {
                continue;
            };
            let Some(old_sig) = old_ty.signature() else {
                continue;
            };
            if params_match(old_sig, new_sig) && old_sig.cv == new_sig.cv {
                let identical = new_ty.is_some_and(|new_ty| decl_equal(old_ty, new_ty, EqMode::Declaration));
                return if identical {
                    Ok(RedeclOutcome::Matched(prior))
                } else {
                    self.conflict(cx, draft, prior)
                };
            }
        }
        if role.is_free_function() && self.forest.table(target)?.kind().is_function_scope() {
            cx.report(ResolveError::LocalOverload {
                name: self.forest.name(draft.name).to_owned(),
                span: draft.span,
            })?;
            return Ok(RedeclOutcome::Conflict(same[0]));
        }
        trace!(name = self.forest.name(draft.name), "distinct overload");
        Ok(RedeclOutcome::Accepted)
    }

    fn same_alias_target(&self, kind: &EntityKind, prior: EntityId) -> Result<bool, Fatal> {
        let prior = &self.forest.entity(prior)?.kind;
        Ok(match (kind, prior) {
            (EntityKind::NamespaceAlias { target: a }, EntityKind::NamespaceAlias { target: b }) => a == b,
            (EntityKind::UsingAlias(a), EntityKind::UsingAlias(b)) => alias_target_equal(a, b),
            _ => false,
        })
    }

    fn conflicting_kind(
        &self,
        cx: &mut ResolveCx<'_>,
        draft: &EntityDraft,
        prior: RoleEntry,
        role: Role,
    ) -> Result<RedeclOutcome, Fatal> {
        cx.report(ResolveError::ConflictingKind {
            name: self.forest.name(draft.name).to_owned(),
            span: draft.span,
            role,
            prior: self.forest.qualified_name(prior.entity)?,
            prior_role: prior.role,
        })?;
        Ok(RedeclOutcome::Conflict(prior.entity))
    }

    fn conflict(&self, cx: &mut ResolveCx<'_>, draft: &EntityDraft, prior: EntityId) -> Result<RedeclOutcome, Fatal> {
        cx.report(ResolveError::Redeclaration {
            name: self.forest.name(draft.name).to_owned(),
            span: draft.span,
            prior: self.forest.qualified_name(prior)?,
            prior_span: self.forest.entity(prior)?.span,
        })?;
        Ok(RedeclOutcome::Conflict(prior))
    }
}

/// Whether a prior declaration with role `prior` can stand beside a new one
/// with role `new`
///
/// Identical roles go on to matching. A class, union or enum shares its
/// name with objects, functions and enumerators. Function-like roles of
/// different flavors (a template and its specializations) form one
/// overload set.
fn compatible(prior: Role, new: Role) -> bool {
    prior == new
        || (prior.is_type() && is_value(new))
        || (new.is_type() && is_value(prior))
        || (prior.is_function_like() && new.is_function_like())
}

fn is_value(role: Role) -> bool {
    role.is_function_like()
        || matches!(
            role,
            Role::Object
                | Role::DataMember
                | Role::EnumConstant
                | Role::MemberEnumConstant
                | Role::NonTypeTemplateParam
        )
}

/// `extern` then a definition, or a static member defined without `static`
fn storage_compatible(prior: Storage, new: Storage, role: Role) -> bool {
    prior == new
        || (prior == Storage::Extern && new == Storage::None)
        || (role == Role::DataMember && prior == Storage::Static && new == Storage::None)
}

fn function_type(kind: &EntityKind) -> Option<&Type> {
    kind.as_function().map(|data| &data.ty)
}

fn alias_target_equal(a: &AliasTarget, b: &AliasTarget) -> bool {
    match (a, b) {
        (AliasTarget::Entity(a), AliasTarget::Entity(b)) => a == b,
        (AliasTarget::Type(a), AliasTarget::Type(b)) => decl_equal(a, b, EqMode::Declaration),
        (AliasTarget::Entity(entity), AliasTarget::Type(ty))
        | (AliasTarget::Type(ty), AliasTarget::Entity(entity)) => ty.named_entity() == Some(*entity),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ClassKey, Cv, FunctionSig};
    use sb_diagnostics::DiagnosticSink;
    use sb_intern::Interner;
    use sb_span::FileSpan;

    struct Fixture {
        forest: SymbolForest,
        sink: DiagnosticSink,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                forest: SymbolForest::new(Interner::new()),
                sink: DiagnosticSink::new(),
            }
        }

        fn declare(&mut self, table: TableId, draft: EntityDraft) -> RedeclOutcome {
            let prior = self.forest.find_in_scope(table, draft.name).unwrap();
            let role = self.forest.role_for_draft(&draft, table).unwrap();
            let mut cx = ResolveCx::new(&mut self.sink, 16);
            let outcome = RedeclarationChecker::new(&self.forest)
                .check(&mut cx, &draft, table, &prior, role)
                .unwrap();
            if outcome == RedeclOutcome::Accepted {
                self.forest.add_entity(table, draft).unwrap();
            }
            outcome
        }

        fn function(&self, name: &str, params: Vec<Type>) -> EntityDraft {
            let name = self.forest.interner().intern(name);
            EntityDraft::function(name, Type::function(Type::void(), FunctionSig::new(params)), FileSpan::synthetic())
        }

        fn object(&self, name: &str, ty: Type, storage: Storage) -> EntityDraft {
            let name = self.forest.interner().intern(name);
            EntityDraft::object(name, ty, storage, FileSpan::synthetic())
        }
    }

    #[test]
    fn test_object_type_mismatch_conflicts() {
        let mut fx = Fixture::new();
        let global = fx.forest.global();
        let first = fx.object("x", Type::int(), Storage::None);
        assert_eq!(fx.declare(global, first), RedeclOutcome::Accepted);
        let second = fx.object("x", Type::builtin(crate::entity::BaseKind::Float), Storage::None);
        assert!(matches!(fx.declare(global, second), RedeclOutcome::Conflict(_)));
        assert_eq!(fx.sink.error_count(), 1);
        let x = fx.forest.interner().intern("x");
        assert_eq!(fx.forest.find_in_scope(global, x).unwrap().len(), 1);
    }

    #[test]
    fn test_extern_then_definition_matches() {
        let mut fx = Fixture::new();
        let global = fx.forest.global();
        let declaration = fx.object("x", Type::int(), Storage::Extern);
        fx.declare(global, declaration);
        let definition = fx.object("x", Type::int(), Storage::None);
        assert!(matches!(fx.declare(global, definition), RedeclOutcome::Matched(_)));
        let again = fx.object("x", Type::int(), Storage::Static);
        assert!(matches!(fx.declare(global, again), RedeclOutcome::Conflict(_)));
    }

    #[test]
    fn test_overloads_and_redeclarations() {
        let mut fx = Fixture::new();
        let global = fx.forest.global();
        let f_int = fx.function("f", vec![Type::int()]);
        let f_ptr = fx.function("f", vec![Type::int().pointer()]);
        let f_const_int = fx.function("f", vec![Type::int().with_cv(Cv::CONST)]);
        assert_eq!(fx.declare(global, f_int), RedeclOutcome::Accepted);
        assert_eq!(fx.declare(global, f_ptr), RedeclOutcome::Accepted);
        assert!(matches!(fx.declare(global, f_const_int), RedeclOutcome::Matched(_)));

        let name = fx.forest.interner().intern("f");
        let returns_int = EntityDraft::function(
            name,
            Type::function(Type::int(), FunctionSig::new(vec![Type::int()])),
            FileSpan::synthetic(),
        );
        assert!(matches!(fx.declare(global, returns_int), RedeclOutcome::Conflict(_)));
        assert!(!fx.sink.diagnostics().is_empty());
    }

    #[test]
    fn test_class_coexists_with_function() {
        let mut fx = Fixture::new();
        let global = fx.forest.global();
        let name = fx.forest.interner().intern("stat");
        let class = EntityDraft::class(name, ClassKey::Struct, FileSpan::synthetic());
        assert_eq!(fx.declare(global, class), RedeclOutcome::Accepted);
        let function = fx.function("stat", vec![]);
        assert_eq!(fx.declare(global, function), RedeclOutcome::Accepted);
        let typedef = EntityDraft::alias(name, AliasTarget::Type(Type::int()), FileSpan::synthetic());
        assert!(matches!(fx.declare(global, typedef), RedeclOutcome::Conflict(_)));
        assert_eq!(
            fx.sink.diagnostics()[0].code,
            Some("resolve::conflicting_kind")
        );
    }

    #[test]
    fn test_object_then_function_conflicts() {
        let mut fx = Fixture::new();
        let global = fx.forest.global();
        let object = fx.object("g", Type::int(), Storage::None);
        fx.declare(global, object);
        let function = fx.function("g", vec![]);
        assert!(matches!(fx.declare(global, function), RedeclOutcome::Conflict(_)));
    }

    #[test]
    fn test_storage_rules() {
        assert!(storage_compatible(Storage::Extern, Storage::None, Role::Object));
        assert!(!storage_compatible(Storage::None, Storage::Extern, Role::Object));
        assert!(storage_compatible(Storage::Static, Storage::None, Role::DataMember));
        assert!(!storage_compatible(Storage::Static, Storage::None, Role::Object));
    }
}
