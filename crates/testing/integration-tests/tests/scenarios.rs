//! End-to-end declaration scenarios
//!
//! Each test drives the engine the way a declaration builder would: declare,
//! open and close scopes, then resolve.

use anyhow::Result;
use integration_tests::TestFixture;
use sb_resolve::ambiguity::{is_ambiguous, is_unique};
use sb_resolve::entity::{BaseKind, FunctionData, FunctionSig, TemplateForm};
use sb_resolve::{Access, BaseSpec, Declared, EntityDraft, EntityKind, OpenScope, Role, Storage, Type};

/// Scenario 1: `int x;` then `float x;` at global scope
#[test]
fn test_object_redeclared_with_other_type() -> Result<()> {
    let mut fx = TestFixture::new();
    let first = fx.object("x", Type::int())?;
    assert!(first.is_new());

    let second = fx.object("x", Type::builtin(BaseKind::Float))?;
    assert_eq!(second, Declared::Rejected(first.entity()));
    assert_eq!(fx.engine.diagnostics().error_count(), 1);
    assert_eq!(
        fx.engine.diagnostics().diagnostics()[0].code,
        Some("resolve::redeclaration")
    );

    let global = fx.engine.forest().global();
    let x = fx.sym("x");
    assert_eq!(fx.engine.forest().find_in_scope(global, x)?.entities(), vec![first.entity()]);
    Ok(())
}

/// Scenario 2: `namespace N { void f(int); }`, resolving `f` inside `N`
#[test]
fn test_function_found_inside_namespace() -> Result<()> {
    let mut fx = TestFixture::new();
    let n = fx.namespace("N")?;
    let f = fx.within(OpenScope::Namespace(n), |fx| fx.function("f", vec![Type::int()]))?;

    let roles = fx.within(OpenScope::Namespace(n), |fx| fx.lookup("f"))?.roles;
    assert_eq!(roles.len(), 1);
    assert_eq!(roles.first().map(|entry| entry.role), Some(Role::Function));
    assert!(is_unique(&roles, Role::Function));
    assert!(!is_ambiguous(&roles, Role::Function));

    let call = FunctionSig::new(vec![Type::int()]);
    let entity = fx.engine.forest().entity(f.entity())?;
    let declared = entity.ty().and_then(Type::signature).map(|sig| sb_resolve::params_match(sig, &call));
    assert_eq!(declared, Some(true));

    assert!(fx.lookup("f")?.is_empty());
    assert_eq!(fx.lookup("N::f")?.roles.entities(), vec![f.entity()]);
    Ok(())
}

/// Scenario 3: `Derived : public Base` inherits `virtual void m()`
#[test]
fn test_inherited_virtual_method() -> Result<()> {
    let mut fx = TestFixture::new();
    let base = fx.class("Base")?;
    let m = fx.within(OpenScope::Class(base), |fx| {
        let span = fx.span("m");
        let mut data = FunctionData::new(Type::function(Type::void(), FunctionSig::new(vec![])));
        data.is_virtual = true;
        let draft = EntityDraft::new(fx.sym("m"), EntityKind::Function(data), span);
        Ok(fx.engine.declare(draft)?.entity())
    })?;
    fx.engine.seal_class(base)?;

    let derived = fx.class("Derived")?;
    fx.engine.add_base(derived, BaseSpec::new(base, Access::Public))?;
    fx.engine.seal_class(derived)?;

    let found = fx.find_symbol(derived, "m")?;
    assert_eq!(found.entities(), vec![m]);
    assert_eq!(fx.names(&found)?, vec!["Base::m"]);
    assert_eq!(found.first().map(|entry| entry.role), Some(Role::Method));
    assert_eq!(fx.engine.effective_access(m, derived)?, Some(Access::Public));
    Ok(())
}

/// Scenario 4: two sibling bases both declare `v`
#[test]
fn test_member_ambiguous_between_sibling_bases() -> Result<()> {
    let mut fx = TestFixture::new();
    let left = fx.class("Left")?;
    fx.within(OpenScope::Class(left), |fx| fx.object("v", Type::int()))?;
    let right = fx.class("Right")?;
    fx.within(OpenScope::Class(right), |fx| fx.object("v", Type::int()))?;

    let derived = fx.class("Derived")?;
    fx.engine.add_base(derived, BaseSpec::new(left, Access::Public))?;
    fx.engine.add_base(derived, BaseSpec::new(right, Access::Public))?;

    let found = fx.find_symbol(derived, "v")?;
    assert_eq!(fx.names(&found)?, vec!["Left::v", "Right::v"]);
    assert!(is_ambiguous(&found, Role::Object));
    assert!(!is_unique(&found, Role::Object));

    let v = fx.sym("v");
    let span = fx.span("v");
    let picked = fx.engine.unique(&found, Role::Object, v, span)?;
    assert_eq!(picked, found.first().map(|entry| entry.entity));
    assert_eq!(fx.engine.diagnostics().error_count(), 1);
    assert_eq!(
        fx.engine.diagnostics().diagnostics()[0].notes,
        vec!["candidate: `Left::v`", "candidate: `Right::v`"]
    );
    Ok(())
}

#[test]
fn test_private_base_restricts_access() -> Result<()> {
    let mut fx = TestFixture::new();
    let base = fx.class("Base")?;
    let m = fx.within(OpenScope::Class(base), |fx| {
        let span = fx.span("m");
        let ty = Type::function(Type::void(), FunctionSig::new(vec![]));
        let draft = EntityDraft::function(fx.sym("m"), ty, span).with_access(Access::Protected);
        Ok(fx.engine.declare(draft)?.entity())
    })?;
    let middle = fx.class("Middle")?;
    fx.engine.add_base(middle, BaseSpec::new(base, Access::Public))?;
    let leaf = fx.class("Leaf")?;
    fx.engine.add_base(leaf, BaseSpec::new(middle, Access::Private))?;

    assert_eq!(fx.engine.effective_access(m, middle)?, Some(Access::Protected));
    assert_eq!(fx.engine.effective_access(m, leaf)?, Some(Access::Private));
    let unrelated = fx.class("Unrelated")?;
    assert_eq!(fx.engine.effective_access(m, unrelated)?, None);
    Ok(())
}

#[test]
fn test_namespace_reopening_reuses_table() -> Result<()> {
    let mut fx = TestFixture::new();
    let first = fx.namespace("N")?;
    fx.within(OpenScope::Namespace(first), |fx| fx.object("a", Type::int()))?;
    let second = fx.namespace("N")?;
    assert_eq!(first, second);
    fx.within(OpenScope::Namespace(second), |fx| fx.object("b", Type::int()))?;

    assert!(!fx.lookup("N::a")?.is_empty());
    assert!(!fx.lookup("N::b")?.is_empty());
    assert!(!fx.engine.diagnostics().has_errors());
    Ok(())
}

#[test]
fn test_using_directive_in_block_reaches_function() -> Result<()> {
    let mut fx = TestFixture::new();
    let lib = fx.namespace("lib")?;
    let helper = fx.within(OpenScope::Namespace(lib), |fx| fx.function("helper", vec![]))?;
    let main = fx.function("main", vec![])?.entity();

    fx.within(OpenScope::Function(main), |fx| {
        fx.within(OpenScope::Block, |fx| {
            fx.engine.add_using(lib)?;
            Ok(())
        })?;
        assert_eq!(fx.lookup("helper")?.roles.entities(), vec![helper.entity()]);
        Ok(())
    })?;
    assert!(fx.lookup("helper")?.is_empty());
    Ok(())
}

#[test]
fn test_namespace_alias_is_followed() -> Result<()> {
    let mut fx = TestFixture::new();
    let long = fx.namespace("very_long_name")?;
    let x = fx.within(OpenScope::Namespace(long), |fx| fx.object("x", Type::int()))?;
    let span = fx.span("vln");
    let alias = EntityDraft::new(fx.sym("vln"), EntityKind::NamespaceAlias { target: long }, span);
    let alias = fx.engine.declare(alias)?.entity();

    let found = fx.lookup("vln::x")?;
    assert_eq!(found.roles.entities(), vec![x.entity()]);
    assert_eq!(found.qualifiers, vec![long]);
    assert_eq!(found.synonyms, vec![alias]);
    Ok(())
}

#[test]
fn test_class_name_qualifier_yields_constructors() -> Result<()> {
    let mut fx = TestFixture::new();
    let point = fx.class("Point")?;
    let ctor = fx.within(OpenScope::Class(point), |fx| {
        let span = fx.span("Point");
        let ty = Type::function(Type::void(), FunctionSig::new(vec![Type::int()]));
        let data = FunctionData::new(ty).with_flavor(sb_resolve::FunctionFlavor::Constructor);
        let draft = EntityDraft::new(fx.sym("Point"), EntityKind::Function(data), span);
        Ok(fx.engine.declare(draft)?.entity())
    })?;

    let found = fx.lookup("Point::Point")?;
    assert_eq!(found.roles.entities(), vec![ctor]);
    assert_eq!(found.roles.first().map(|entry| entry.role), Some(Role::Constructor));
    Ok(())
}

#[test]
fn test_class_name_qualifier_includes_template_constructors() -> Result<()> {
    let mut fx = TestFixture::new();
    let point = fx.class("Point")?;
    let (plain, template) = fx.within(OpenScope::Class(point), |fx| {
        let plain = declare_constructor(fx, "Point", vec![Type::int()], TemplateForm::None)?;
        let template = declare_constructor(fx, "Point", vec![Type::int(), Type::int()], TemplateForm::Template)?;
        Ok((plain, template))
    })?;

    let found = fx.lookup("Point::Point")?;
    assert_eq!(found.roles.entities(), vec![plain, template]);
    let roles: Vec<Role> = found.roles.iter().map(|entry| entry.role).collect();
    assert_eq!(roles, vec![Role::Constructor, Role::TemplateFunction]);
    Ok(())
}

fn declare_constructor(
    fx: &mut TestFixture,
    class: &str,
    params: Vec<Type>,
    template: TemplateForm,
) -> Result<sb_resolve::EntityId> {
    let span = fx.span(class);
    let ty = Type::function(Type::void(), FunctionSig::new(params));
    let mut data = FunctionData::new(ty).with_flavor(sb_resolve::FunctionFlavor::Constructor);
    data.template = template;
    let draft = EntityDraft::new(fx.sym(class), EntityKind::Function(data), span);
    Ok(fx.engine.declare(draft)?.entity())
}

#[test]
fn test_static_member_defined_out_of_class() -> Result<()> {
    let mut fx = TestFixture::new();
    let counter = fx.class("Counter")?;
    let declared = fx.within(OpenScope::Class(counter), |fx| {
        let span = fx.span("count");
        let draft = EntityDraft::object(fx.sym("count"), Type::int(), Storage::Static, span);
        Ok(fx.engine.declare(draft)?.entity())
    })?;
    fx.engine.seal_class(counter)?;

    let depth = fx.engine.push_chain(&[counter])?;
    let span = fx.span("count");
    let definition = EntityDraft::object(fx.sym("count"), Type::int(), Storage::None, span);
    let outcome = fx.engine.declare(definition)?;
    fx.engine.pop_chain(depth)?;

    assert_eq!(outcome, Declared::Redeclared(declared));
    assert!(!fx.engine.diagnostics().has_errors());
    Ok(())
}

#[test]
fn test_sealed_class_rejects_members() -> Result<()> {
    let mut fx = TestFixture::new();
    let class = fx.class("Done")?;
    fx.engine.seal_class(class)?;
    let table = fx.engine.open_scope(OpenScope::Class(class))?;
    let err = fx.object("late", Type::int()).unwrap_err();
    assert!(err.to_string().contains("complete"), "{err}");
    fx.engine.close_scope_checked(table)?;
    Ok(())
}

#[test]
fn test_local_function_overload_rejected() -> Result<()> {
    let mut fx = TestFixture::new();
    let main = fx.function("main", vec![])?.entity();
    fx.within(OpenScope::Function(main), |fx| {
        let first = fx.function("g", vec![Type::int()])?;
        assert!(first.is_new());
        assert_eq!(fx.function("g", vec![Type::int()])?, Declared::Redeclared(first.entity()));
        assert_eq!(fx.function("g", vec![])?, Declared::Rejected(first.entity()));
        Ok(())
    })?;
    assert_eq!(
        fx.engine.diagnostics().diagnostics()[0].code,
        Some("resolve::local_overload")
    );
    Ok(())
}

#[test]
fn test_error_budget_aborts() -> Result<()> {
    let config = sb_resolve::EngineConfig::from_toml_str("[diagnostics]\nmax_errors = 2\n")?;
    let mut fx = TestFixture::with_config(config);
    fx.object("x", Type::int())?;
    fx.object("x", Type::void())?;
    let err = fx.object("x", Type::builtin(BaseKind::Char)).unwrap_err();
    let fatal = err.downcast::<sb_resolve::Fatal>()?;
    assert!(matches!(fatal, sb_resolve::Fatal::ErrorLimit(_)));
    Ok(())
}
