//! Structural type equality between declarations

use crate::entity::{Derived, FunctionSig, Type};

/// Context of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EqMode {
    /// Whole declared types
    Declaration,
    /// Parameter types: top-level qualifiers and throw-specifications are ignored
    Parameter,
}

/// Whether two types denote the same declaration type
///
/// Class, union and enum bases compare by identity of the declared type.
/// Symmetric in its arguments.
pub fn decl_equal(a: &Type, b: &Type, mode: EqMode) -> bool {
    if a.base != b.base || a.derived.len() != b.derived.len() {
        return false;
    }
    let top_level_base = a.derived.is_empty();
    if !(mode == EqMode::Parameter && top_level_base) && a.cv != b.cv {
        return false;
    }
    a.derived
        .iter()
        .zip(&b.derived)
        .enumerate()
        .all(|(position, (x, y))| node_equal(x, y, mode, position == 0))
}

fn node_equal(a: &Derived, b: &Derived, mode: EqMode, outermost: bool) -> bool {
    let ignore_cv = mode == EqMode::Parameter && outermost;
    match (a, b) {
        (Derived::Pointer(x), Derived::Pointer(y)) => ignore_cv || x == y,
        (Derived::Reference, Derived::Reference) => true,
        (Derived::Array(x), Derived::Array(y)) => x == y,
        (
            Derived::MemberPointer { class: xc, cv: xcv },
            Derived::MemberPointer { class: yc, cv: ycv },
        ) => xc == yc && (ignore_cv || xcv == ycv),
        (Derived::Function(x), Derived::Function(y)) => signature_equal(x, y, mode),
        _ => false,
    }
}

fn signature_equal(a: &FunctionSig, b: &FunctionSig, mode: EqMode) -> bool {
    params_match(a, b)
        && a.cv == b.cv
        && a.convention == b.convention
        && (mode == EqMode::Parameter || throws_equal(a.throws.as_deref(), b.throws.as_deref()))
}

/// Whether two signatures take the same parameters
///
/// Same count, same variadic flag, and pairwise equal parameter types.
pub fn params_match(a: &FunctionSig, b: &FunctionSig) -> bool {
    a.params.len() == b.params.len()
        && a.variadic == b.variadic
        && a.params
            .iter()
            .zip(&b.params)
            .all(|(x, y)| decl_equal(x, y, EqMode::Parameter))
}

/// Throw-specifications compare as sets; none at all differs from `throw()`
fn throws_equal(a: Option<&[Type]>, b: Option<&[Type]>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            let covers = |from: &[Type], into: &[Type]| {
                from.iter()
                    .all(|x| into.iter().any(|y| decl_equal(x, y, EqMode::Declaration)))
            };
            covers(a, b) && covers(b, a)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{CallConv, Cv, Sign, Size};

    fn sig(params: Vec<Type>) -> FunctionSig {
        FunctionSig::new(params)
    }

    fn samples() -> Vec<Type> {
        vec![
            Type::int(),
            Type::int().with_cv(Cv::CONST),
            Type::int().with_sign(Sign::Unsigned),
            Type::int().with_size(Size::Long),
            Type::int().pointer(),
            Type::int().with_cv(Cv::CONST).pointer(),
            Type::int().qualified_pointer(Cv::CONST),
            Type::int().reference(),
            Type::int().array(Some(4)),
            Type::int().array(None),
            Type::function(Type::int(), sig(vec![Type::int()])),
            Type::function(Type::int(), sig(vec![Type::int().with_cv(Cv::CONST)])),
            Type::function(Type::void(), sig(vec![])),
        ]
    }

    #[test]
    fn test_equality_is_symmetric() {
        let samples = samples();
        for a in &samples {
            for b in &samples {
                for mode in [EqMode::Declaration, EqMode::Parameter] {
                    assert_eq!(decl_equal(a, b, mode), decl_equal(b, a, mode), "{a:?} vs {b:?}");
                }
            }
        }
    }

    #[test]
    fn test_top_level_cv_ignored_for_parameters() {
        let plain = Type::int();
        let constant = Type::int().with_cv(Cv::CONST);
        assert!(decl_equal(&plain, &constant, EqMode::Parameter));
        assert!(!decl_equal(&plain, &constant, EqMode::Declaration));

        let const_ptr = Type::int().qualified_pointer(Cv::CONST);
        assert!(decl_equal(&Type::int().pointer(), &const_ptr, EqMode::Parameter));

        let to_const = Type::int().with_cv(Cv::CONST).pointer();
        assert!(!decl_equal(&Type::int().pointer(), &to_const, EqMode::Parameter));
    }

    #[test]
    fn test_arrays_compare_by_size() {
        assert!(decl_equal(&Type::int().array(Some(3)), &Type::int().array(Some(3)), EqMode::Declaration));
        assert!(!decl_equal(&Type::int().array(Some(3)), &Type::int().array(None), EqMode::Declaration));
    }

    #[test]
    fn test_throws_only_outside_parameters() {
        let mut throwing = sig(vec![]);
        throwing.throws = Some(vec![Type::int(), Type::void()]);
        let mut reordered = sig(vec![]);
        reordered.throws = Some(vec![Type::void(), Type::int()]);
        let a = Type::function(Type::void(), throwing);
        let b = Type::function(Type::void(), reordered);
        let c = Type::function(Type::void(), sig(vec![]));
        assert!(decl_equal(&a, &b, EqMode::Declaration));
        assert!(!decl_equal(&a, &c, EqMode::Declaration));

        let param_a = Type::function(Type::void(), sig(vec![])).pointer();
        let mut inner = sig(vec![]);
        inner.throws = Some(vec![]);
        let param_b = Type::function(Type::void(), inner).pointer();
        assert!(decl_equal(&param_a, &param_b, EqMode::Parameter));
    }

    #[test]
    fn test_params_match() {
        let a = sig(vec![Type::int(), Type::int().pointer()]);
        let b = sig(vec![Type::int().with_cv(Cv::CONST), Type::int().pointer()]);
        assert!(params_match(&a, &b));

        let mut variadic = b.clone();
        variadic.variadic = true;
        assert!(!params_match(&a, &variadic));
        assert!(!params_match(&a, &sig(vec![Type::int()])));
    }

    #[test]
    fn test_calling_convention_matters() {
        let mut stdcall = sig(vec![]);
        stdcall.convention = CallConv::Stdcall;
        let a = Type::function(Type::int(), stdcall);
        let b = Type::function(Type::int(), sig(vec![]));
        assert!(!decl_equal(&a, &b, EqMode::Declaration));
    }
}
