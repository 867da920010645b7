//! Coercion Property Tests
//!
//! Re-coercing an already coerced value returns it unchanged, for scalar
//! and container kinds alike.

use chrono::{Duration, NaiveDate};
use datamodel::coerce::{coerce, CoerceContext};
use datamodel::types::{ContainerKind, TypeExpr};
use datamodel::Value;
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

fn ctx() -> CoerceContext<'static> {
    CoerceContext::new("field")
}

/// coerce(T, coerce(T, v)) == coerce(T, v), whenever the first coercion succeeds
fn assert_idempotent(ty: &TypeExpr, raw: Value) {
    if let Ok(once) = coerce(ty, raw, &ctx()) {
        let twice = coerce(ty, once.clone(), &ctx()).unwrap();
        assert_eq!(twice, once, "re-coercing {} changed it", ty);
    }
}

fn scalar_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e9f64..1.0e9).prop_map(Value::Float),
        "[a-m0-9 ]{0,12}".prop_map(Value::from),
        (-1000i64..1000).prop_map(|i| Value::from(i.to_string())),
        prop_oneof![Just("yes"), Just("NO"), Just("true"), Just("0")].prop_map(Value::from),
    ]
}

fn scalar_types() -> Vec<TypeExpr> {
    vec![
        TypeExpr::int(),
        TypeExpr::float(),
        TypeExpr::str(),
        TypeExpr::bool(),
        TypeExpr::optional(TypeExpr::int()),
        TypeExpr::union(vec![TypeExpr::int(), TypeExpr::str()]),
    ]
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn test_scalar_recoercion_is_idempotent(raw in scalar_value()) {
        for ty in scalar_types() {
            assert_idempotent(&ty, raw.clone());
        }
    }

    #[test]
    fn test_container_recoercion_is_idempotent(items in proptest::collection::vec(scalar_value(), 0..6)) {
        let containers = [
            TypeExpr::list(TypeExpr::int()),
            TypeExpr::set(TypeExpr::str()),
            TypeExpr::frozenset(TypeExpr::float()),
            TypeExpr::tuple_of(TypeExpr::bool()),
            TypeExpr::bare(ContainerKind::List),
        ];
        for ty in &containers {
            assert_idempotent(ty, Value::List(items.clone()));
        }
    }

    #[test]
    fn test_mapping_recoercion_is_idempotent(entries in proptest::collection::vec(("[a-z]{1,4}", any::<i32>()), 0..6)) {
        let ty = TypeExpr::mapping(TypeExpr::str(), TypeExpr::float());
        let raw = Value::map(entries);
        assert_idempotent(&ty, raw);
    }

    #[test]
    fn test_date_recoercion_is_idempotent(days in 0i64..40_000) {
        let date = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + Duration::days(days);
        let ty = TypeExpr::Scalar(datamodel::types::ScalarKind::Date);
        assert_idempotent(&ty, Value::from(date.format("%d-%m-%Y").to_string()));
        assert_idempotent(&ty, Value::from(date));
    }
}

// =============================================================================
// Fixed Cases
// =============================================================================

/// Fixed-arity tuples coerce position by position and check arity.
#[test]
fn test_fixed_tuple_positions() {
    let ty = TypeExpr::tuple(vec![TypeExpr::int(), TypeExpr::str()]);
    let out = coerce(&ty, Value::list([Value::from("1"), Value::Int(2)]), &ctx()).unwrap();
    assert_eq!(out, Value::tuple([Value::Int(1), Value::from("2")]));

    let err = coerce(&ty, Value::list([1, 2, 3]), &ctx()).unwrap_err();
    assert_eq!(err.field, "field");
    assert_eq!(err.expected, "Tuple[int, str]");
}

/// Convertible elements are tolerated; one bad element fails the container.
#[test]
fn test_list_elements() {
    let ty = TypeExpr::list(TypeExpr::int());
    let out = coerce(&ty, Value::list([Value::from("4"), Value::Int(5)]), &ctx()).unwrap();
    assert_eq!(out, Value::list([4, 5]));

    let err = coerce(&ty, Value::list([Value::from("4"), Value::from("x")]), &ctx()).unwrap_err();
    assert!(err.message.contains("[1]"));
}
