//! Container converters: list, set, tuple, mapping and bare containers

use super::{convert, convert_element, CoerceContext};
use crate::types::{ContainerKind, ScalarKind, TupleShape, TypeExpr};
use crate::value::{dedup, Value, ValueMap};

/// Coerces every element, collecting all failures into one message
fn elements(inner: &TypeExpr, items: Vec<Value>, ctx: &CoerceContext<'_>) -> Result<Vec<Value>, String> {
    if matches!(inner, TypeExpr::Any) {
        return Ok(items);
    }
    let mut out = Vec::with_capacity(items.len());
    let mut failures = Vec::new();
    for (i, item) in items.into_iter().enumerate() {
        match convert_element(inner, item, ctx) {
            Ok(v) => out.push(v),
            Err(e) => failures.push(format!("[{}]: {}", i, e)),
        }
    }
    if failures.is_empty() {
        Ok(out)
    } else {
        Err(failures.join("; "))
    }
}

fn sequence(raw: Value, what: &str) -> Result<Vec<Value>, String> {
    match raw {
        Value::List(items) | Value::Tuple(items) | Value::Set(items) | Value::FrozenSet(items) => Ok(items),
        other => Err(format!("expected a {}, got {}", what, other.type_name())),
    }
}

pub(super) fn list(inner: &TypeExpr, raw: Value, ctx: &CoerceContext<'_>) -> Result<Value, String> {
    match raw {
        Value::List(items) => elements(inner, items, ctx).map(Value::List),
        other => Err(format!("expected a list, got {}", other.type_name())),
    }
}

pub(super) fn set(inner: &TypeExpr, raw: Value, ctx: &CoerceContext<'_>, frozen: bool) -> Result<Value, String> {
    let items = elements(inner, sequence(raw, "set")?, ctx)?;
    let items = dedup(items);
    Ok(if frozen {
        Value::FrozenSet(items)
    } else {
        Value::Set(items)
    })
}

pub(super) fn tuple(shape: &TupleShape, raw: Value, ctx: &CoerceContext<'_>) -> Result<Value, String> {
    let items = match raw {
        Value::List(items) | Value::Tuple(items) => items,
        other => return Err(format!("expected a tuple, got {}", other.type_name())),
    };
    match shape {
        TupleShape::Homogeneous(inner) => elements(inner, items, ctx).map(Value::Tuple),
        TupleShape::Fixed(types) => {
            if types.len() != items.len() {
                return Err(format!(
                    "expected a tuple of {} elements, got {}",
                    types.len(),
                    items.len()
                ));
            }
            let mut out = Vec::with_capacity(items.len());
            let mut failures = Vec::new();
            for (i, (ty, item)) in types.iter().zip(items).enumerate() {
                match convert_element(ty, item, ctx) {
                    Ok(v) => out.push(v),
                    Err(e) => failures.push(format!("[{}]: {}", i, e)),
                }
            }
            if failures.is_empty() {
                Ok(Value::Tuple(out))
            } else {
                Err(failures.join("; "))
            }
        }
    }
}

pub(super) fn mapping(
    key: &TypeExpr,
    value: &TypeExpr,
    raw: Value,
    ctx: &CoerceContext<'_>,
) -> Result<Value, String> {
    let map = match raw {
        Value::Map(map) => map,
        Value::Record(record) => record.to_plain_map(false),
        other => return Err(format!("expected a mapping, got {}", other.type_name())),
    };

    let mut out = ValueMap::with_capacity(map.len());
    let mut failures = Vec::new();

    for (k, v) in map {
        let k = match mapping_key(key, k, ctx) {
            Ok(k) => k,
            Err(e) => {
                failures.push(e);
                continue;
            }
        };
        match convert_element(value, v, ctx) {
            Ok(v) => {
                out.insert(k, v);
            }
            Err(e) => failures.push(format!("[{:?}]: {}", k, e)),
        }
    }

    if failures.is_empty() {
        Ok(Value::Map(out))
    } else {
        Err(failures.join("; "))
    }
}

/// Canonical text of a mapping key; keys stay strings
pub(super) fn mapping_key(key: &TypeExpr, k: String, ctx: &CoerceContext<'_>) -> Result<String, String> {
    if matches!(key.strip_optional(), TypeExpr::Any | TypeExpr::Scalar(ScalarKind::Str)) {
        return Ok(k);
    }
    match convert(key, Value::Str(k.clone()), ctx) {
        Ok(Value::Enum(e)) => Ok(e.member),
        Ok(coerced) => Ok(coerced.to_string()),
        Err(e) => Err(format!("key {:?}: {}", k, e)),
    }
}

pub(super) fn bare(kind: ContainerKind, raw: Value) -> Result<Value, String> {
    match (kind, raw) {
        (ContainerKind::List, v @ Value::List(_)) | (ContainerKind::Dict, v @ Value::Map(_)) => Ok(v),
        (ContainerKind::Tuple, raw) => sequence(raw, "tuple").map(Value::Tuple),
        (ContainerKind::Set, raw) => sequence(raw, "set").map(|items| Value::Set(dedup(items))),
        (ContainerKind::FrozenSet, raw) => sequence(raw, "frozenset").map(|items| Value::FrozenSet(dedup(items))),
        (kind, other) => Err(format!("expected a {}, got {}", kind.as_str(), other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::super::coerce;
    use super::*;
    use crate::types::ScalarKind;

    fn run(ty: &TypeExpr, raw: Value) -> Result<Value, String> {
        coerce(ty, raw, &CoerceContext::new("f")).map_err(|e| e.message)
    }

    #[test]
    fn test_list_elements_coerced() {
        let ty = TypeExpr::list(TypeExpr::int());
        assert_eq!(run(&ty, Value::list([Value::Int(1), Value::from("2"), Value::Int(3)])), Ok(Value::list([1, 2, 3])));
    }

    #[test]
    fn test_list_collects_every_bad_element() {
        let ty = TypeExpr::list(TypeExpr::int());
        let err = run(&ty, Value::list([Value::from("a"), Value::Int(1), Value::from("b")])).unwrap_err();
        assert!(err.contains("[0]"));
        assert!(err.contains("[2]"));
        assert!(!err.contains("[1]"));
    }

    #[test]
    fn test_list_rejects_tuple_input() {
        assert!(run(&TypeExpr::list(TypeExpr::str()), Value::tuple(["a"])).is_err());
    }

    #[test]
    fn test_null_element_needs_optional() {
        assert!(run(&TypeExpr::list(TypeExpr::int()), Value::list([Value::Null])).is_err());
        let ty = TypeExpr::list(TypeExpr::optional(TypeExpr::int()));
        assert_eq!(run(&ty, Value::list([Value::Null])), Ok(Value::list([Value::Null])));
    }

    #[test]
    fn test_set_from_list_dedups() {
        let ty = TypeExpr::set(TypeExpr::int());
        assert_eq!(
            run(&ty, Value::list([Value::Int(1), Value::from("1"), Value::Int(2)])),
            Ok(Value::Set(vec![Value::Int(1), Value::Int(2)]))
        );
        let ty = TypeExpr::frozenset(TypeExpr::str());
        assert_eq!(run(&ty, Value::list(["a", "a"])), Ok(Value::FrozenSet(vec![Value::from("a")])));
    }

    #[test]
    fn test_fixed_tuple_positional() {
        let ty = TypeExpr::tuple(vec![TypeExpr::str(), TypeExpr::int()]);
        assert_eq!(
            run(&ty, Value::tuple(["test", "123"])),
            Ok(Value::tuple([Value::from("test"), Value::Int(123)]))
        );
        let err = run(&ty, Value::tuple(["test"])).unwrap_err();
        assert!(err.contains("2 elements"));
    }

    #[test]
    fn test_homogeneous_tuple() {
        let ty = TypeExpr::tuple_of(TypeExpr::float());
        assert_eq!(
            run(&ty, Value::list([Value::from("3.14"), Value::Int(2)])),
            Ok(Value::tuple([3.14, 2.0]))
        );
    }

    #[test]
    fn test_mapping_keys_and_values() {
        let ty = TypeExpr::mapping(TypeExpr::Scalar(ScalarKind::Int), TypeExpr::list(TypeExpr::int()));
        let raw = Value::map([("01", Value::list([Value::from("4")]))]);
        assert_eq!(run(&ty, raw), Ok(Value::map([("1", Value::list([4]))])));

        let err = run(&ty, Value::map([("x", Value::list([1]))])).unwrap_err();
        assert!(err.contains("key \"x\""));
    }

    #[test]
    fn test_nested_mapping() {
        let inner = TypeExpr::mapping(TypeExpr::str(), TypeExpr::int());
        let ty = TypeExpr::mapping(TypeExpr::str(), inner);
        let raw = Value::map([("a", Value::map([("b", "2")]))]);
        assert_eq!(run(&ty, raw), Ok(Value::map([("a", Value::map([("b", 2)]))])));
    }

    #[test]
    fn test_bare_containers_shape_check_only() {
        let mixed = Value::list([Value::Int(1), Value::from("x")]);
        assert_eq!(run(&TypeExpr::bare(ContainerKind::List), mixed.clone()), Ok(mixed));
        assert!(run(&TypeExpr::bare(ContainerKind::Dict), Value::list([1])).is_err());
        assert!(run(&TypeExpr::bare(ContainerKind::List), Value::Int(1)).is_err());
        assert_eq!(
            run(&TypeExpr::bare(ContainerKind::Tuple), Value::list([1, 2])),
            Ok(Value::tuple([1, 2]))
        );
    }
}
