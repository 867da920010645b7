//! Ordering and loose equality across value kinds

use std::cmp::Ordering;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use super::Value;

/// Compares two values when they are mutually orderable.
///
/// Numbers compare across int, float and decimal. Temporal values compare
/// within their own kind. Returns `None` for unrelated kinds.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Decimal(x), Value::Decimal(y)) => Some(x.cmp(y)),
        (Value::Decimal(x), other) | (other, Value::Decimal(x)) if other.is_numeric() => {
            let swapped = matches!(b, Value::Decimal(_)) && !matches!(a, Value::Decimal(_));
            let ord = compare_decimal(*x, other)?;
            Some(if swapped { ord.reverse() } else { ord })
        }
        (x, y) if x.is_numeric() && y.is_numeric() => {
            let (x, y) = (x.as_float()?, y.as_float()?);
            x.partial_cmp(&y)
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Bytes(x), Value::Bytes(y)) => Some(x.cmp(y)),
        (Value::Uuid(x), Value::Uuid(y)) => Some(x.cmp(y)),
        (Value::Date(x), Value::Date(y)) => Some(x.cmp(y)),
        (Value::DateTime(x), Value::DateTime(y)) => Some(x.cmp(y)),
        (Value::Time(x), Value::Time(y)) => Some(x.cmp(y)),
        (Value::TimeDelta(x), Value::TimeDelta(y)) => Some(x.cmp(y)),
        (Value::Enum(x), Value::Enum(y)) if x.enum_name == y.enum_name => compare(&x.value, &y.value),
        _ => None,
    }
}

fn compare_decimal(x: Decimal, other: &Value) -> Option<Ordering> {
    match other {
        Value::Int(i) => Some(x.cmp(&Decimal::from(*i))),
        Value::Float(f) => match Decimal::from_f64(*f) {
            Some(d) => Some(x.cmp(&d)),
            None => x.to_f64()?.partial_cmp(f),
        },
        _ => None,
    }
}

/// Equality that treats numerically equal numbers as equal.
///
/// `1`, `1.0` and `Decimal(1)` are loosely equal; everything else falls
/// back to structural equality.
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    if a.is_numeric() && b.is_numeric() {
        return compare(a, b) == Some(Ordering::Equal);
    }
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_numeric_cross_kind() {
        assert_eq!(compare(&Value::Int(1), &Value::Float(1.5)), Some(Ordering::Less));
        assert_eq!(
            compare(&Value::Decimal(Decimal::new(25, 1)), &Value::Int(2)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare(&Value::Int(2), &Value::Decimal(Decimal::new(25, 1))),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_unrelated_kinds_do_not_order() {
        assert_eq!(compare(&Value::Int(1), &Value::from("1")), None);
        assert_eq!(compare(&Value::Null, &Value::Null), None);
    }

    #[test]
    fn test_dates_order() {
        let a = Value::Date(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());
        let b = Value::Date(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
        assert_eq!(compare(&a, &b), Some(Ordering::Less));
    }

    #[test]
    fn test_loose_eq() {
        assert!(loose_eq(&Value::Int(1), &Value::Float(1.0)));
        assert!(!loose_eq(&Value::Int(1), &Value::from("1")));
        assert!(loose_eq(&Value::from("a"), &Value::from("a")));
    }
}
