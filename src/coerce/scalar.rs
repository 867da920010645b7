//! Scalar converters: str, int, float, decimal, bool, bytes, uuid

use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::value::Value;

const TRUTHY: [&str; 6] = ["y", "yes", "t", "true", "on", "1"];
const FALSY: [&str; 6] = ["n", "no", "f", "false", "off", "0"];

/// Converts a value to a boolean.
///
/// Strings must belong to the canonical truthy or falsy set (case
/// insensitive); anything else is an error rather than `false`.
pub fn to_boolean(value: &Value) -> Result<bool, String> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Int(i) => Ok(*i != 0),
        Value::Float(f) => Ok(*f != 0.0),
        Value::Decimal(d) => Ok(!d.is_zero()),
        Value::Str(s) => {
            let lowered = s.trim().to_lowercase();
            if TRUTHY.contains(&lowered.as_str()) {
                Ok(true)
            } else if FALSY.contains(&lowered.as_str()) {
                Ok(false)
            } else {
                Err(format!("invalid truth value {:?}", s))
            }
        }
        Value::Bytes(b) => to_boolean(&Value::Str(String::from_utf8_lossy(b).into_owned())),
        other => Err(format!("cannot interpret {} as a boolean", other.type_name())),
    }
}

pub(super) fn to_str(value: Value) -> Result<Value, String> {
    match value {
        Value::Str(_) => Ok(value),
        Value::Bytes(bytes) => String::from_utf8(bytes)
            .map(Value::Str)
            .map_err(|e| format!("bytes are not valid UTF-8: {}", e)),
        Value::Enum(e) => to_str(*e.value),
        Value::Bool(_)
        | Value::Int(_)
        | Value::Float(_)
        | Value::Decimal(_)
        | Value::Uuid(_)
        | Value::Date(_)
        | Value::DateTime(_)
        | Value::Time(_)
        | Value::TimeDelta(_) => Ok(Value::Str(value.to_string())),
        other => Err(format!("expected a string, got {}", other.type_name())),
    }
}

pub(super) fn to_integer(value: Value) -> Result<Value, String> {
    match value {
        Value::Int(_) => Ok(value),
        Value::Bool(b) => Ok(Value::Int(i64::from(b))),
        Value::Float(f) => {
            if f.is_finite() && f.trunc().abs() < i64::MAX as f64 {
                Ok(Value::Int(f.trunc() as i64))
            } else {
                Err(format!("cannot convert float {} to integer", f))
            }
        }
        Value::Decimal(d) => d
            .trunc()
            .to_i64()
            .map(Value::Int)
            .ok_or_else(|| format!("decimal {} is out of integer range", d)),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| format!("invalid literal for int: {:?}", s)),
        Value::Enum(e) => to_integer(*e.value),
        other => Err(format!("expected an integer, got {}", other.type_name())),
    }
}

pub(super) fn to_float(value: Value) -> Result<Value, String> {
    match value {
        Value::Float(_) => Ok(value),
        Value::Int(i) => Ok(Value::Float(i as f64)),
        Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        Value::Decimal(d) => d
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| format!("decimal {} cannot be represented as float", d)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| format!("could not convert string to float: {:?}", s)),
        Value::Enum(e) => to_float(*e.value),
        other => Err(format!("expected a number, got {}", other.type_name())),
    }
}

pub(super) fn to_decimal(value: Value) -> Result<Value, String> {
    match value {
        Value::Decimal(_) => Ok(value),
        Value::Int(i) => Ok(Value::Decimal(Decimal::from(i))),
        Value::Float(f) => Decimal::from_f64(f)
            .map(Value::Decimal)
            .ok_or_else(|| format!("float {} cannot be represented as decimal", f)),
        Value::Str(s) => {
            let trimmed = s.trim();
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .map(Value::Decimal)
                .map_err(|_| format!("invalid decimal literal: {:?}", s))
        }
        Value::Enum(e) => to_decimal(*e.value),
        other => Err(format!("expected a decimal, got {}", other.type_name())),
    }
}

pub(super) fn to_bool(value: Value) -> Result<Value, String> {
    to_boolean(&value).map(Value::Bool)
}

pub(super) fn to_bytes(value: Value) -> Result<Value, String> {
    match value {
        Value::Bytes(_) => Ok(value),
        Value::Str(s) => Ok(Value::Bytes(s.into_bytes())),
        Value::List(items) => items
            .iter()
            .map(|item| match item {
                Value::Int(i) => u8::try_from(*i).map_err(|_| format!("byte value {} out of range", i)),
                other => Err(format!("expected byte values, got {}", other.type_name())),
            })
            .collect::<Result<Vec<u8>, String>>()
            .map(Value::Bytes),
        other => Err(format!("expected bytes, got {}", other.type_name())),
    }
}

pub(super) fn to_uuid(value: Value) -> Result<Value, String> {
    match value {
        Value::Uuid(_) => Ok(value),
        Value::Str(s) => Uuid::parse_str(s.trim())
            .map(Value::Uuid)
            .map_err(|e| format!("invalid UUID {:?}: {}", s, e)),
        Value::Bytes(b) => Uuid::from_slice(&b)
            .map(Value::Uuid)
            .map_err(|e| format!("invalid UUID bytes: {}", e)),
        other => Err(format!("expected a UUID, got {}", other.type_name())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_boolean_canonical_set() {
        assert_eq!(to_boolean(&Value::from("YES")), Ok(true));
        assert_eq!(to_boolean(&Value::from("0")), Ok(false));
        assert_eq!(to_boolean(&Value::from(" Off ")), Ok(false));
        assert_eq!(to_boolean(&Value::from("t")), Ok(true));
        assert!(to_boolean(&Value::from("maybe")).is_err());
        assert_eq!(to_boolean(&Value::Int(0)), Ok(false));
        assert!(to_boolean(&Value::list([1])).is_err());
    }

    #[test]
    fn test_to_integer() {
        assert_eq!(to_integer(Value::from("123")), Ok(Value::Int(123)));
        assert_eq!(to_integer(Value::from(" -7 ")), Ok(Value::Int(-7)));
        assert_eq!(to_integer(Value::Float(3.9)), Ok(Value::Int(3)));
        assert_eq!(to_integer(Value::Bool(true)), Ok(Value::Int(1)));
        assert!(to_integer(Value::from("abc")).is_err());
        assert!(to_integer(Value::from("3.5")).is_err());
        assert!(to_integer(Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn test_to_float() {
        assert_eq!(to_float(Value::from("3.14")), Ok(Value::Float(3.14)));
        assert_eq!(to_float(Value::Int(2)), Ok(Value::Float(2.0)));
        assert!(to_float(Value::from("pi")).is_err());
    }

    #[test]
    fn test_to_decimal() {
        assert_eq!(to_decimal(Value::from("1.50")), Ok(Value::Decimal(Decimal::new(150, 2))));
        assert_eq!(to_decimal(Value::from("1e2")), Ok(Value::Decimal(Decimal::from(100))));
        assert!(to_decimal(Value::from("x")).is_err());
    }

    #[test]
    fn test_to_str() {
        assert_eq!(to_str(Value::Int(5)), Ok(Value::from("5")));
        assert_eq!(to_str(Value::Float(3.14)), Ok(Value::from("3.14")));
        assert_eq!(to_str(Value::Bytes(b"hi".to_vec())), Ok(Value::from("hi")));
        assert!(to_str(Value::list([1])).is_err());
        assert!(to_str(Value::map([("a", 1)])).is_err());
    }

    #[test]
    fn test_to_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(to_uuid(Value::from(id.to_string())), Ok(Value::Uuid(id)));
        assert!(to_uuid(Value::from("not-a-uuid")).is_err());
    }

    #[test]
    fn test_to_bytes() {
        assert_eq!(to_bytes(Value::from("ab")), Ok(Value::Bytes(b"ab".to_vec())));
        assert_eq!(to_bytes(Value::list([104, 105])), Ok(Value::Bytes(b"hi".to_vec())));
        assert!(to_bytes(Value::list([300])).is_err());
    }
}
