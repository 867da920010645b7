//! Per-field validator

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::errors::ErrorDetail;
use crate::field::FieldDescriptor;
use crate::types::TypeExpr;
use crate::value::{compare, loose_eq, Value};

/// How a missing primary key is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryKeyPolicy {
    /// Missing keys fail unless the field has `db_default`
    #[default]
    Strict,
    /// Keys are assigned by an external store; never checked here
    DeferToStore,
}

/// Schema-level switches that affect validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationPolicy {
    pub strict: bool,
    pub primary_key: PrimaryKeyPolicy,
}

impl ValidationPolicy {
    pub fn new(strict: bool, primary_key: PrimaryKeyPolicy) -> Self {
        Self { strict, primary_key }
    }
}

struct Failures<'a> {
    field: &'a FieldDescriptor,
    value: &'a Value,
    detail: Option<ErrorDetail>,
}

impl<'a> Failures<'a> {
    fn new(field: &'a FieldDescriptor, value: &'a Value) -> Self {
        Self {
            field,
            value,
            detail: None,
        }
    }

    fn push(&mut self, message: String) {
        match &mut self.detail {
            Some(detail) => detail.push(message),
            None => {
                self.detail = Some(ErrorDetail::new(
                    &self.field.name,
                    self.value.clone(),
                    message,
                    self.field.declared_type.describe(),
                ))
            }
        }
    }
}

/// Validates a coerced value against its descriptor.
///
/// Returns `None` when every check passes.
pub fn validate(field: &FieldDescriptor, value: &Value, policy: &ValidationPolicy) -> Option<ErrorDetail> {
    let mut failures = Failures::new(field, value);

    if value.is_null() {
        if field.required && policy.strict {
            failures.push(format!("Missing Required Field *{}*", field.name));
            return failures.detail;
        }
        if !field.nullable && policy.strict {
            failures.push(format!("Field *{}* cannot be null", field.name));
        }
        if field.primary_key && !field.db_default && policy.primary_key == PrimaryKeyPolicy::Strict {
            failures.push(format!("Missing Primary Key *{}*", field.name));
        }
        return failures.detail;
    }

    if field.required && matches!(field.declared_type.strip_optional(), TypeExpr::Callable) && !value.is_callable() {
        failures.push(format!("Field *{}* must be callable", field.name));
    }
    if field.required && matches!(field.declared_type.strip_optional(), TypeExpr::Awaitable) && !value.is_awaitable() {
        failures.push(format!("Field *{}* must be awaitable", field.name));
    }

    check_constraints(field, value, &mut failures);

    if let Some(validator) = &field.validator {
        match validator.call(field, value) {
            Ok(true) => {}
            Ok(false) => failures.push(format!("validator rejected value for *{}*", field.name)),
            Err(message) => failures.push(format!("validator failed for *{}*: {}", field.name, message)),
        }
    }

    failures.detail
}

fn check_constraints(field: &FieldDescriptor, value: &Value, failures: &mut Failures<'_>) {
    let c = &field.constraints;
    let sized_bounds = !value.is_numeric() && value.len().is_some();

    for (name, bound, want) in [("min", &c.min, Ordering::Less), ("max", &c.max, Ordering::Greater)] {
        let Some(bound) = bound else { continue };
        if sized_bounds {
            let (len, limit) = (value.len().unwrap_or(0) as i64, bound.as_int().unwrap_or(0));
            if len.cmp(&limit) == want {
                failures.push(format!("length {} violates {} of {}", len, name, limit));
            }
        } else {
            match compare(value, bound) {
                Some(ord) if ord == want => {
                    failures.push(format!("{} is {} than {} of {}", value, relation(want), name, bound))
                }
                Some(_) => {}
                None => failures.push(format!("{} cannot be compared with {} of {}", value, name, bound)),
            }
        }
    }

    if let Some(length) = c.length {
        match value.len() {
            Some(len) if len == length => {}
            Some(len) => failures.push(format!("length must be {}, got {}", length, len)),
            None => failures.push(format!("{} has no length", value.type_name())),
        }
    }

    if let (Some(pattern), Value::Str(s)) = (&c.pattern, value) {
        if !pattern.is_match(s) {
            failures.push(format!("{:?} does not match pattern {:?}", s, pattern.as_str()));
        }
    }

    if let Some(expected) = &c.eq {
        if !loose_eq(value, expected) {
            failures.push(format!("{} must equal {}", value, expected));
        }
    }
    if let Some(unexpected) = &c.ne {
        if loose_eq(value, unexpected) {
            failures.push(format!("{} must not equal {}", value, unexpected));
        }
    }

    let ordering: [(&str, &Option<Value>, fn(Ordering) -> bool); 4] = [
        ("greater than or equal to", &c.ge, |o| o != Ordering::Less),
        ("less than or equal to", &c.le, |o| o != Ordering::Greater),
        ("greater than", &c.gt, |o| o == Ordering::Greater),
        ("less than", &c.lt, |o| o == Ordering::Less),
    ];
    for (relation, bound, holds) in ordering {
        let Some(bound) = bound else { continue };
        match compare(value, bound) {
            Some(ord) if holds(ord) => {}
            Some(_) => failures.push(format!("{} must be {} {}", value, relation, bound)),
            None => failures.push(format!("{} cannot be compared with {}", value, bound)),
        }
    }
}

fn relation(ord: Ordering) -> &'static str {
    if ord == Ordering::Less {
        "less"
    } else {
        "greater"
    }
}
