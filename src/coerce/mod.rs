//! Type coercion
//!
//! [`coerce`] maps `(declared type, raw value)` to a value of the declared
//! type. Rules, in priority order:
//!
//! 1. A zero-argument callable is invoked and its result coerced, unless the
//!    declared type is or admits `Callable`.
//! 2. Null stays null; nullability is checked by validation.
//! 3. Nested records: instances of the type (or a subtype) pass through,
//!    maps are constructed, sequences are constructed positionally. With a
//!    foreign reference and `as_objects` off, the referenced id is stored.
//! 4. Containers coerce element by element; fixed tuples position by position.
//! 5. Mappings coerce values, and keys when the key type is a scalar.
//! 6. Unions prefer an exact match, then the first alternative that coerces.
//! 7. Enums accept members, member values or member names.
//! 8. Bare containers get a shape check only.
//! 9. Callable and awaitable types pass values through untouched.
//! 10. Scalars use dedicated converters.
//!
//! Coercion has no shared mutable state and may run concurrently.

mod compound;
mod container;
mod scalar;
mod temporal;

pub use scalar::to_boolean;

use crate::errors::CoercionError;
use crate::field::{FieldDescriptor, ForeignRef};
use crate::types::{ScalarKind, TypeExpr};
use crate::value::Value;

/// Per-field information coercion needs
#[derive(Debug, Clone, Copy)]
pub struct CoerceContext<'a> {
    /// Field being coerced, for error reporting
    pub field: &'a str,
    pub foreign_ref: Option<&'a ForeignRef>,
    /// Hydrate foreign references into records instead of storing ids
    pub as_objects: bool,
}

impl<'a> CoerceContext<'a> {
    pub fn new(field: &'a str) -> Self {
        Self {
            field,
            foreign_ref: None,
            as_objects: false,
        }
    }

    pub fn for_field(field: &'a FieldDescriptor, as_objects: bool) -> Self {
        Self {
            field: &field.name,
            foreign_ref: field.foreign_ref.as_ref(),
            as_objects,
        }
    }
}

/// Coerces `raw` into `ty`
pub fn coerce(ty: &TypeExpr, raw: Value, ctx: &CoerceContext<'_>) -> Result<Value, CoercionError> {
    let raw = match raw {
        Value::Callable(producer) if !ty.keeps_callables() => {
            producer.call()
        }
        other => other,
    };
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let got = raw.type_name();
    convert(ty, raw, ctx).map_err(|message| CoercionError::new(ctx.field, ty.describe(), got, message))
}

/// Coerces a value for a declared field, honoring its custom parser
pub fn coerce_field(field: &FieldDescriptor, raw: Value, as_objects: bool) -> Result<Value, CoercionError> {
    match &field.parser {
        Some(parser) => {
            let got = raw.type_name();
            parser
                .call(&raw)
                .map_err(|message| CoercionError::new(&field.name, field.declared_type.describe(), got, message))
        }
        None => coerce(&field.declared_type, raw, &CoerceContext::for_field(field, as_objects)),
    }
}

fn convert(ty: &TypeExpr, raw: Value, ctx: &CoerceContext<'_>) -> Result<Value, String> {
    match ty {
        TypeExpr::Any | TypeExpr::Callable | TypeExpr::Awaitable => Ok(raw),
        TypeExpr::Optional(inner) => convert(inner, raw, ctx),
        TypeExpr::Scalar(kind) => convert_scalar(*kind, raw),
        TypeExpr::Union(members) => compound::union(members, raw, ctx),
        TypeExpr::Record(schema) => compound::record(schema, raw, ctx),
        TypeExpr::Enum(ty) => compound::enumeration(ty, raw),
        TypeExpr::List(inner) => container::list(inner, raw, ctx),
        TypeExpr::Set(inner) => container::set(inner, raw, ctx, false),
        TypeExpr::FrozenSet(inner) => container::set(inner, raw, ctx, true),
        TypeExpr::Tuple(shape) => container::tuple(shape, raw, ctx),
        TypeExpr::Mapping(key, value) => container::mapping(key, value, raw, ctx),
        TypeExpr::Bare(kind) => container::bare(*kind, raw),
    }
}

/// Whether `k` is already the canonical text of a key of type `key`
pub(crate) fn is_canonical_key(key: &TypeExpr, k: &str) -> bool {
    container::mapping_key(key, k.to_string(), &CoerceContext::new(k)).map_or(false, |c| c == k)
}

/// Converts a value nested inside a container or union
fn convert_element(ty: &TypeExpr, raw: Value, ctx: &CoerceContext<'_>) -> Result<Value, String> {
    if raw.is_null() {
        return if ty.accepts_null() {
            Ok(Value::Null)
        } else {
            Err(format!("None is not a valid {}", ty.describe()))
        };
    }
    convert(ty, raw, ctx)
}

fn convert_scalar(kind: ScalarKind, raw: Value) -> Result<Value, String> {
    match kind {
        ScalarKind::Str => scalar::to_str(raw),
        ScalarKind::Int => scalar::to_integer(raw),
        ScalarKind::Float => scalar::to_float(raw),
        ScalarKind::Bool => scalar::to_bool(raw),
        ScalarKind::Bytes => scalar::to_bytes(raw),
        ScalarKind::Uuid => scalar::to_uuid(raw),
        ScalarKind::Decimal => scalar::to_decimal(raw),
        ScalarKind::Date => temporal::to_date(raw),
        ScalarKind::DateTime => temporal::to_datetime(raw),
        ScalarKind::Time => temporal::to_time(raw),
        ScalarKind::TimeDelta => temporal::to_timedelta(raw),
    }
}
