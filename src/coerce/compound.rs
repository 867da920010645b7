//! Union, enum and nested-record converters

use std::sync::Arc;

use super::{convert, CoerceContext};
use crate::errors::ModelError;
use crate::record;
use crate::schema::RecordSchema;
use crate::types::{EnumType, TypeExpr};
use crate::value::Value;

/// Exact match first, then the first alternative that coerces
pub(super) fn union(members: &[TypeExpr], raw: Value, ctx: &CoerceContext<'_>) -> Result<Value, String> {
    if members.iter().any(|m| m.matches_exactly(&raw)) {
        return Ok(raw);
    }

    let mut attempts = Vec::with_capacity(members.len());
    for member in members {
        match convert(member, raw.clone(), ctx) {
            Ok(v) => return Ok(v),
            Err(e) => attempts.push(format!("{}: {}", member.describe(), e)),
        }
    }
    Err(format!("no alternative accepted the value ({})", attempts.join("; ")))
}

/// Member, then member value, then member name
pub(super) fn enumeration(ty: &EnumType, raw: Value) -> Result<Value, String> {
    if let Value::Enum(e) = &raw {
        if e.enum_name == ty.name {
            return Ok(raw);
        }
        return Err(format!("{}.{} is not a member of {}", e.enum_name, e.member, ty.name));
    }

    ty.by_value(&raw)
        .or_else(|| raw.as_str().and_then(|name| ty.by_name(name)))
        .map(Value::Enum)
        .ok_or_else(|| format!("{} is not a valid {}", raw, ty.name))
}

pub(super) fn record(schema: &Arc<RecordSchema>, raw: Value, ctx: &CoerceContext<'_>) -> Result<Value, String> {
    if let Value::Record(instance) = &raw {
        if instance.schema().is_subtype_of(schema) {
            return Ok(raw);
        }
        return Err(format!(
            "expected {} record, got {}",
            schema.type_name(),
            instance.schema().type_name()
        ));
    }

    if let Some(reference) = ctx.foreign_ref {
        // scalars are ids; mappings collapse to their key unless hydrating
        let id_only = match &raw {
            Value::Map(_) => !ctx.as_objects,
            other => other.as_items().is_none(),
        };
        if id_only {
            return match raw {
                Value::Map(map) => map.get(&reference.key_field).cloned().ok_or_else(|| {
                    format!("reference to {} is missing key {:?}", reference.schema, reference.key_field)
                }),
                id => Ok(id),
            };
        }
    }

    let built = match raw {
        Value::Map(map) => record::construct(schema, map),
        Value::List(items) | Value::Tuple(items) => record::construct_positional(schema, items),
        other => {
            return Err(format!(
                "expected {} record or mapping, got {}",
                schema.type_name(),
                other.type_name()
            ))
        }
    };

    built.map(Value::from).map_err(|e| nested_message(schema, e))
}

fn nested_message(schema: &RecordSchema, error: ModelError) -> String {
    match error {
        ModelError::Validation(aggregate) => {
            let fields: Vec<String> = aggregate
                .payload
                .values()
                .map(|detail| format!("{}: {}", detail.field, detail.error_message()))
                .collect();
            format!("invalid {} ({})", schema.type_name(), fields.join("; "))
        }
        other => format!("invalid {} ({})", schema.type_name(), other),
    }
}
