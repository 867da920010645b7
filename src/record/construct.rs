//! Record construction
//!
//! Input keys are mapped onto the field table, every field is resolved and
//! coerced without stopping at the first failure, the post-init hook runs,
//! and validation decides between a valid record, an invalid permissive
//! record, or an aggregate error.

use std::sync::Arc;

use super::instance::{RecordInstance, RecordState};
use crate::coerce::coerce_field;
use crate::errors::{AggregateError, CoercionError, ModelError, ModelResult};
use crate::field::FieldDescriptor;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::{ExtraPolicy, KeyResolution, RecordSchema};
use crate::validate::validate;
use crate::value::{Value, ValueMap};

/// Input after alias resolution
struct Routed {
    /// Internal field name to raw value
    declared: ValueMap,
    /// Internal names used directly on a field that declares an alias
    shadowed: ValueMap,
    /// Undeclared keys kept as dynamic fields
    extra: ValueMap,
}

/// Builds a record from keyword input
pub fn construct(schema: &Arc<RecordSchema>, input: ValueMap) -> ModelResult<RecordInstance> {
    let routed = route_input(schema, input).map_err(|e| {
        log_event_with_fields(Event::RecordRejected, &[("type", schema.type_name())]);
        e
    })?;
    build(schema, routed)
}

/// Builds a record from values given in declaration order
pub fn construct_positional(schema: &Arc<RecordSchema>, items: Vec<Value>) -> ModelResult<RecordInstance> {
    let declared = schema.field_table().len();
    if items.len() > declared {
        return Err(ModelError::unknown_field(
            schema.type_name(),
            format!("positional argument {} (takes {})", items.len(), declared),
        ));
    }
    let input = schema
        .field_table()
        .values()
        .zip(items)
        .map(|(field, value)| (field.input_name().to_string(), value))
        .collect();
    construct(schema, input)
}

/// Builds a record from a JSON object (or array, positionally)
pub fn from_json(schema: &Arc<RecordSchema>, json: &serde_json::Value) -> ModelResult<RecordInstance> {
    match Value::from_json(json) {
        Value::Map(map) => construct(schema, map),
        Value::List(items) => construct_positional(schema, items),
        other => Err(CoercionError::new(
            schema.type_name(),
            schema.type_name(),
            other.type_name(),
            "expected a JSON object",
        )
        .into()),
    }
}

fn route_input(schema: &RecordSchema, input: ValueMap) -> ModelResult<Routed> {
    let config = schema.config();
    let mut routed = Routed {
        declared: ValueMap::with_capacity(input.len()),
        shadowed: ValueMap::new(),
        extra: ValueMap::new(),
    };

    for (key, value) in input {
        let key = config.alias_function.apply(&key);
        match schema.resolve_input_key(&key) {
            KeyResolution::Field(name) => {
                routed.declared.insert(name.to_string(), value);
            }
            KeyResolution::AliasShadowed(name) => {
                if schema.is_strict() {
                    return Err(ModelError::unknown_field(schema.type_name(), key));
                }
                routed.shadowed.insert(name.to_string(), value);
            }
            KeyResolution::Unknown => {
                if schema.is_strict() || config.extra == ExtraPolicy::Forbid {
                    return Err(ModelError::unknown_field(schema.type_name(), key));
                }
                if config.extra == ExtraPolicy::Allow {
                    routed.extra.insert(key, value);
                }
            }
        }
    }

    // the alias wins when both spellings were given
    for (name, value) in std::mem::take(&mut routed.shadowed) {
        routed.declared.entry(name).or_insert(value);
    }
    Ok(routed)
}

/// Raw input for a field: provided value, else default or factory
fn resolve_raw(field: &FieldDescriptor, provided: Option<Value>) -> Value {
    match provided {
        Some(value) if !value.is_null() || field.nullable || field.declared_type.accepts_null() => value,
        _ => field.default_value(),
    }
}

fn build(schema: &Arc<RecordSchema>, mut routed: Routed) -> ModelResult<RecordInstance> {
    let mut record = RecordInstance::empty(schema);
    let as_objects = schema.config().as_objects;

    for field in schema.field_table().values() {
        let raw = resolve_raw(field, routed.declared.shift_remove(&field.name));
        let value = match coerce_field(field, raw.clone(), as_objects) {
            Ok(value) => value,
            Err(e) => {
                record.errors.insert(field.name.clone(), e.into_detail(raw.clone()));
                raw
            }
        };
        record.values.insert(field.name.clone(), value);
    }

    for (name, value) in routed.extra {
        let field = FieldDescriptor::dynamic(name.as_str(), &value);
        let ty = field.declared_type.describe();
        log_event_with_fields(
            Event::DynamicFieldCreated,
            &[("type", schema.type_name()), ("field", name.as_str()), ("as", ty.as_str())],
        );
        record.dynamic_fields.insert(name.clone(), field);
        record.values.insert(name, value);
    }

    if let Some(hook) = schema.post_init() {
        record.state = RecordState::PostInitHook;
        hook(&mut record)?;
    }

    let policy = schema.validation_policy();
    for field in schema.field_table().values() {
        if record.errors.contains_key(&field.name) {
            continue;
        }
        let value = record.values.get(&field.name).cloned().unwrap_or_default();
        if let Some(detail) = validate(field, &value, &policy) {
            record.errors.insert(field.name.clone(), detail);
        }
    }

    record.original_values = record.values.clone();

    if !record.errors.is_empty() {
        let table = schema.field_table();
        record
            .errors
            .sort_by(|a, _, b, _| table.get_index_of(a).cmp(&table.get_index_of(b)));
        let count = record.errors.len().to_string();
        if schema.is_strict() {
            log_event_with_fields(
                Event::RecordRejected,
                &[("type", schema.type_name()), ("errors", count.as_str())],
            );
            return Err(AggregateError {
                type_name: schema.type_name().to_string(),
                payload: record.errors,
            }
            .into());
        }
        log_event_with_fields(
            Event::RecordInvalid,
            &[("type", schema.type_name()), ("errors", count.as_str())],
        );
    }

    record.state = if schema.is_frozen() {
        RecordState::Frozen
    } else {
        RecordState::Validated
    };
    log_event_with_fields(Event::RecordConstructed, &[("type", schema.type_name())]);
    Ok(record)
}
