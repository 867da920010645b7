//! Record instances
//!
//! Construction drives coercion and validation over a frozen
//! [`RecordSchema`](crate::schema::RecordSchema):
//!
//! `FieldsResolving -> PostInitHook -> Validated -> Frozen`
//!
//! Strict schemas surface every field error at once as an
//! [`AggregateError`](crate::errors::AggregateError); permissive schemas keep
//! the instance and mark it invalid.
//!
//! The free functions below are the surface consumed by exporters and
//! storage drivers.

mod assign;
mod construct;
mod export;
mod instance;

use std::sync::Arc;

pub use construct::{construct, construct_positional, from_json};
pub use export::ExportOptions;
pub use instance::{RecordInstance, RecordState};

use crate::errors::ModelResult;
use crate::schema::{FieldTable, RecordSchema};
use crate::value::{Value, ValueMap};

/// Read-only field table of a record type
pub fn get_field_table(schema: &Arc<RecordSchema>) -> &FieldTable {
    schema.field_table()
}

/// Assigns one field through coercion and validation
pub fn set_field(instance: &mut RecordInstance, name: &str, value: impl Into<Value>) -> ModelResult<()> {
    instance.set_field(name, value)
}

/// Plain map with nested records expanded
pub fn to_plain_map(instance: &RecordInstance, remove_nulls: bool) -> ValueMap {
    instance.to_plain_map(remove_nulls)
}

/// First value a field held
pub fn old_value(instance: &RecordInstance, name: &str) -> ModelResult<Value> {
    instance.old_value(name)
}
