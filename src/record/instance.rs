//! Record instance state and accessors

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::errors::{ErrorDetail, ModelError, ModelResult};
use crate::field::FieldDescriptor;
use crate::schema::{FieldTable, RecordSchema};
use crate::value::{Value, ValueMap};

/// Construction lifecycle of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Input is being coerced field by field
    FieldsResolving,
    /// The post-init hook is running; assignments coerce without validating
    PostInitHook,
    /// Validation finished; `errors` is final until the next assignment
    Validated,
    /// Validated and closed to further writes
    Frozen,
}

/// One validated (or, in permissive mode, possibly invalid) record.
///
/// The schema is shared; values, errors and dynamic fields are private to
/// the instance. Concurrent mutation of one instance needs external
/// synchronization.
#[derive(Debug, Clone)]
pub struct RecordInstance {
    pub(super) schema: Arc<RecordSchema>,
    /// Declared fields in declaration order, then dynamic fields
    pub(super) values: ValueMap,
    /// Baseline for change tracking
    pub(super) original_values: ValueMap,
    pub(super) errors: IndexMap<String, ErrorDetail>,
    /// Fields promoted from undeclared keys on this instance only
    pub(super) dynamic_fields: FieldTable,
    pub(super) state: RecordState,
}

impl RecordInstance {
    pub(super) fn empty(schema: &Arc<RecordSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            values: ValueMap::with_capacity(schema.field_table().len()),
            original_values: ValueMap::new(),
            errors: IndexMap::new(),
            dynamic_fields: FieldTable::new(),
            state: RecordState::FieldsResolving,
        }
    }

    pub fn schema(&self) -> &Arc<RecordSchema> {
        &self.schema
    }

    pub fn type_name(&self) -> &str {
        self.schema.type_name()
    }

    pub fn state(&self) -> RecordState {
        self.state
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_frozen(&self) -> bool {
        self.state == RecordState::Frozen
    }

    /// Field errors collected in permissive mode
    pub fn errors(&self) -> &IndexMap<String, ErrorDetail> {
        &self.errors
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Declared or dynamic field descriptor
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.schema.field(name).or_else(|| self.dynamic_fields.get(name))
    }

    /// Declared fields followed by this instance's dynamic fields
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.schema
            .field_table()
            .values()
            .chain(self.dynamic_fields.values())
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields().map(|f| f.name.as_str())
    }

    pub fn dynamic_fields(&self) -> &FieldTable {
        &self.dynamic_fields
    }

    pub fn values(&self) -> &ValueMap {
        &self.values
    }

    /// First value a field held since construction or the last reset
    pub fn old_value(&self, name: &str) -> ModelResult<Value> {
        self.original_values
            .get(name)
            .cloned()
            .ok_or_else(|| ModelError::missing_field(self.type_name(), name))
    }

    /// Names of fields whose value differs from the tracked baseline
    pub fn changed_fields(&self) -> Vec<&str> {
        self.values
            .iter()
            .filter(|(name, value)| self.original_values.get(*name) != Some(*value))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Makes the current values the change-tracking baseline
    pub fn reset_values(&mut self) {
        self.original_values = self.values.clone();
    }

    /// Returns a field's value and clears it.
    ///
    /// Declared fields are set to null; dynamic fields are removed.
    pub fn pop(&mut self, name: &str) -> ModelResult<Value> {
        if self.is_frozen() {
            return Err(ModelError::FrozenWrite {
                type_name: self.type_name().to_string(),
                field: name.to_string(),
            });
        }
        if self.dynamic_fields.shift_remove(name).is_some() {
            self.errors.shift_remove(name);
            return self
                .values
                .shift_remove(name)
                .ok_or_else(|| ModelError::missing_field(self.type_name(), name));
        }
        match self.values.get_mut(name) {
            Some(slot) => Ok(std::mem::take(slot)),
            None => Err(ModelError::missing_field(self.type_name(), name)),
        }
    }

    /// Primary key field names and their current values
    pub fn primary_key_values(&self) -> ValueMap {
        self.schema
            .primary_keys()
            .iter()
            .map(|name| (name.clone(), self.values.get(name).cloned().unwrap_or_default()))
            .collect()
    }
}

impl PartialEq for RecordInstance {
    fn eq(&self, other: &Self) -> bool {
        self.schema.type_name() == other.schema.type_name() && self.values == other.values
    }
}

impl fmt::Display for RecordInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.type_name())?;
        let visible = self.fields().filter(|field| field.repr);
        for (i, field) in visible.enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match self.values.get(&field.name) {
                Some(Value::Str(s)) => write!(f, "{}={:?}", field.name, s)?,
                Some(value) => write!(f, "{}={}", field.name, value)?,
                None => write!(f, "{}=None", field.name)?,
            }
        }
        write!(f, ")")
    }
}
