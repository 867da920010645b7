//! Single-field assignment
//!
//! Every write goes through the same coerce and validate steps as
//! construction. Undeclared names follow the schema's unknown-field rules
//! and land in the instance's dynamic field table, never in the schema.

use std::sync::Arc;

use super::instance::{RecordInstance, RecordState};
use crate::coerce::coerce_field;
use crate::errors::{ErrorDetail, ModelError, ModelResult};
use crate::field::FieldDescriptor;
use crate::observability::{log_event_with_fields, Event};
use crate::schema::ExtraPolicy;
use crate::validate::validate;
use crate::value::Value;

impl RecordInstance {
    /// Assigns one field by internal name.
    ///
    /// Strict records reject a failing value and keep the previous one.
    /// Permissive records store it and record the error.
    pub fn set_field(&mut self, name: &str, value: impl Into<Value>) -> ModelResult<()> {
        let value = value.into();

        if self.state == RecordState::Frozen {
            log_event_with_fields(Event::FrozenWriteRejected, &[("type", self.type_name()), ("field", name)]);
            return Err(ModelError::FrozenWrite {
                type_name: self.type_name().to_string(),
                field: name.to_string(),
            });
        }

        let schema = Arc::clone(&self.schema);
        let field = match schema.field(name).or_else(|| self.dynamic_fields.get(name)) {
            Some(field) => field.clone(),
            None => return self.add_dynamic(name, value),
        };

        if self.state == RecordState::PostInitHook {
            let stored = coerce_field(&field, value.clone(), schema.config().as_objects).unwrap_or(value);
            self.values.insert(field.name, stored);
            return Ok(());
        }

        if field.readonly {
            return Err(ModelError::ReadOnly {
                type_name: self.type_name().to_string(),
                field: name.to_string(),
            });
        }

        let (stored, failure) = self.check(&field, value);
        match failure {
            Some(detail) if schema.is_strict() => {
                log_event_with_fields(
                    Event::AssignmentRejected,
                    &[("type", self.type_name()), ("field", name)],
                );
                Err(ModelError::Field(Box::new(detail)))
            }
            Some(detail) => {
                self.errors.insert(field.name.clone(), detail);
                self.store(field.name, stored);
                Ok(())
            }
            None => {
                self.errors.shift_remove(&field.name);
                self.store(field.name, stored);
                Ok(())
            }
        }
    }

    /// Coerces then validates; returns the value to store and any failure
    fn check(&self, field: &FieldDescriptor, value: Value) -> (Value, Option<ErrorDetail>) {
        match coerce_field(field, value.clone(), self.schema.config().as_objects) {
            Ok(coerced) => {
                let failure = validate(field, &coerced, &self.schema.validation_policy());
                (coerced, failure)
            }
            Err(e) => (value.clone(), Some(e.into_detail(value))),
        }
    }

    fn store(&mut self, name: String, value: Value) {
        if !self.original_values.contains_key(&name) {
            self.original_values.insert(name.clone(), value.clone());
        }
        self.values.insert(name, value);
    }

    fn add_dynamic(&mut self, name: &str, value: Value) -> ModelResult<()> {
        let config = self.schema.config();
        if self.schema.is_strict() || config.extra == ExtraPolicy::Forbid {
            return Err(ModelError::unknown_field(self.type_name(), name));
        }
        if config.extra == ExtraPolicy::Ignore {
            return Ok(());
        }

        let field = FieldDescriptor::dynamic(name, &value);
        let ty = field.declared_type.describe();
        log_event_with_fields(
            Event::DynamicFieldCreated,
            &[("type", self.type_name()), ("field", name), ("as", ty.as_str())],
        );
        self.dynamic_fields.insert(name.to_string(), field);
        self.store(name.to_string(), value);
        Ok(())
    }
}
