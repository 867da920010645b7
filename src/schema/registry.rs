//! Named record types and enumerations
//!
//! Published schemas are immutable: registering a name twice is rejected.
//! The one administrative exception is [`SchemaRegistry::add_field`], which
//! publishes a new version of a permissive type with an extra field.
//! Instances built from the previous version keep that version.

use std::sync::Arc;

use indexmap::IndexMap;

use super::types::RecordSchema;
use crate::errors::{ModelError, ModelResult};
use crate::field::{FieldDescriptor, FieldSpec};
use crate::observability::{log_event_with_fields, Event};
use crate::record::{self, RecordInstance};
use crate::types::{EnumType, TypeResolver};
use crate::value::ValueMap;

/// In-memory registry of record types and enumerations
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: IndexMap<String, Arc<RecordSchema>>,
    enums: IndexMap<String, Arc<EnumType>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a schema under its type name
    pub fn register(&mut self, schema: Arc<RecordSchema>) -> ModelResult<()> {
        let name = schema.type_name().to_string();
        if self.schemas.contains_key(&name) || self.enums.contains_key(&name) {
            return Err(ModelError::SchemaImmutable(name));
        }
        let count = schema.field_table().len().to_string();
        self.schemas.insert(name.clone(), schema);
        log_event_with_fields(
            Event::SchemaRegistered,
            &[("type", name.as_str()), ("fields", count.as_str())],
        );
        Ok(())
    }

    /// Publishes an enumeration under its name
    pub fn register_enum(&mut self, ty: EnumType) -> ModelResult<Arc<EnumType>> {
        if self.schemas.contains_key(&ty.name) || self.enums.contains_key(&ty.name) {
            return Err(ModelError::SchemaImmutable(ty.name));
        }
        let ty = Arc::new(ty);
        self.enums.insert(ty.name.clone(), Arc::clone(&ty));
        log_event_with_fields(Event::SchemaRegistered, &[("enum", ty.name.as_str())]);
        Ok(ty)
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<RecordSchema>> {
        self.schemas.get(type_name).cloned()
    }

    /// Like [`get`](Self::get) but unknown names are an error
    pub fn require(&self, type_name: &str) -> ModelResult<Arc<RecordSchema>> {
        self.get(type_name)
            .ok_or_else(|| ModelError::UnknownSchema(type_name.to_string()))
    }

    pub fn get_enum(&self, name: &str) -> Option<Arc<EnumType>> {
        self.enums.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name) || self.enums.contains_key(name)
    }

    /// Registered record type names, in registration order
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.schemas.len() + self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Appends a field to a registered permissive type.
    ///
    /// Strict types are closed and reject new fields.
    pub fn add_field(
        &mut self,
        type_name: &str,
        name: &str,
        spec: impl Into<FieldSpec>,
    ) -> ModelResult<Arc<RecordSchema>> {
        let current = self.require(type_name)?;
        if current.is_strict() {
            return Err(ModelError::config(
                type_name,
                name,
                format!("Cannot create a new field {} on a Strict Model", name),
            ));
        }
        let field = FieldDescriptor::build(name, spec).map_err(|e| ModelError::config(type_name, e.field, e.reason))?;
        let next = Arc::new(current.with_field(field)?);
        self.schemas.insert(type_name.to_string(), Arc::clone(&next));
        log_event_with_fields(Event::SchemaFieldAdded, &[("type", type_name), ("field", name)]);
        Ok(next)
    }

    /// Constructs an instance of a registered type
    pub fn construct(&self, type_name: &str, input: ValueMap) -> ModelResult<RecordInstance> {
        record::construct(&self.require(type_name)?, input)
    }
}

impl TypeResolver for SchemaRegistry {
    fn resolve_record(&self, name: &str) -> Option<Arc<RecordSchema>> {
        self.get(name)
    }

    fn resolve_enum(&self, name: &str) -> Option<Arc<EnumType>> {
        self.get_enum(name)
    }
}
