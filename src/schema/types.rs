//! Frozen record schema

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::config::ModelConfig;
use crate::errors::{ModelError, ModelResult};
use crate::field::FieldDescriptor;
use crate::record::RecordInstance;
use crate::validate::ValidationPolicy;

/// Ordered field table: declaration order drives display and export
pub type FieldTable = IndexMap<String, FieldDescriptor>;

/// Hook run once after all fields are resolved and before validation
pub type PostInitHook = Arc<dyn Fn(&mut RecordInstance) -> ModelResult<()> + Send + Sync>;

/// How an input key maps onto the field table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResolution<'a> {
    /// Key names this field (by alias or by unaliased name)
    Field(&'a str),
    /// Key is the internal name of a field that declares an alias
    AliasShadowed(&'a str),
    Unknown,
}

/// Schema of one record type.
///
/// Built once by [`SchemaBuilder`](super::SchemaBuilder) and shared behind an
/// `Arc`; never mutated after publication.
#[derive(Clone)]
pub struct RecordSchema {
    pub(super) type_name: String,
    pub(super) fields: FieldTable,
    pub(super) config: ModelConfig,
    /// Every ancestor, nearest first, without duplicates
    pub(super) ancestors: Vec<String>,
    /// External alias to internal name
    pub(super) aliases: IndexMap<String, String>,
    pub(super) primary_keys: Vec<String>,
    pub(super) post_init: Option<PostInitHook>,
}

impl RecordSchema {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Display name from the configuration, else the type name
    pub fn display_name(&self) -> &str {
        self.config.name.as_deref().unwrap_or(&self.type_name)
    }

    pub fn field_table(&self) -> &FieldTable {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn is_strict(&self) -> bool {
        self.config.strict
    }

    pub fn is_frozen(&self) -> bool {
        self.config.frozen
    }

    pub fn remove_nulls_on_export(&self) -> bool {
        self.config.remove_nulls
    }

    pub fn ancestors(&self) -> &[String] {
        &self.ancestors
    }

    pub fn aliases(&self) -> &IndexMap<String, String> {
        &self.aliases
    }

    pub fn primary_keys(&self) -> &[String] {
        &self.primary_keys
    }

    pub fn post_init(&self) -> Option<&PostInitHook> {
        self.post_init.as_ref()
    }

    pub fn validation_policy(&self) -> ValidationPolicy {
        self.config.validation_policy()
    }

    /// Whether instances of this type may stand in for `other`
    pub fn is_subtype_of(&self, other: &RecordSchema) -> bool {
        self.type_name == other.type_name || self.ancestors.iter().any(|a| *a == other.type_name)
    }

    /// Maps an input key (after `alias_function`) onto the field table
    pub fn resolve_input_key<'a>(&'a self, key: &'a str) -> KeyResolution<'a> {
        if let Some(internal) = self.aliases.get(key) {
            return KeyResolution::Field(internal);
        }
        match self.fields.get(key) {
            Some(field) if field.alias.is_some() => KeyResolution::AliasShadowed(&field.name),
            Some(field) => KeyResolution::Field(&field.name),
            None => KeyResolution::Unknown,
        }
    }

    /// Copy of the schema with one more field appended
    pub(super) fn with_field(&self, field: FieldDescriptor) -> ModelResult<RecordSchema> {
        if self.fields.contains_key(&field.name) {
            return Err(ModelError::config(
                &self.type_name,
                &field.name,
                "field is already declared",
            ));
        }
        let mut next = self.clone();
        if let Some(alias) = &field.alias {
            if next.aliases.contains_key(alias) || next.fields.contains_key(alias) {
                return Err(ModelError::config(
                    &self.type_name,
                    &field.name,
                    format!("alias {:?} is already in use", alias),
                ));
            }
            next.aliases.insert(alias.clone(), field.name.clone());
        }
        if field.primary_key {
            next.primary_keys.push(field.name.clone());
        }
        next.fields.insert(field.name.clone(), field);
        Ok(next)
    }
}

impl fmt::Debug for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSchema")
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .field("ancestors", &self.ancestors)
            .field("post_init", &self.post_init.is_some())
            .finish()
    }
}

impl fmt::Display for RecordSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.type_name)?;
        for (i, field) in self.fields.values().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field.name, field.declared_type)?;
        }
        write!(f, ")")
    }
}
