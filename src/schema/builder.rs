//! Two-phase record type declaration
//!
//! A [`SchemaBuilder`] collects a declarative field list, parents and
//! hooks, then [`SchemaBuilder::build`] produces the frozen
//! [`RecordSchema`]. All declaration problems surface here as fatal
//! configuration errors, never at construction time.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;

use super::config::ModelConfig;
use super::merge::{merge_ancestors, merge_fields};
use super::types::{PostInitHook, RecordSchema};
use crate::errors::{ModelError, ModelResult};
use crate::field::{FieldDescriptor, FieldParser, FieldSpec};
use crate::observability::{log_event_with_fields, Event};
use crate::record::RecordInstance;
use crate::value::Value;

/// Declares one record type
pub struct SchemaBuilder {
    type_name: String,
    config: Option<ModelConfig>,
    strict: Option<bool>,
    frozen: Option<bool>,
    parents: Vec<Arc<RecordSchema>>,
    fields: Vec<(String, FieldSpec)>,
    parsers: Vec<(String, FieldParser)>,
    post_init: Option<PostInitHook>,
}

impl SchemaBuilder {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            config: None,
            strict: None,
            frozen: None,
            parents: Vec::new(),
            fields: Vec::new(),
            parsers: Vec::new(),
            post_init: None,
        }
    }

    /// Sets the model configuration.
    ///
    /// Without one, the first parent's configuration is inherited.
    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn frozen(mut self, frozen: bool) -> Self {
        self.frozen = Some(frozen);
        self
    }

    /// Adds a parent; earlier parents take precedence on conflicts
    pub fn extends(mut self, parent: &Arc<RecordSchema>) -> Self {
        self.parents.push(Arc::clone(parent));
        self
    }

    /// Declares a field in any of the accepted shapes
    pub fn field(mut self, name: impl Into<String>, spec: impl Into<FieldSpec>) -> Self {
        self.fields.push((name.into(), spec.into()));
        self
    }

    /// Registers a parser that replaces coercion for one field, own or inherited
    pub fn parser(
        mut self,
        field: impl Into<String>,
        f: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        self.parsers.push((field.into(), FieldParser::new(f)));
        self
    }

    /// Runs once after fields are resolved, before validation
    pub fn post_init(mut self, hook: impl Fn(&mut RecordInstance) -> ModelResult<()> + Send + Sync + 'static) -> Self {
        self.post_init = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> ModelResult<Arc<RecordSchema>> {
        let type_name = self.type_name;
        if type_name.trim().is_empty() {
            return Err(ModelError::config("<unnamed>", "", "record type name cannot be empty"));
        }

        let mut seen = HashSet::new();
        let mut own = Vec::with_capacity(self.fields.len());
        for (name, spec) in self.fields {
            if !seen.insert(name.clone()) {
                return Err(ModelError::config(&type_name, &name, "field is declared twice"));
            }
            let field = FieldDescriptor::build(&name, spec)
                .map_err(|e| ModelError::config(&type_name, e.field, e.reason))?;
            own.push(field);
        }

        let ancestors = merge_ancestors(&self.parents).ok_or_else(|| {
            ModelError::config(&type_name, "", "parents have no consistent resolution order")
        })?;
        let mut fields = merge_fields(&self.parents, &ancestors, own);

        for (name, parser) in self.parsers {
            match fields.get_mut(&name) {
                Some(field) => field.parser = Some(parser),
                None => {
                    return Err(ModelError::config(
                        &type_name,
                        &name,
                        "parser registered for an undeclared field",
                    ))
                }
            }
        }

        let mut aliases = IndexMap::new();
        for field in fields.values() {
            let Some(alias) = &field.alias else { continue };
            let clashes_with_field = fields.get(alias).map_or(false, |other| other.name != field.name);
            if aliases.contains_key(alias) || clashes_with_field {
                return Err(ModelError::config(
                    &type_name,
                    &field.name,
                    format!("alias {:?} is already in use", alias),
                ));
            }
            aliases.insert(alias.clone(), field.name.clone());
        }

        let primary_keys = fields
            .values()
            .filter(|f| f.primary_key)
            .map(|f| f.name.clone())
            .collect();

        let mut config = self
            .config
            .or_else(|| self.parents.first().map(|p| p.config().clone()))
            .unwrap_or_default();
        if let Some(strict) = self.strict {
            config.strict = strict;
        }
        if let Some(frozen) = self.frozen {
            config.frozen = frozen;
        }

        let post_init = self
            .post_init
            .or_else(|| self.parents.iter().find_map(|p| p.post_init().cloned()));

        let schema = RecordSchema {
            ancestors,
            type_name,
            fields,
            config,
            aliases,
            primary_keys,
            post_init,
        };

        let count = schema.fields.len().to_string();
        log_event_with_fields(
            Event::SchemaBuilt,
            &[("type", schema.type_name.as_str()), ("fields", count.as_str())],
        );

        Ok(Arc::new(schema))
    }
}
