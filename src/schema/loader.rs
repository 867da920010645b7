//! Schema loader for definition documents on disk
//!
//! Each `*.json` file in the schema directory holds one definition or an
//! array of definitions. Two shapes are accepted:
//!
//! ```json
//! {"enum": "Color", "variants": {"RED": 1, "GREEN": 2}}
//! {"name": "User", "parents": ["Base"], "config": {"strict": false},
//!  "fields": {"id": {"type": "int", "primary_key": true},
//!             "tags": {"type": "List[str]", "default": []}}}
//! ```
//!
//! Enumerations are registered first. Models are then registered in
//! dependency order, so a file may reference a type declared in a later
//! file. Malformed documents and references that never resolve are fatal.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use super::builder::SchemaBuilder;
use super::config::ModelConfig;
use super::registry::SchemaRegistry;
use super::types::RecordSchema;
use crate::errors::{ModelError, ModelResult};
use crate::field::{FieldOptions, ForeignRef};
use crate::observability::{log_event_with_fields, Event};
use crate::types::{parse_type_expr, EnumType, ParseError, TypeExpr};
use crate::value::Value;

/// One file: a single definition or a list of them
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Document {
    Many(Vec<Definition>),
    One(Definition),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Definition {
    Enum(EnumDefinition),
    Model(ModelDefinition),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EnumDefinition {
    #[serde(rename = "enum")]
    name: String,
    variants: Variants,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Variants {
    /// Member name to member value
    Valued(IndexMap<String, serde_json::Value>),
    /// Members whose value is their own name
    Named(Vec<String>),
}

#[derive(Debug, Deserialize)]
struct ModelDefinition {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    config: Option<ModelConfig>,
    #[serde(default)]
    parents: Vec<String>,
    #[serde(default)]
    fields: IndexMap<String, FieldDefinition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FieldDefinition {
    #[serde(rename = "type")]
    type_expr: Option<String>,
    default: Option<serde_json::Value>,
    required: bool,
    nullable: Option<bool>,
    primary_key: bool,
    repr: Option<bool>,
    readonly: bool,
    alias: Option<String>,
    db_default: bool,
    min: Option<serde_json::Value>,
    max: Option<serde_json::Value>,
    ge: Option<serde_json::Value>,
    le: Option<serde_json::Value>,
    gt: Option<serde_json::Value>,
    lt: Option<serde_json::Value>,
    eq: Option<serde_json::Value>,
    ne: Option<serde_json::Value>,
    length: Option<usize>,
    pattern: Option<String>,
    fk: Option<ForeignRefDefinition>,
    /// Everything else is kept as free-form field metadata
    #[serde(flatten)]
    metadata: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ForeignRefDefinition {
    schema: String,
    key: String,
    #[serde(default)]
    label: Option<String>,
}

/// Why a model could not be built on this pass
enum BuildFailure {
    /// Names a type that is not registered yet
    Unresolved(String),
    Invalid(String),
}

/// Reads definition documents from a directory into a [`SchemaRegistry`]
pub struct SchemaLoader {
    schema_dir: PathBuf,
}

impl SchemaLoader {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Loads every definition in the directory.
    ///
    /// A missing directory is created and yields nothing. Returns the names
    /// registered, enumerations first.
    pub fn load_all(&self, registry: &mut SchemaRegistry) -> ModelResult<Vec<String>> {
        let dir = self.schema_dir.display().to_string();
        if !self.schema_dir.exists() {
            fs::create_dir_all(&self.schema_dir)
                .map_err(|e| ModelError::malformed(&dir, format!("Failed to create schema directory: {}", e)))?;
            return Ok(Vec::new());
        }

        let mut enums = Vec::new();
        let mut models = Vec::new();
        for path in self.definition_files()? {
            let origin = path.display().to_string();
            for definition in read_document(&path)? {
                match definition {
                    Definition::Enum(def) => enums.push((origin.clone(), def)),
                    Definition::Model(def) => models.push((origin.clone(), def)),
                }
            }
        }

        let mut loaded = Vec::new();
        for (origin, def) in enums {
            let name = def.name.clone();
            registry
                .register_enum(build_enum(def))
                .map_err(|e| ModelError::malformed(&origin, e.to_string()))?;
            loaded.push(name);
        }

        let mut pending = models;
        while !pending.is_empty() {
            let mut progressed = false;
            let mut blocked = Vec::new();
            let mut last_unresolved = None;

            for (origin, def) in pending {
                match build_model(&def, registry) {
                    Ok(schema) => {
                        registry
                            .register(schema)
                            .map_err(|e| ModelError::malformed(&origin, e.to_string()))?;
                        loaded.push(def.name);
                        progressed = true;
                    }
                    Err(BuildFailure::Invalid(reason)) => {
                        return Err(ModelError::malformed(&origin, format!("{}: {}", def.name, reason)));
                    }
                    Err(BuildFailure::Unresolved(name)) => {
                        last_unresolved = Some((origin.clone(), def.name.clone(), name));
                        blocked.push((origin, def));
                    }
                }
            }

            if !progressed {
                if let Some((origin, model, name)) = last_unresolved {
                    return Err(ModelError::malformed(
                        origin,
                        format!("{}: unresolved type reference {:?}", model, name),
                    ));
                }
            }
            pending = blocked;
        }

        let count = loaded.len().to_string();
        log_event_with_fields(
            Event::SchemasLoaded,
            &[("dir", dir.as_str()), ("count", count.as_str())],
        );
        Ok(loaded)
    }

    /// `*.json` files in name order
    fn definition_files(&self) -> ModelResult<Vec<PathBuf>> {
        let dir = self.schema_dir.display().to_string();
        let entries = fs::read_dir(&self.schema_dir)
            .map_err(|e| ModelError::malformed(&dir, format!("Failed to read schema directory: {}", e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| ModelError::malformed(&dir, format!("Failed to read directory entry: {}", e)))?
                .path();
            if path.extension().map_or(false, |ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn read_document(path: &Path) -> ModelResult<Vec<Definition>> {
    let origin = path.display().to_string();
    let content = fs::read_to_string(path)
        .map_err(|e| ModelError::malformed(&origin, format!("Failed to read file: {}", e)))?;
    let document: Document = serde_json::from_str(&content)
        .map_err(|e| ModelError::malformed(&origin, format!("Invalid definition: {}", e)))?;
    Ok(match document {
        Document::Many(all) => all,
        Document::One(one) => vec![one],
    })
}

fn build_enum(def: EnumDefinition) -> EnumType {
    let mut ty = EnumType::new(def.name);
    match def.variants {
        Variants::Valued(members) => {
            for (name, value) in &members {
                ty = ty.member(name.as_str(), Value::from_json(value));
            }
        }
        Variants::Named(names) => {
            for name in names {
                ty = ty.member(name.as_str(), name.as_str());
            }
        }
    }
    ty
}

fn build_model(def: &ModelDefinition, registry: &SchemaRegistry) -> Result<Arc<RecordSchema>, BuildFailure> {
    let mut config = def.config.clone().unwrap_or_default();
    if config.description.is_none() {
        config.description = def.description.clone();
    }

    let mut builder = SchemaBuilder::new(def.name.as_str()).config(config);
    for parent in &def.parents {
        let schema = registry
            .get(parent)
            .ok_or_else(|| BuildFailure::Unresolved(parent.clone()))?;
        builder = builder.extends(&schema);
    }

    for (name, field) in &def.fields {
        let ty = field_type(field, registry)?;
        builder = builder.field(name.as_str(), (ty, field_options(field)));
    }

    builder.build().map_err(|e| BuildFailure::Invalid(e.to_string()))
}

fn field_type(field: &FieldDefinition, registry: &SchemaRegistry) -> Result<TypeExpr, BuildFailure> {
    let Some(source) = &field.type_expr else {
        return Ok(TypeExpr::any());
    };
    parse_type_expr(source, registry).map_err(|e| match e {
        ParseError::Unresolved(name) => BuildFailure::Unresolved(name),
        other => BuildFailure::Invalid(other.to_string()),
    })
}

fn field_options(field: &FieldDefinition) -> FieldOptions {
    let mut options = FieldOptions::new();
    if let Some(default) = &field.default {
        options = options.default(Value::from_json(default));
    }
    if field.required {
        options = options.required();
    }
    if let Some(nullable) = field.nullable {
        options = options.nullable(nullable);
    }
    if field.primary_key {
        options = options.primary_key();
    }
    if let Some(repr) = field.repr {
        options = options.repr(repr);
    }
    if field.readonly {
        options = options.readonly();
    }
    if let Some(alias) = &field.alias {
        options = options.alias(alias.as_str());
    }
    if field.db_default {
        options = options.db_default();
    }

    let bounds: [(&Option<serde_json::Value>, fn(FieldOptions, Value) -> FieldOptions); 8] = [
        (&field.min, FieldOptions::min),
        (&field.max, FieldOptions::max),
        (&field.ge, FieldOptions::ge),
        (&field.le, FieldOptions::le),
        (&field.gt, FieldOptions::gt),
        (&field.lt, FieldOptions::lt),
        (&field.eq, FieldOptions::eq),
        (&field.ne, FieldOptions::ne),
    ];
    for (bound, set) in bounds {
        if let Some(bound) = bound {
            options = set(options, Value::from_json(bound));
        }
    }

    if let Some(length) = field.length {
        options = options.length(length);
    }
    if let Some(pattern) = &field.pattern {
        options = options.pattern(pattern.as_str());
    }
    if let Some(fk) = &field.fk {
        let mut reference = ForeignRef::new(fk.schema.as_str(), fk.key.as_str());
        if let Some(label) = &fk.label {
            reference = reference.with_label(label.as_str());
        }
        options = options.foreign_ref(reference);
    }
    for (key, value) in &field.metadata {
        options = options.meta(key.as_str(), value.clone());
    }
    options
}
