//! Schema Inheritance Tests
//!
//! Field tables of derived record types:
//! - Parents merge in declaration order
//! - The first declaring ancestor owns a conflicting field
//! - Child fields override in place or append
//! - Configuration and hooks are inherited
//! - Published schemas are immutable; only permissive types gain fields

use std::sync::Arc;

use datamodel::errors::ErrorCode;
use datamodel::field::FieldOrigin;
use datamodel::record::construct;
use datamodel::schema::{ModelConfig, RecordSchema, SchemaBuilder, SchemaRegistry};
use datamodel::{FieldOptions, TypeExpr, Value, ValueMap};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn timestamped() -> Arc<RecordSchema> {
    SchemaBuilder::new("Timestamped")
        .field("created", (TypeExpr::str(), Value::from("now")))
        .field("version", (TypeExpr::int(), Value::Int(1)))
        .build()
        .unwrap()
}

fn owned() -> Arc<RecordSchema> {
    SchemaBuilder::new("Owned")
        .field("owner", TypeExpr::str())
        .field("version", (TypeExpr::str(), Value::from("v1")))
        .build()
        .unwrap()
}

fn input(value: serde_json::Value) -> ValueMap {
    match Value::from_json(&value) {
        Value::Map(map) => map,
        other => panic!("expected an object, got {}", other),
    }
}

// =============================================================================
// Merge Tests
// =============================================================================

/// The first parent that declares a field owns it.
#[test]
fn test_multiple_parents_first_declaring_wins() {
    let doc = SchemaBuilder::new("Document")
        .extends(&timestamped())
        .extends(&owned())
        .field("title", TypeExpr::str())
        .build()
        .unwrap();

    let names: Vec<_> = doc.field_table().keys().cloned().collect();
    assert_eq!(names, vec!["created", "version", "owner", "title"]);

    let version = doc.field("version").unwrap();
    assert_eq!(version.declared_type, TypeExpr::int());
    assert_eq!(
        version.origin,
        FieldOrigin::Inherited {
            ancestor: "Timestamped".to_string()
        }
    );
    assert_eq!(doc.ancestors(), ["Timestamped".to_string(), "Owned".to_string()]);
}

/// In a diamond, an override on the second parent beats the shared base.
#[test]
fn test_diamond_follows_resolution_order() {
    let base = SchemaBuilder::new("Base")
        .field("x", TypeExpr::int())
        .field("label", (TypeExpr::str(), Value::from("base")))
        .build()
        .unwrap();
    let a = SchemaBuilder::new("A").extends(&base).build().unwrap();
    let b = SchemaBuilder::new("B")
        .extends(&base)
        .field("x", TypeExpr::str())
        .build()
        .unwrap();
    let c = SchemaBuilder::new("C").extends(&a).extends(&b).build().unwrap();

    assert_eq!(c.ancestors(), ["A".to_string(), "B".to_string(), "Base".to_string()]);
    let x = c.field("x").unwrap();
    assert_eq!(x.declared_type, TypeExpr::str());
    assert_eq!(x.origin, FieldOrigin::Inherited { ancestor: "B".to_string() });
    assert_eq!(
        c.field("label").unwrap().origin,
        FieldOrigin::Inherited { ancestor: "Base".to_string() }
    );

    let record = construct(&c, input(json!({"x": 5}))).unwrap();
    assert_eq!(record.get("x"), Some(&Value::from("5")));
}

/// Parents that admit no consistent order are rejected.
#[test]
fn test_inconsistent_parent_order_rejected() {
    let base = timestamped();
    let child = SchemaBuilder::new("Child").extends(&base).build().unwrap();
    let err = SchemaBuilder::new("Bad")
        .extends(&base)
        .extends(&child)
        .build()
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigInvalid);
}

/// A child redeclaration replaces the inherited field in place.
#[test]
fn test_child_override_keeps_position() {
    let doc = SchemaBuilder::new("Document")
        .extends(&timestamped())
        .field("created", (TypeExpr::str(), FieldOptions::new().required()))
        .build()
        .unwrap();

    let names: Vec<_> = doc.field_table().keys().cloned().collect();
    assert_eq!(names, vec!["created", "version"]);
    assert!(doc.field("created").unwrap().required);
    assert_eq!(doc.field("created").unwrap().origin, FieldOrigin::Declared);

    let err = construct(&doc, input(json!({}))).unwrap_err();
    assert!(err.payload().unwrap().contains_key("created"));
}

/// Instances of a derived type coerce inherited fields.
#[test]
fn test_inherited_fields_are_coerced() {
    let doc = SchemaBuilder::new("Document")
        .extends(&timestamped())
        .field("title", TypeExpr::str())
        .build()
        .unwrap();
    let d = construct(&doc, input(json!({"version": "3", "title": "t"}))).unwrap();
    assert_eq!(d.get("version"), Some(&Value::Int(3)));
    assert_eq!(d.get("created"), Some(&Value::from("now")));
}

/// Configuration and the post-init hook come from the first parent.
#[test]
fn test_config_and_hook_inherited() {
    let base = SchemaBuilder::new("Base")
        .config(ModelConfig::permissive())
        .field("name", TypeExpr::str())
        .field("slug", TypeExpr::str())
        .post_init(|record| {
            let slug = record.get("name").map(|n| n.to_string().to_lowercase());
            record.set_field("slug", Value::from(slug))
        })
        .build()
        .unwrap();
    let child = SchemaBuilder::new("Child").extends(&base).build().unwrap();

    assert!(!child.is_strict());
    let c = construct(&child, input(json!({"name": "Hello", "other": 1}))).unwrap();
    assert_eq!(c.get("slug"), Some(&Value::from("hello")));
    assert_eq!(c.get("other"), Some(&Value::Int(1)));
}

// =============================================================================
// Registry Tests
// =============================================================================

/// Published names cannot be replaced.
#[test]
fn test_registry_rejects_republication() {
    let mut registry = SchemaRegistry::new();
    registry.register(timestamped()).unwrap();
    let err = registry.register(timestamped()).unwrap_err();
    assert_eq!(err.code(), ErrorCode::SchemaImmutable);
}

/// Adding a field publishes a new version; existing instances keep theirs.
#[test]
fn test_add_field_to_permissive_type() {
    let mut registry = SchemaRegistry::new();
    let schema = SchemaBuilder::new("Note")
        .config(ModelConfig::permissive())
        .field("text", TypeExpr::str())
        .build()
        .unwrap();
    registry.register(schema).unwrap();

    let before = registry.construct("Note", input(json!({"text": "a"}))).unwrap();
    registry
        .add_field("Note", "pinned", (TypeExpr::bool(), Value::Bool(false)))
        .unwrap();
    let after = registry.construct("Note", input(json!({"text": "b"}))).unwrap();

    assert!(!before.contains("pinned"));
    assert_eq!(after.get("pinned"), Some(&Value::Bool(false)));
}

/// Strict types never gain fields.
#[test]
fn test_add_field_to_strict_type_fails() {
    let mut registry = SchemaRegistry::new();
    registry.register(timestamped()).unwrap();
    let err = registry
        .add_field("Timestamped", "extra", TypeExpr::int())
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::ConfigInvalid);
    assert!(err.is_fatal());
}
