//! Record Construction Tests
//!
//! End-to-end behavior of declaring a record type and building instances:
//! - Coercion of every field into its declared type
//! - Aggregate errors list every failing field
//! - Aliases are the only accepted external key once declared
//! - Nested records are built from mappings and pass through when prebuilt
//! - Permissive records keep undeclared keys on the instance
//! - Frozen records reject writes

use std::sync::Arc;
use std::thread;

use datamodel::coerce::to_boolean;
use datamodel::errors::ErrorCode;
use datamodel::field::ForeignRef;
use datamodel::record::{self, construct, from_json, set_field, to_plain_map};
use datamodel::schema::{ModelConfig, RecordSchema, SchemaBuilder};
use datamodel::{FieldOptions, TypeExpr, Value, ValueMap};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn user_schema() -> Arc<RecordSchema> {
    SchemaBuilder::new("User")
        .field("id", TypeExpr::int())
        .field("name", (TypeExpr::str(), Value::from("John Doe")))
        .field(
            "friends",
            (TypeExpr::list(TypeExpr::int()), FieldOptions::new().default_factory(|| Value::List(vec![]))),
        )
        .build()
        .unwrap()
}

fn address_schema() -> Arc<RecordSchema> {
    SchemaBuilder::new("Address")
        .field("street", TypeExpr::str())
        .field("zipcode", TypeExpr::int())
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
// End-to-End Tests
// =============================================================================

/// Every field is coerced to its declared type and defaults fill the gaps.
#[test]
fn test_user_end_to_end() {
    let schema = user_schema();
    let user = from_json(&schema, &json!({"id": "123", "friends": [1, "2", 3]})).unwrap();

    assert_eq!(user.get("id"), Some(&Value::Int(123)));
    assert_eq!(user.get("name"), Some(&Value::from("John Doe")));
    assert_eq!(user.get("friends"), Some(&Value::list([1, 2, 3])));
    assert!(user.is_valid());
    assert_eq!(user.to_string(), "User(id=123, name=\"John Doe\", friends=[1, 2, 3])");
}

/// Factory defaults are produced per instance.
#[test]
fn test_default_factory_not_shared() {
    let schema = user_schema();
    let mut a = construct(&schema, input(json!({"id": 1}))).unwrap();
    let b = construct(&schema, input(json!({"id": 2}))).unwrap();

    set_field(&mut a, "friends", Value::list([7])).unwrap();
    assert_eq!(a.get("friends"), Some(&Value::list([7])));
    assert_eq!(b.get("friends"), Some(&Value::List(vec![])));
}

/// The field table is readable by collaborators in declaration order.
#[test]
fn test_field_table_is_ordered() {
    let schema = user_schema();
    let names: Vec<_> = record::get_field_table(&schema).keys().cloned().collect();
    assert_eq!(names, vec!["id", "name", "friends"]);
}

// =============================================================================
// Aggregate Error Tests
// =============================================================================

/// N invalid fields produce N entries in the aggregate payload.
#[test]
fn test_aggregate_error_is_complete() {
    let schema = SchemaBuilder::new("Measure")
        .field("a", TypeExpr::int())
        .field("b", TypeExpr::float())
        .field("c", (TypeExpr::str(), FieldOptions::new().required()))
        .field("d", (TypeExpr::int(), FieldOptions::new().ge(10)))
        .build()
        .unwrap();

    let err = construct(&schema, input(json!({"a": "x", "b": "y", "d": 3}))).unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    assert!(err.to_string().starts_with("Measure: There are errors in Model."));

    let payload = err.payload().unwrap();
    let failed: Vec<_> = payload.keys().cloned().collect();
    assert_eq!(failed, vec!["a", "b", "c", "d"]);
    assert_eq!(payload["c"].messages, vec!["Missing Required Field *c*".to_string()]);
    assert_eq!(payload["a"].value, Value::from("x"));
}

/// The payload renders as JSON for display to callers.
#[test]
fn test_aggregate_payload_json() {
    let schema = SchemaBuilder::new("T").field("n", TypeExpr::int()).build().unwrap();
    let err = construct(&schema, input(json!({"n": "abc"}))).unwrap_err();
    let datamodel::ModelError::Validation(aggregate) = err else {
        panic!("expected an aggregate error");
    };
    let payload = aggregate.payload_json();
    assert_eq!(payload["n"]["value"], json!("abc"));
    assert_eq!(payload["n"]["value_type"], json!("str"));
    assert_eq!(payload["n"]["declared_type"], json!("int"));
}

/// Permissive records are usable and carry their errors.
#[test]
fn test_permissive_record_is_invalid_but_usable() {
    let schema = SchemaBuilder::new("T")
        .config(ModelConfig::permissive())
        .field("n", TypeExpr::int())
        .field("s", TypeExpr::str())
        .build()
        .unwrap();
    let t = construct(&schema, input(json!({"n": "abc", "s": 5}))).unwrap();
    assert!(!t.is_valid());
    assert_eq!(t.errors().len(), 1);
    assert_eq!(t.get("s"), Some(&Value::from("5")));
}

// =============================================================================
// Alias Tests
// =============================================================================

/// The alias is accepted; the internal name is rejected in strict mode.
#[test]
fn test_alias_round_trip() {
    let schema = SchemaBuilder::new("Contact")
        .field("email_address", (TypeExpr::str(), FieldOptions::new().alias("emailAddress")))
        .build()
        .unwrap();

    let contact = construct(&schema, input(json!({"emailAddress": "x"}))).unwrap();
    assert_eq!(contact.get("email_address"), Some(&Value::from("x")));

    let err = construct(&schema, input(json!({"email_address": "x"}))).unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnknownField);
}

// =============================================================================
// Nested Record Tests
// =============================================================================

/// Mappings become nested records; prebuilt records pass through.
#[test]
fn test_nested_record_coercion() {
    let address = address_schema();
    let person = SchemaBuilder::new("Person")
        .field("address", TypeExpr::record(&address))
        .build()
        .unwrap();

    let p = construct(&person, input(json!({"address": {"street": "Main", "zipcode": 1}}))).unwrap();
    let nested = p.get("address").and_then(Value::as_record).unwrap();
    assert_eq!(nested.type_name(), "Address");
    assert_eq!(nested.get("street"), Some(&Value::from("Main")));
    assert_eq!(nested.get("zipcode"), Some(&Value::Int(1)));

    let prebuilt = construct(&address, input(json!({"street": "Elm", "zipcode": "2"}))).unwrap();
    let mut with_record = ValueMap::new();
    with_record.insert("address".to_string(), Value::from(prebuilt.clone()));
    let p = construct(&person, with_record).unwrap();
    assert_eq!(p.get("address").and_then(Value::as_record), Some(&prebuilt));

    let plain = to_plain_map(&p, false);
    assert_eq!(plain["address"], Value::map([("street", Value::from("Elm")), ("zipcode", Value::Int(2))]));
}

/// Nested failures are reported against the outer field.
#[test]
fn test_nested_record_failure() {
    let address = address_schema();
    let person = SchemaBuilder::new("Person")
        .field("address", TypeExpr::record(&address))
        .build()
        .unwrap();

    let err = construct(&person, input(json!({"address": {"street": "Main", "zipcode": "north"}}))).unwrap_err();
    let detail = &err.payload().unwrap()["address"];
    assert!(detail.error_message().contains("invalid Address"));
    assert!(detail.error_message().contains("zipcode"));
}

/// An instance of a derived type is accepted where its ancestor is declared.
#[test]
fn test_subtype_instance_passes_through() {
    let animal = SchemaBuilder::new("Animal").field("name", TypeExpr::str()).build().unwrap();
    let dog = SchemaBuilder::new("Dog")
        .extends(&animal)
        .field("breed", TypeExpr::str())
        .build()
        .unwrap();
    let zoo = SchemaBuilder::new("Zoo")
        .field("star", TypeExpr::record(&animal))
        .build()
        .unwrap();

    let rex = construct(&dog, input(json!({"name": "Rex", "breed": "Corgi"}))).unwrap();
    let mut star = ValueMap::new();
    star.insert("star".to_string(), Value::from(rex));
    let z = construct(&zoo, star).unwrap();
    assert_eq!(z.get("star").and_then(Value::as_record).map(|r| r.type_name()), Some("Dog"));
}

/// Foreign references store ids unless hydration is requested.
#[test]
fn test_foreign_reference_ids() {
    let author = SchemaBuilder::new("Author")
        .field("id", (TypeExpr::int(), FieldOptions::new().primary_key()))
        .field("name", TypeExpr::str())
        .build()
        .unwrap();
    let post = SchemaBuilder::new("Post")
        .field(
            "author",
            (TypeExpr::record(&author), FieldOptions::new().foreign_ref(ForeignRef::new("Author", "id"))),
        )
        .build()
        .unwrap();

    let p = construct(&post, input(json!({"author": 7}))).unwrap();
    assert_eq!(p.get("author"), Some(&Value::Int(7)));
    let p = construct(&post, input(json!({"author": {"id": 8, "name": "Ann"}}))).unwrap();
    assert_eq!(p.get("author"), Some(&Value::Int(8)));

    let hydrating = SchemaBuilder::new("HydratedPost")
        .extends(&post)
        .config(ModelConfig {
            as_objects: true,
            ..ModelConfig::default()
        })
        .build()
        .unwrap();
    let p = construct(&hydrating, input(json!({"author": {"id": 8, "name": "Ann"}}))).unwrap();
    assert_eq!(p.get("author").and_then(Value::as_record).map(|r| r.type_name()), Some("Author"));
}

// =============================================================================
// Coercion Rule Tests
// =============================================================================

/// Canonical truthy and falsy strings; anything else is an error.
#[test]
fn test_boolean_canonicalization() {
    assert_eq!(to_boolean(&Value::from("YES")), Ok(true));
    assert_eq!(to_boolean(&Value::from("0")), Ok(false));
    assert!(to_boolean(&Value::from("maybe")).is_err());
}

/// An exact match wins over a coercible earlier alternative.
#[test]
fn test_union_prefers_exact_match() {
    let schema = SchemaBuilder::new("T")
        .field("v", TypeExpr::union(vec![TypeExpr::int(), TypeExpr::str()]))
        .build()
        .unwrap();
    let t = construct(&schema, input(json!({"v": "42"}))).unwrap();
    assert_eq!(t.get("v"), Some(&Value::from("42")));

    let t = construct(&schema, input(json!({"v": 4.0}))).unwrap();
    assert_eq!(t.get("v"), Some(&Value::Int(4)));
}

/// A zero-argument callable is invoked unless the field is itself callable.
#[test]
fn test_deferred_values_are_invoked() {
    let schema = SchemaBuilder::new("Job")
        .field("attempts", TypeExpr::int())
        .field("task", (TypeExpr::callable(), FieldOptions::new().required()))
        .build()
        .unwrap();

    let mut job = ValueMap::new();
    job.insert("attempts".to_string(), Value::callable(|| Value::from("3")));
    job.insert("task".to_string(), Value::callable(|| Value::Null));
    let job = construct(&schema, job).unwrap();

    assert_eq!(job.get("attempts"), Some(&Value::Int(3)));
    assert!(job.get("task").unwrap().is_callable());
}

// =============================================================================
// Dynamic Field Tests
// =============================================================================

/// Undeclared keys become instance-only fields in permissive mode.
#[test]
fn test_permissive_dynamic_field() {
    let schema = SchemaBuilder::new("Loose")
        .config(ModelConfig::permissive())
        .field("id", TypeExpr::int())
        .build()
        .unwrap();

    let loose = construct(&schema, input(json!({"id": 1, "extra": "z"}))).unwrap();
    assert_eq!(loose.get("extra"), Some(&Value::from("z")));
    assert_eq!(to_plain_map(&loose, false)["extra"], Value::from("z"));
    assert!(schema.field("extra").is_none());
    assert_eq!(loose.field_names().collect::<Vec<_>>(), vec!["id", "extra"]);
}

// =============================================================================
// Frozen Record Tests
// =============================================================================

/// Writes to a frozen record fail and leave the value intact.
#[test]
fn test_frozen_immutability() {
    let schema = SchemaBuilder::new("Point")
        .frozen(true)
        .field("x", TypeExpr::int())
        .build()
        .unwrap();
    let mut p = construct(&schema, input(json!({"x": 1}))).unwrap();

    let err = set_field(&mut p, "x", 5).unwrap_err();
    assert_eq!(err.code(), ErrorCode::FrozenWrite);
    assert_eq!(p.get("x"), Some(&Value::Int(1)));
    assert_eq!(record::old_value(&p, "x").unwrap(), Value::Int(1));
}

// =============================================================================
// Concurrency Tests
// =============================================================================

/// One schema is shared read-only across threads building instances.
#[test]
fn test_schema_shared_across_threads() {
    let schema = user_schema();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let schema = Arc::clone(&schema);
            thread::spawn(move || {
                let user = construct(&schema, input(json!({"id": i.to_string()}))).unwrap();
                user.get("id").cloned()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(Value::Int(i as i64)));
    }
}
