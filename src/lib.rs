//! datamodel - Self-describing, validated data records
//!
//! Record types are declared once and frozen into schemas. Instances coerce
//! raw input into declared types, validate constraints, and report every
//! field error at once.

pub mod coerce;
pub mod errors;
pub mod field;
pub mod observability;
pub mod record;
pub mod schema;
pub mod types;
pub mod validate;
pub mod value;

pub use errors::{AggregateError, ErrorDetail, ModelError, ModelResult};
pub use field::{FieldDescriptor, FieldOptions};
pub use record::RecordInstance;
pub use schema::{ModelConfig, RecordSchema, SchemaBuilder, SchemaRegistry};
pub use types::TypeExpr;
pub use value::{Value, ValueMap};
