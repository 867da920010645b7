//! Record type declaration
//!
//! A record type is declared once through [`SchemaBuilder`] (or loaded from
//! definition documents by [`SchemaLoader`]) and published as an immutable
//! [`RecordSchema`] shared behind an `Arc`.
//!
//! # Design Principles
//!
//! - Two-phase declaration: declare, then freeze
//! - Declaration order is significant
//! - Inheritance is explicit composition of parent field tables
//! - Declaration mistakes are fatal at build time
//! - Published schemas are never mutated

mod aliases;
mod builder;
mod config;
mod loader;
mod merge;
mod registry;
mod types;

pub use aliases::{to_pascalcase, to_snakecase};
pub use builder::SchemaBuilder;
pub use config::{AliasFunction, ExtraPolicy, ModelConfig};
pub use loader::SchemaLoader;
pub use merge::{merge_ancestors, merge_fields};
pub use registry::SchemaRegistry;
pub use types::{FieldTable, KeyResolution, PostInitHook, RecordSchema};
