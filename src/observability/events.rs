//! Observable events of schema building and record lifecycle
//!
//! Events are explicit and typed.

use std::fmt;

use super::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Schemas
    /// Field table of a record type assembled
    SchemaBuilt,
    /// Schema published in a registry
    SchemaRegistered,
    /// Schema definitions read from a directory
    SchemasLoaded,
    /// Field appended to a published schema
    SchemaFieldAdded,

    // Records
    /// Record constructed and validated
    RecordConstructed,
    /// Permissive record carries errors
    RecordInvalid,
    /// Strict construction failed with an aggregate error
    RecordRejected,
    /// Undeclared input key stored as a dynamic field
    DynamicFieldCreated,

    // Assignment
    /// Write to a frozen record refused
    FrozenWriteRejected,
    /// Assignment failed coercion or validation
    AssignmentRejected,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::SchemaBuilt => "SCHEMA_BUILT",
            Event::SchemaRegistered => "SCHEMA_REGISTERED",
            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::SchemaFieldAdded => "SCHEMA_FIELD_ADDED",
            Event::RecordConstructed => "RECORD_CONSTRUCTED",
            Event::RecordInvalid => "RECORD_INVALID",
            Event::RecordRejected => "RECORD_REJECTED",
            Event::DynamicFieldCreated => "DYNAMIC_FIELD_CREATED",
            Event::FrozenWriteRejected => "FROZEN_WRITE_REJECTED",
            Event::AssignmentRejected => "ASSIGNMENT_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RecordConstructed | Event::DynamicFieldCreated => Severity::Trace,
            Event::SchemaBuilt
            | Event::SchemaRegistered
            | Event::SchemasLoaded
            | Event::SchemaFieldAdded => Severity::Info,
            Event::RecordInvalid
            | Event::RecordRejected
            | Event::FrozenWriteRejected
            | Event::AssignmentRejected => Severity::Warn,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
