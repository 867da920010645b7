//! Error types for the record engine
//!
//! Error codes:
//! - DM_CONFIG_INVALID (FATAL)
//! - DM_COERCION_FAILED (REJECT)
//! - DM_VALIDATION_FAILED (REJECT)
//! - DM_FIELD_REJECTED (REJECT)
//! - DM_FROZEN_WRITE (REJECT)
//! - DM_READONLY_FIELD (REJECT)
//! - DM_UNKNOWN_FIELD (REJECT)
//! - DM_MISSING_FIELD (REJECT)
//! - DM_UNKNOWN_SCHEMA (REJECT)
//! - DM_SCHEMA_IMMUTABLE (REJECT)
//! - DM_MALFORMED_SCHEMA (FATAL)
//!
//! Field-level problems never abort a construction on their own. They are
//! collected as [`ErrorDetail`]s and only surface as an [`AggregateError`]
//! when the record type is strict.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::value::Value;

/// Severity levels for model errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The offending input is rejected, the process carries on
    Reject,
    /// A declaration is unusable; the record type cannot be built
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Field declaration is structurally invalid for its type
    ConfigInvalid,
    /// Raw input could not be converted to the declared type
    CoercionFailed,
    /// One or more fields failed during a strict construction
    ValidationFailed,
    /// A single-field assignment was rejected
    FieldRejected,
    /// Write attempted on a frozen record
    FrozenWrite,
    /// Write attempted on a read-only field
    ReadOnlyField,
    /// Input named a field the record type does not declare
    UnknownField,
    /// Lookup of a field that has no value
    MissingField,
    /// Record type name is not registered
    UnknownSchema,
    /// Attempt to replace a published record type
    SchemaImmutable,
    /// Schema definition document cannot be used
    MalformedSchema,
}

impl ErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalid => "DM_CONFIG_INVALID",
            ErrorCode::CoercionFailed => "DM_COERCION_FAILED",
            ErrorCode::ValidationFailed => "DM_VALIDATION_FAILED",
            ErrorCode::FieldRejected => "DM_FIELD_REJECTED",
            ErrorCode::FrozenWrite => "DM_FROZEN_WRITE",
            ErrorCode::ReadOnlyField => "DM_READONLY_FIELD",
            ErrorCode::UnknownField => "DM_UNKNOWN_FIELD",
            ErrorCode::MissingField => "DM_MISSING_FIELD",
            ErrorCode::UnknownSchema => "DM_UNKNOWN_SCHEMA",
            ErrorCode::SchemaImmutable => "DM_SCHEMA_IMMUTABLE",
            ErrorCode::MalformedSchema => "DM_MALFORMED_SCHEMA",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ErrorCode::ConfigInvalid | ErrorCode::MalformedSchema => Severity::Fatal,
            _ => Severity::Reject,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Everything known about one failing field.
///
/// All failing checks for a field are merged into a single detail, in the
/// order they were evaluated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    /// Field name (internal, post-alias)
    pub field: String,
    /// The offending value
    pub value: Value,
    /// One message per failing check
    pub messages: Vec<String>,
    /// Runtime type of the offending value
    pub value_type: String,
    /// Declared type of the field
    pub declared_type: String,
}

impl ErrorDetail {
    pub fn new(
        field: impl Into<String>,
        value: Value,
        message: impl Into<String>,
        declared_type: impl Into<String>,
    ) -> Self {
        let value_type = value.type_name().to_string();
        Self {
            field: field.into(),
            value,
            messages: vec![message.into()],
            value_type,
            declared_type: declared_type.into(),
        }
    }

    /// All messages joined into one line
    pub fn error_message(&self) -> String {
        self.messages.join("; ")
    }

    /// Appends another failing check for the same field
    pub fn push(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "field '{}': {} (declared {}, got {})",
            self.field,
            self.error_message(),
            self.declared_type,
            self.value_type
        )
    }
}

/// A raw value that could not be converted to its declared type.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot coerce field '{field}' to {expected}: {message} (got {got})")]
pub struct CoercionError {
    /// Field being coerced
    pub field: String,
    /// Declared type, rendered
    pub expected: String,
    /// Runtime type of the raw value
    pub got: String,
    /// Why conversion failed
    pub message: String,
}

impl CoercionError {
    pub fn new(
        field: impl Into<String>,
        expected: impl Into<String>,
        got: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            expected: expected.into(),
            got: got.into(),
            message: message.into(),
        }
    }

    /// Converts into a field error detail carrying the raw value
    pub fn into_detail(self, value: Value) -> ErrorDetail {
        ErrorDetail {
            field: self.field,
            value,
            messages: vec![self.message],
            value_type: self.got,
            declared_type: self.expected,
        }
    }
}

/// Every field error of one construction attempt.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{type_name}: There are errors in Model. Hint: please check the \"payload\" attribute in the exception. ({} field(s) failed)", .payload.len())]
pub struct AggregateError {
    /// Record type that failed to build
    pub type_name: String,
    /// Field name to error detail, in declaration order
    pub payload: IndexMap<String, ErrorDetail>,
}

impl AggregateError {
    /// Returns the detail for a field, if it failed
    pub fn field(&self, name: &str) -> Option<&ErrorDetail> {
        self.payload.get(name)
    }

    /// Renders the payload as JSON for display to callers
    pub fn payload_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.payload).unwrap_or(serde_json::Value::Null)
    }
}

/// Crate error type
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// Field declaration is invalid for its declared type
    #[error("invalid declaration of {type_name}.{field}: {reason}")]
    Config {
        type_name: String,
        field: String,
        reason: String,
    },

    /// Direct coercion failure
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    /// Strict construction failed on one or more fields
    #[error(transparent)]
    Validation(#[from] AggregateError),

    /// Single-field assignment failed coercion or validation
    #[error("{0}")]
    Field(Box<ErrorDetail>),

    /// Write to a frozen record
    #[error("cannot assign {field:?} on {type_name}: the record is frozen")]
    FrozenWrite { type_name: String, field: String },

    /// Write to a read-only field
    #[error("cannot assign {field:?} on {type_name}: the field is read-only")]
    ReadOnly { type_name: String, field: String },

    /// Input named an undeclared field
    #[error("{type_name} got an unexpected field {field:?}")]
    UnknownField { type_name: String, field: String },

    /// Lookup of a field that holds nothing
    #[error("{type_name} has no attribute {field:?}")]
    MissingField { type_name: String, field: String },

    /// Record type name not registered
    #[error("record type {0:?} is not registered")]
    UnknownSchema(String),

    /// Record type name already registered
    #[error("record type {0:?} is already registered and is immutable")]
    SchemaImmutable(String),

    /// Definition document cannot be used
    #[error("malformed schema definition {origin:?}: {reason}")]
    MalformedSchema { origin: String, reason: String },
}

impl ModelError {
    pub fn config(
        type_name: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            type_name: type_name.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    pub fn missing_field(type_name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            type_name: type_name.into(),
            field: field.into(),
        }
    }

    pub fn malformed(origin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedSchema {
            origin: origin.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            ModelError::Config { .. } => ErrorCode::ConfigInvalid,
            ModelError::Coercion(_) => ErrorCode::CoercionFailed,
            ModelError::Validation(_) => ErrorCode::ValidationFailed,
            ModelError::Field(_) => ErrorCode::FieldRejected,
            ModelError::FrozenWrite { .. } => ErrorCode::FrozenWrite,
            ModelError::ReadOnly { .. } => ErrorCode::ReadOnlyField,
            ModelError::UnknownField { .. } => ErrorCode::UnknownField,
            ModelError::MissingField { .. } => ErrorCode::MissingField,
            ModelError::UnknownSchema(_) => ErrorCode::UnknownSchema,
            ModelError::SchemaImmutable(_) => ErrorCode::SchemaImmutable,
            ModelError::MalformedSchema { .. } => ErrorCode::MalformedSchema,
        }
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code().severity()
    }

    /// Returns whether this is a fatal error
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Returns the aggregate payload of a failed strict construction
    pub fn payload(&self) -> Option<&IndexMap<String, ErrorDetail>> {
        match self {
            ModelError::Validation(agg) => Some(&agg.payload),
            _ => None,
        }
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;
