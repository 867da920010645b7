//! Constraint validation of coerced values
//!
//! Validation runs after coercion and never raises. Every failing check of
//! a field is merged into one [`ErrorDetail`](crate::errors::ErrorDetail);
//! the only short-circuit is a missing required value.

mod validator;

pub use validator::{validate, PrimaryKeyPolicy, ValidationPolicy};
