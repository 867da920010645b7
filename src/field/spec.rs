//! Accepted shapes of a field declaration

use super::descriptor::{FieldDescriptor, FieldOptions};
use crate::types::TypeExpr;
use crate::value::{Producer, Value};

/// One of the five legal ways to declare a field
#[derive(Debug, Clone)]
pub enum FieldSpec {
    /// Type only
    Bare(TypeExpr),
    /// Type and default value
    WithDefault(TypeExpr, Value),
    /// Type and default factory
    WithFactory(TypeExpr, Producer),
    /// Type and full option set
    Full(TypeExpr, FieldOptions),
    /// A descriptor built elsewhere
    Built(FieldDescriptor),
}

impl FieldSpec {
    /// Declared type of the spec
    pub fn declared_type(&self) -> &TypeExpr {
        match self {
            FieldSpec::Bare(ty)
            | FieldSpec::WithDefault(ty, _)
            | FieldSpec::WithFactory(ty, _)
            | FieldSpec::Full(ty, _) => ty,
            FieldSpec::Built(field) => &field.declared_type,
        }
    }
}

impl From<TypeExpr> for FieldSpec {
    fn from(ty: TypeExpr) -> Self {
        FieldSpec::Bare(ty)
    }
}

impl From<(TypeExpr, Value)> for FieldSpec {
    fn from((ty, default): (TypeExpr, Value)) -> Self {
        FieldSpec::WithDefault(ty, default)
    }
}

impl From<(TypeExpr, Producer)> for FieldSpec {
    fn from((ty, factory): (TypeExpr, Producer)) -> Self {
        FieldSpec::WithFactory(ty, factory)
    }
}

impl From<(TypeExpr, FieldOptions)> for FieldSpec {
    fn from((ty, options): (TypeExpr, FieldOptions)) -> Self {
        FieldSpec::Full(ty, options)
    }
}

impl From<FieldDescriptor> for FieldSpec {
    fn from(field: FieldDescriptor) -> Self {
        FieldSpec::Built(field)
    }
}
