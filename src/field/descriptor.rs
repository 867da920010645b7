//! Field descriptors and the `FieldOptions` declaration builder

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use super::constraints::{Constraints, Pattern};
use super::spec::FieldSpec;
use crate::types::{TupleShape, TypeExpr};
use crate::value::{Producer, Value};

/// A field declaration that cannot be built
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid field '{field}': {reason}")]
pub struct InvalidSpec {
    pub field: String,
    pub reason: String,
}

impl InvalidSpec {
    fn new(field: &str, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// User check run after the built-in constraints.
///
/// Receives the descriptor (name and declared type) and the coerced value.
/// `Ok(false)` rejects the value; `Err` carries a message.
#[derive(Clone)]
pub struct CustomValidator(Arc<dyn Fn(&FieldDescriptor, &Value) -> Result<bool, String> + Send + Sync>);

impl CustomValidator {
    pub fn new(f: impl Fn(&FieldDescriptor, &Value) -> Result<bool, String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, field: &FieldDescriptor, value: &Value) -> Result<bool, String> {
        (self.0)(field, value)
    }
}

impl fmt::Debug for CustomValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<validator>")
    }
}

/// Replaces built-in coercion for one field
#[derive(Clone)]
pub struct FieldParser(Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>);

impl FieldParser {
    pub fn new(f: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn call(&self, raw: &Value) -> Result<Value, String> {
        (self.0)(raw)
    }
}

impl fmt::Debug for FieldParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<parser>")
    }
}

/// Reference to another record type's key
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignRef {
    /// Name of the referenced record type
    pub schema: String,
    /// Key field on the referenced type
    pub key_field: String,
    /// Field used as display label
    pub label_field: Option<String>,
}

impl ForeignRef {
    pub fn new(schema: impl Into<String>, key_field: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            key_field: key_field.into(),
            label_field: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label_field = Some(label.into());
        self
    }
}

/// Where a field of a merged table came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOrigin {
    /// Declared on the record type itself
    Declared,
    /// Taken from an ancestor
    Inherited { ancestor: String },
    /// Promoted from an undeclared input key on one instance
    Dynamic,
}

/// Metadata for one declared attribute
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared_type: TypeExpr,
    pub default: Option<Value>,
    /// Takes priority over `default`
    pub default_factory: Option<Producer>,
    pub required: bool,
    pub nullable: bool,
    pub primary_key: bool,
    /// Included in `Display` output
    pub repr: bool,
    pub readonly: bool,
    /// External input name; once declared it is the only accepted key
    pub alias: Option<String>,
    /// Value is produced by an external store
    pub db_default: bool,
    pub constraints: Constraints,
    pub validator: Option<CustomValidator>,
    pub foreign_ref: Option<ForeignRef>,
    pub metadata: IndexMap<String, serde_json::Value>,
    pub parser: Option<FieldParser>,
    pub origin: FieldOrigin,
}

impl FieldDescriptor {
    /// A plain descriptor: optional, nullable, no default
    pub fn new(name: impl Into<String>, declared_type: TypeExpr) -> Self {
        Self {
            name: name.into(),
            declared_type,
            default: None,
            default_factory: None,
            required: false,
            nullable: true,
            primary_key: false,
            repr: true,
            readonly: false,
            alias: None,
            db_default: false,
            constraints: Constraints::default(),
            validator: None,
            foreign_ref: None,
            metadata: IndexMap::new(),
            parser: None,
            origin: FieldOrigin::Declared,
        }
    }

    /// Descriptor for an undeclared key, typed by its runtime value
    pub fn dynamic(name: impl Into<String>, value: &Value) -> Self {
        let mut field = Self::new(name, TypeExpr::infer(value));
        field.origin = FieldOrigin::Dynamic;
        field
    }

    /// Normalizes any declaration shape into a descriptor
    pub fn build(name: &str, spec: impl Into<FieldSpec>) -> Result<Self, InvalidSpec> {
        let field = match spec.into() {
            FieldSpec::Bare(ty) => Self::new(name, ty),
            FieldSpec::WithDefault(ty, default) => {
                let mut field = Self::new(name, ty);
                field.default = Some(default);
                field
            }
            FieldSpec::WithFactory(ty, factory) => {
                let mut field = Self::new(name, ty);
                field.default_factory = Some(factory);
                field
            }
            FieldSpec::Full(ty, options) => options.apply(Self::new(name, ty))?,
            FieldSpec::Built(mut field) => {
                field.name = name.to_string();
                field
            }
        };
        field.check()?;
        Ok(field)
    }

    fn check(&self) -> Result<(), InvalidSpec> {
        check_type(&self.name, &self.declared_type)?;
        self.constraints
            .check_applicable(&self.declared_type)
            .map_err(|reason| InvalidSpec::new(&self.name, reason))?;
        if self.alias.as_deref() == Some("") {
            return Err(InvalidSpec::new(&self.name, "alias cannot be empty"));
        }
        Ok(())
    }

    /// Name accepted in constructor input
    pub fn input_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Resolves the value used when input omits the field.
    ///
    /// Factory, then default, then null.
    pub fn default_value(&self) -> Value {
        if let Some(factory) = &self.default_factory {
            return factory.call();
        }
        self.default.clone().unwrap_or(Value::Null)
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.default_factory.is_some()
    }

    /// Whether metadata marks the field as secret
    pub fn is_secret(&self) -> bool {
        self.metadata
            .get("secret")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }
}

fn check_type(field: &str, ty: &TypeExpr) -> Result<(), InvalidSpec> {
    match ty {
        TypeExpr::Union(members) if members.is_empty() => {
            Err(InvalidSpec::new(field, "union must have at least one member"))
        }
        TypeExpr::Union(members) => members.iter().try_for_each(|m| check_type(field, m)),
        TypeExpr::Optional(inner)
        | TypeExpr::List(inner)
        | TypeExpr::Set(inner)
        | TypeExpr::FrozenSet(inner) => check_type(field, inner),
        TypeExpr::Tuple(TupleShape::Fixed(items)) => items.iter().try_for_each(|t| check_type(field, t)),
        TypeExpr::Tuple(TupleShape::Homogeneous(inner)) => check_type(field, inner),
        TypeExpr::Mapping(key, value) => {
            if !matches!(key.strip_optional(), TypeExpr::Scalar(_) | TypeExpr::Any | TypeExpr::Enum(_)) {
                return Err(InvalidSpec::new(
                    field,
                    format!("mapping keys must be scalar, not {}", key.describe()),
                ));
            }
            check_type(field, value)
        }
        TypeExpr::Enum(ty) if ty.members.is_empty() => {
            Err(InvalidSpec::new(field, format!("enum {} has no members", ty.name)))
        }
        _ => Ok(()),
    }
}

/// Field declaration options
///
/// ```ignore
/// FieldOptions::new().required().alias("emailAddress").pattern(r"[^@]+@[^@]+")
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    default: Option<Value>,
    default_factory: Option<Producer>,
    required: bool,
    nullable: Option<bool>,
    primary_key: bool,
    repr: Option<bool>,
    readonly: bool,
    alias: Option<String>,
    db_default: bool,
    constraints: Constraints,
    pattern: Option<String>,
    validator: Option<CustomValidator>,
    foreign_ref: Option<ForeignRef>,
    metadata: IndexMap<String, serde_json::Value>,
    parser: Option<FieldParser>,
}

impl FieldOptions {
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn default_factory(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default_factory = Some(Producer::new(f));
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn repr(mut self, repr: bool) -> Self {
        self.repr = Some(repr);
        self
    }

    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn db_default(mut self) -> Self {
        self.db_default = true;
        self
    }

    pub fn min(mut self, bound: impl Into<Value>) -> Self {
        self.constraints.min = Some(bound.into());
        self
    }

    pub fn max(mut self, bound: impl Into<Value>) -> Self {
        self.constraints.max = Some(bound.into());
        self
    }

    pub fn length(mut self, length: usize) -> Self {
        self.constraints.length = Some(length);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn eq(mut self, value: impl Into<Value>) -> Self {
        self.constraints.eq = Some(value.into());
        self
    }

    pub fn ne(mut self, value: impl Into<Value>) -> Self {
        self.constraints.ne = Some(value.into());
        self
    }

    pub fn ge(mut self, bound: impl Into<Value>) -> Self {
        self.constraints.ge = Some(bound.into());
        self
    }

    pub fn le(mut self, bound: impl Into<Value>) -> Self {
        self.constraints.le = Some(bound.into());
        self
    }

    pub fn gt(mut self, bound: impl Into<Value>) -> Self {
        self.constraints.gt = Some(bound.into());
        self
    }

    pub fn lt(mut self, bound: impl Into<Value>) -> Self {
        self.constraints.lt = Some(bound.into());
        self
    }

    pub fn validator(
        mut self,
        f: impl Fn(&FieldDescriptor, &Value) -> Result<bool, String> + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(CustomValidator::new(f));
        self
    }

    pub fn foreign_ref(mut self, reference: ForeignRef) -> Self {
        self.foreign_ref = Some(reference);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Marks the field secret (exporters should mask it)
    pub fn secret(self) -> Self {
        self.meta("secret", serde_json::Value::Bool(true))
    }

    pub fn parser(mut self, f: impl Fn(&Value) -> Result<Value, String> + Send + Sync + 'static) -> Self {
        self.parser = Some(FieldParser::new(f));
        self
    }

    fn apply(self, mut field: FieldDescriptor) -> Result<FieldDescriptor, InvalidSpec> {
        let mut constraints = self.constraints;
        if let Some(source) = &self.pattern {
            let pattern = Pattern::new(source)
                .map_err(|e| InvalidSpec::new(&field.name, format!("invalid pattern {:?}: {}", source, e)))?;
            constraints.pattern = Some(pattern);
        }
        field.constraints = constraints;
        field.nullable = self.nullable.unwrap_or(!self.required || self.default.is_some());

        field.default = self.default;
        field.default_factory = self.default_factory;
        field.required = self.required;
        field.primary_key = self.primary_key;
        field.repr = self.repr.unwrap_or(true);
        field.readonly = self.readonly;
        field.alias = self.alias;
        field.db_default = self.db_default;
        field.validator = self.validator;
        field.foreign_ref = self.foreign_ref;
        field.metadata = self.metadata;
        field.parser = self.parser;
        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumType;

    #[test]
    fn test_bare_shape() {
        let field = FieldDescriptor::build("age", TypeExpr::int()).unwrap();
        assert_eq!(field.name, "age");
        assert!(field.nullable);
        assert!(!field.required);
        assert!(field.repr);
        assert_eq!(field.default_value(), Value::Null);
        assert_eq!(field.origin, FieldOrigin::Declared);
    }

    #[test]
    fn test_default_and_factory_shapes() {
        let field = FieldDescriptor::build("name", (TypeExpr::str(), Value::from("John Doe"))).unwrap();
        assert_eq!(field.default_value(), Value::from("John Doe"));

        let field = FieldDescriptor::build(
            "friends",
            (TypeExpr::list(TypeExpr::int()), Producer::new(|| Value::List(vec![]))),
        )
        .unwrap();
        assert_eq!(field.default_value(), Value::List(vec![]));
    }

    #[test]
    fn test_factory_wins_over_default() {
        let options = FieldOptions::new().default(1).default_factory(|| Value::Int(2));
        let field = FieldDescriptor::build("n", (TypeExpr::int(), options)).unwrap();
        assert_eq!(field.default_value(), Value::Int(2));
    }

    #[test]
    fn test_full_options() {
        let options = FieldOptions::new()
            .required()
            .alias("emailAddress")
            .pattern(r"[^@]+@[^@]+")
            .repr(false)
            .secret();
        let field = FieldDescriptor::build("email_address", (TypeExpr::str(), options)).unwrap();
        assert!(field.required);
        assert!(!field.nullable);
        assert!(!field.repr);
        assert!(field.is_secret());
        assert_eq!(field.input_name(), "emailAddress");
        assert!(field.constraints.pattern.unwrap().is_match("a@b"));
    }

    #[test]
    fn test_pattern_on_int_is_invalid_spec() {
        let options = FieldOptions::new().pattern("\\d+");
        let err = FieldDescriptor::build("age", (TypeExpr::int(), options)).unwrap_err();
        assert_eq!(err.field, "age");
        assert!(err.reason.contains("pattern"));
    }

    #[test]
    fn test_invalid_regex_is_invalid_spec() {
        let options = FieldOptions::new().pattern("(unclosed");
        assert!(FieldDescriptor::build("code", (TypeExpr::str(), options)).is_err());
    }

    #[test]
    fn test_empty_union_and_enum_rejected() {
        assert!(FieldDescriptor::build("u", TypeExpr::union(vec![])).is_err());
        assert!(FieldDescriptor::build("e", TypeExpr::enumeration(EnumType::new("Empty"))).is_err());
        assert!(FieldDescriptor::build("l", TypeExpr::list(TypeExpr::union(vec![]))).is_err());
    }

    #[test]
    fn test_non_scalar_mapping_key_rejected() {
        let ty = TypeExpr::mapping(TypeExpr::list(TypeExpr::int()), TypeExpr::int());
        assert!(FieldDescriptor::build("m", ty).is_err());
    }

    #[test]
    fn test_built_shape_is_renamed_and_rechecked() {
        let mut prebuilt = FieldDescriptor::new("tmp", TypeExpr::int());
        prebuilt.constraints.pattern = Some(Pattern::new("x").unwrap());
        assert!(FieldDescriptor::build("n", prebuilt).is_err());

        let prebuilt = FieldDescriptor::new("tmp", TypeExpr::int());
        assert_eq!(FieldDescriptor::build("n", prebuilt).unwrap().name, "n");
    }

    #[test]
    fn test_dynamic_descriptor() {
        let field = FieldDescriptor::dynamic("extra", &Value::from("z"));
        assert_eq!(field.declared_type, TypeExpr::str());
        assert_eq!(field.origin, FieldOrigin::Dynamic);
    }
}
