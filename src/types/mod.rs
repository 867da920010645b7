//! Declared type expressions
//!
//! A [`TypeExpr`] is the structured form of a field annotation. It drives
//! coercion, exact-match checks for unions and type inference for dynamic
//! fields. Expressions can be built directly or parsed from annotation text
//! such as `Optional[List[int]]` with [`parse_type_expr`].

mod parse;

pub use parse::{parse_type_expr, NoResolver, ParseError, TypeResolver};

use std::fmt;
use std::sync::Arc;

use crate::schema::RecordSchema;
use crate::value::{EnumValue, Value};

/// Scalar kinds with a native coerced representation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Str,
    Int,
    Float,
    Bool,
    Bytes,
    Uuid,
    Decimal,
    Date,
    DateTime,
    Time,
    TimeDelta,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Str => "str",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
            ScalarKind::Bytes => "bytes",
            ScalarKind::Uuid => "uuid",
            ScalarKind::Decimal => "decimal",
            ScalarKind::Date => "date",
            ScalarKind::DateTime => "datetime",
            ScalarKind::Time => "time",
            ScalarKind::TimeDelta => "timedelta",
        }
    }

    /// Looks a scalar up by annotation name
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "str" | "string" => ScalarKind::Str,
            "int" | "integer" => ScalarKind::Int,
            "float" => ScalarKind::Float,
            "bool" | "boolean" => ScalarKind::Bool,
            "bytes" => ScalarKind::Bytes,
            "uuid" | "UUID" => ScalarKind::Uuid,
            "decimal" | "Decimal" => ScalarKind::Decimal,
            "date" => ScalarKind::Date,
            "datetime" => ScalarKind::DateTime,
            "time" => ScalarKind::Time,
            "timedelta" => ScalarKind::TimeDelta,
            _ => return None,
        };
        Some(kind)
    }

    /// Whether values of this kind carry a total order usable by bounds
    pub fn is_orderable(&self) -> bool {
        !matches!(self, ScalarKind::Bool | ScalarKind::Bytes | ScalarKind::Uuid)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarKind::Int | ScalarKind::Float | ScalarKind::Decimal)
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ScalarKind::Str, Value::Str(_))
                | (ScalarKind::Int, Value::Int(_))
                | (ScalarKind::Float, Value::Float(_))
                | (ScalarKind::Bool, Value::Bool(_))
                | (ScalarKind::Bytes, Value::Bytes(_))
                | (ScalarKind::Uuid, Value::Uuid(_))
                | (ScalarKind::Decimal, Value::Decimal(_))
                | (ScalarKind::Date, Value::Date(_))
                | (ScalarKind::DateTime, Value::DateTime(_))
                | (ScalarKind::Time, Value::Time(_))
                | (ScalarKind::TimeDelta, Value::TimeDelta(_))
        )
    }
}

/// Container kinds usable without parameters (`list`, `dict`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    List,
    Set,
    FrozenSet,
    Tuple,
    Dict,
}

impl ContainerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerKind::List => "list",
            ContainerKind::Set => "set",
            ContainerKind::FrozenSet => "frozenset",
            ContainerKind::Tuple => "tuple",
            ContainerKind::Dict => "dict",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (ContainerKind::List, Value::List(_))
                | (ContainerKind::Set, Value::Set(_))
                | (ContainerKind::FrozenSet, Value::FrozenSet(_))
                | (ContainerKind::Tuple, Value::Tuple(_))
                | (ContainerKind::Dict, Value::Map(_))
        )
    }
}

/// Element layout of a tuple type
#[derive(Debug, Clone, PartialEq)]
pub enum TupleShape {
    /// `Tuple[A, B, C]`: one type per position, arity fixed
    Fixed(Vec<TypeExpr>),
    /// `Tuple[T, ...]`: any arity, all elements of one type
    Homogeneous(Box<TypeExpr>),
}

/// A named enumeration with ordered members
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    pub name: String,
    pub members: Vec<(String, Value)>,
}

impl EnumType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Adds a member
    pub fn member(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.push((name.into(), value.into()));
        self
    }

    /// Builds the value for the named member
    pub fn by_name(&self, name: &str) -> Option<EnumValue> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(member, value)| self.instance(member, value))
    }

    /// Builds the value for the member whose value equals `value`
    pub fn by_value(&self, value: &Value) -> Option<EnumValue> {
        self.members
            .iter()
            .find(|(_, v)| crate::value::loose_eq(v, value))
            .map(|(member, v)| self.instance(member, v))
    }

    fn instance(&self, member: &str, value: &Value) -> EnumValue {
        EnumValue {
            enum_name: self.name.clone(),
            member: member.to_string(),
            value: Box::new(value.clone()),
        }
    }
}

/// A declared field type
#[derive(Debug, Clone)]
pub enum TypeExpr {
    /// No annotation; any value passes through
    Any,
    Scalar(ScalarKind),
    Optional(Box<TypeExpr>),
    Union(Vec<TypeExpr>),
    List(Box<TypeExpr>),
    Set(Box<TypeExpr>),
    FrozenSet(Box<TypeExpr>),
    Tuple(TupleShape),
    Mapping(Box<TypeExpr>, Box<TypeExpr>),
    Record(Arc<RecordSchema>),
    Enum(Arc<EnumType>),
    /// Unparameterized container
    Bare(ContainerKind),
    Callable,
    Awaitable,
}

impl PartialEq for TypeExpr {
    fn eq(&self, other: &Self) -> bool {
        use TypeExpr::*;
        match (self, other) {
            (Any, Any) | (Callable, Callable) | (Awaitable, Awaitable) => true,
            (Scalar(a), Scalar(b)) => a == b,
            (Optional(a), Optional(b))
            | (List(a), List(b))
            | (Set(a), Set(b))
            | (FrozenSet(a), FrozenSet(b)) => a == b,
            (Union(a), Union(b)) => a == b,
            (Tuple(a), Tuple(b)) => a == b,
            (Mapping(ka, va), Mapping(kb, vb)) => ka == kb && va == vb,
            (Record(a), Record(b)) => a.type_name() == b.type_name(),
            (Enum(a), Enum(b)) => a.name == b.name,
            (Bare(a), Bare(b)) => a == b,
            _ => false,
        }
    }
}

impl TypeExpr {
    pub fn str() -> Self {
        TypeExpr::Scalar(ScalarKind::Str)
    }

    pub fn int() -> Self {
        TypeExpr::Scalar(ScalarKind::Int)
    }

    pub fn float() -> Self {
        TypeExpr::Scalar(ScalarKind::Float)
    }

    pub fn bool() -> Self {
        TypeExpr::Scalar(ScalarKind::Bool)
    }

    pub fn optional(inner: TypeExpr) -> Self {
        TypeExpr::Optional(Box::new(inner))
    }

    pub fn list(inner: TypeExpr) -> Self {
        TypeExpr::List(Box::new(inner))
    }

    pub fn set(inner: TypeExpr) -> Self {
        TypeExpr::Set(Box::new(inner))
    }

    pub fn frozenset(inner: TypeExpr) -> Self {
        TypeExpr::FrozenSet(Box::new(inner))
    }

    pub fn tuple(items: Vec<TypeExpr>) -> Self {
        TypeExpr::Tuple(TupleShape::Fixed(items))
    }

    pub fn tuple_of(inner: TypeExpr) -> Self {
        TypeExpr::Tuple(TupleShape::Homogeneous(Box::new(inner)))
    }

    pub fn mapping(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Mapping(Box::new(key), Box::new(value))
    }

    pub fn union(members: Vec<TypeExpr>) -> Self {
        TypeExpr::Union(members)
    }

    pub fn record(schema: &Arc<RecordSchema>) -> Self {
        TypeExpr::Record(Arc::clone(schema))
    }

    pub fn enumeration(ty: EnumType) -> Self {
        TypeExpr::Enum(Arc::new(ty))
    }

    pub fn bare(kind: ContainerKind) -> Self {
        TypeExpr::Bare(kind)
    }

    pub fn any() -> Self {
        TypeExpr::Any
    }

    pub fn callable() -> Self {
        TypeExpr::Callable
    }

    pub fn awaitable() -> Self {
        TypeExpr::Awaitable
    }

    /// Removes one `Optional` wrapper
    pub fn strip_optional(&self) -> &TypeExpr {
        match self {
            TypeExpr::Optional(inner) => inner,
            other => other,
        }
    }

    /// Whether a callable value is kept as-is rather than invoked
    pub fn keeps_callables(&self) -> bool {
        match self {
            TypeExpr::Any | TypeExpr::Callable => true,
            TypeExpr::Optional(inner) => inner.keeps_callables(),
            TypeExpr::Union(members) => members.iter().any(TypeExpr::keeps_callables),
            _ => false,
        }
    }

    /// Whether null is an acceptable value of the type itself
    pub fn accepts_null(&self) -> bool {
        match self {
            TypeExpr::Any | TypeExpr::Optional(_) => true,
            TypeExpr::Union(members) => members.iter().any(TypeExpr::accepts_null),
            _ => false,
        }
    }

    /// Whether the type resolves to a string
    pub fn is_string_like(&self) -> bool {
        match self.strip_optional() {
            TypeExpr::Scalar(ScalarKind::Str) => true,
            TypeExpr::Union(members) => members.iter().any(TypeExpr::is_string_like),
            _ => false,
        }
    }

    /// Whether ordering bounds apply to values of the type
    pub fn is_orderable(&self) -> bool {
        match self.strip_optional() {
            TypeExpr::Any => true,
            TypeExpr::Scalar(kind) => kind.is_orderable(),
            TypeExpr::Enum(_) => true,
            TypeExpr::Union(members) => members.iter().any(TypeExpr::is_orderable),
            _ => false,
        }
    }

    /// Whether values of the type have a length
    pub fn is_sized(&self) -> bool {
        match self.strip_optional() {
            TypeExpr::Any
            | TypeExpr::Scalar(ScalarKind::Str)
            | TypeExpr::Scalar(ScalarKind::Bytes)
            | TypeExpr::List(_)
            | TypeExpr::Set(_)
            | TypeExpr::FrozenSet(_)
            | TypeExpr::Tuple(_)
            | TypeExpr::Mapping(_, _)
            | TypeExpr::Bare(_) => true,
            TypeExpr::Union(members) => members.iter().any(TypeExpr::is_sized),
            _ => false,
        }
    }

    /// Whether the type is numeric
    pub fn is_numeric(&self) -> bool {
        match self.strip_optional() {
            TypeExpr::Scalar(kind) => kind.is_numeric(),
            TypeExpr::Union(members) => members.iter().any(TypeExpr::is_numeric),
            _ => false,
        }
    }

    /// Checks a value against the type without any conversion.
    ///
    /// Containers are checked element-wise.
    pub fn matches_exactly(&self, value: &Value) -> bool {
        match self {
            TypeExpr::Any => true,
            TypeExpr::Scalar(kind) => kind.matches(value),
            TypeExpr::Optional(inner) => value.is_null() || inner.matches_exactly(value),
            TypeExpr::Union(members) => members.iter().any(|m| m.matches_exactly(value)),
            TypeExpr::List(inner) => match value {
                Value::List(items) => items.iter().all(|v| inner.matches_exactly(v)),
                _ => false,
            },
            TypeExpr::Set(inner) => match value {
                Value::Set(items) => items.iter().all(|v| inner.matches_exactly(v)),
                _ => false,
            },
            TypeExpr::FrozenSet(inner) => match value {
                Value::FrozenSet(items) => items.iter().all(|v| inner.matches_exactly(v)),
                _ => false,
            },
            TypeExpr::Tuple(shape) => match (shape, value) {
                (TupleShape::Fixed(types), Value::Tuple(items)) => {
                    types.len() == items.len()
                        && types.iter().zip(items).all(|(t, v)| t.matches_exactly(v))
                }
                (TupleShape::Homogeneous(inner), Value::Tuple(items)) => {
                    items.iter().all(|v| inner.matches_exactly(v))
                }
                _ => false,
            },
            TypeExpr::Mapping(key, val) => match value {
                Value::Map(map) => map
                    .iter()
                    .all(|(k, v)| crate::coerce::is_canonical_key(key, k) && val.matches_exactly(v)),
                _ => false,
            },
            TypeExpr::Record(schema) => match value {
                Value::Record(record) => record.schema().is_subtype_of(schema),
                _ => false,
            },
            TypeExpr::Enum(ty) => match value {
                Value::Enum(e) => e.enum_name == ty.name,
                _ => false,
            },
            TypeExpr::Bare(kind) => kind.matches(value),
            TypeExpr::Callable => value.is_callable(),
            TypeExpr::Awaitable => value.is_awaitable(),
        }
    }

    /// Infers a type from a runtime value, used for dynamic fields
    pub fn infer(value: &Value) -> TypeExpr {
        match value {
            Value::Null => TypeExpr::Any,
            Value::Bool(_) => TypeExpr::Scalar(ScalarKind::Bool),
            Value::Int(_) => TypeExpr::Scalar(ScalarKind::Int),
            Value::Float(_) => TypeExpr::Scalar(ScalarKind::Float),
            Value::Str(_) => TypeExpr::Scalar(ScalarKind::Str),
            Value::Bytes(_) => TypeExpr::Scalar(ScalarKind::Bytes),
            Value::Decimal(_) => TypeExpr::Scalar(ScalarKind::Decimal),
            Value::Uuid(_) => TypeExpr::Scalar(ScalarKind::Uuid),
            Value::Date(_) => TypeExpr::Scalar(ScalarKind::Date),
            Value::DateTime(_) => TypeExpr::Scalar(ScalarKind::DateTime),
            Value::Time(_) => TypeExpr::Scalar(ScalarKind::Time),
            Value::TimeDelta(_) => TypeExpr::Scalar(ScalarKind::TimeDelta),
            Value::List(_) => TypeExpr::Bare(ContainerKind::List),
            Value::Tuple(_) => TypeExpr::Bare(ContainerKind::Tuple),
            Value::Set(_) => TypeExpr::Bare(ContainerKind::Set),
            Value::FrozenSet(_) => TypeExpr::Bare(ContainerKind::FrozenSet),
            Value::Map(_) => TypeExpr::Bare(ContainerKind::Dict),
            Value::Enum(_) => TypeExpr::Any,
            Value::Record(r) => TypeExpr::Record(Arc::clone(r.schema())),
            Value::Callable(_) => TypeExpr::Callable,
            Value::Awaitable(_) => TypeExpr::Awaitable,
        }
    }

    /// Annotation text for the type, used in error payloads
    pub fn describe(&self) -> String {
        match self {
            TypeExpr::Any => "Any".to_string(),
            TypeExpr::Scalar(kind) => kind.as_str().to_string(),
            TypeExpr::Optional(inner) => format!("Optional[{}]", inner.describe()),
            TypeExpr::Union(members) => format!("Union[{}]", join(members)),
            TypeExpr::List(inner) => format!("List[{}]", inner.describe()),
            TypeExpr::Set(inner) => format!("Set[{}]", inner.describe()),
            TypeExpr::FrozenSet(inner) => format!("FrozenSet[{}]", inner.describe()),
            TypeExpr::Tuple(TupleShape::Fixed(items)) => format!("Tuple[{}]", join(items)),
            TypeExpr::Tuple(TupleShape::Homogeneous(inner)) => {
                format!("Tuple[{}, ...]", inner.describe())
            }
            TypeExpr::Mapping(k, v) => format!("Dict[{}, {}]", k.describe(), v.describe()),
            TypeExpr::Record(schema) => schema.type_name().to_string(),
            TypeExpr::Enum(ty) => ty.name.clone(),
            TypeExpr::Bare(kind) => kind.as_str().to_string(),
            TypeExpr::Callable => "Callable".to_string(),
            TypeExpr::Awaitable => "Awaitable".to_string(),
        }
    }
}

fn join(items: &[TypeExpr]) -> String {
    items
        .iter()
        .map(TypeExpr::describe)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

impl From<ScalarKind> for TypeExpr {
    fn from(kind: ScalarKind) -> Self {
        TypeExpr::Scalar(kind)
    }
}
