//! Dynamic values flowing through coercion and validation
//!
//! A [`Value`] is what callers hand to a record constructor and what a
//! record stores after coercion. Scalars use the ecosystem types directly
//! (chrono, uuid, rust_decimal) so a coerced value is already the native
//! representation a consumer expects.

mod compare;
mod json;

pub use compare::{compare, loose_eq};
pub use json::format_timedelta;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::record::RecordInstance;

/// Ordered string-keyed map of values
pub type ValueMap = IndexMap<String, Value>;

/// A zero-argument producer of a value.
///
/// Used for default factories and for deferred defaults passed as input.
#[derive(Clone)]
pub struct Producer(Arc<dyn Fn() -> Value + Send + Sync>);

impl Producer {
    pub fn new(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invokes the producer
    pub fn call(&self) -> Value {
        (self.0)()
    }
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<callable>")
    }
}

impl PartialEq for Producer {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Opaque handle to an asynchronous task owned by the caller.
///
/// The engine never polls or inspects it.
#[derive(Clone)]
pub struct TaskHandle(Arc<dyn Any + Send + Sync>);

impl TaskHandle {
    pub fn new<T: Any + Send + Sync>(task: T) -> Self {
        Self(Arc::new(task))
    }

    /// Borrows the wrapped task if it has type `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<awaitable>")
    }
}

impl PartialEq for TaskHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A member of a declared enumeration
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// Name of the enumeration type
    pub enum_name: String,
    /// Member name
    pub member: String,
    /// Member value
    pub value: Box<Value>,
}

/// A dynamically typed value
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Decimal(Decimal),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    TimeDelta(Duration),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    /// Insertion-ordered, duplicate-free
    Set(Vec<Value>),
    /// Insertion-ordered, duplicate-free
    FrozenSet(Vec<Value>),
    Map(ValueMap),
    Enum(EnumValue),
    Record(Box<RecordInstance>),
    Callable(Producer),
    Awaitable(TaskHandle),
}

impl Value {
    /// Runtime type name used in error payloads
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Decimal(_) => "decimal",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::DateTime(_) => "datetime",
            Value::Time(_) => "time",
            Value::TimeDelta(_) => "timedelta",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::FrozenSet(_) => "frozenset",
            Value::Map(_) => "dict",
            Value::Enum(_) => "enum",
            Value::Record(_) => "record",
            Value::Callable(_) => "callable",
            Value::Awaitable(_) => "awaitable",
        }
    }

    /// Builds a list value
    pub fn list(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds a tuple value
    pub fn tuple(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::Tuple(items.into_iter().map(Into::into).collect())
    }

    /// Builds a set value, dropping duplicates
    pub fn set(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::Set(dedup(items.into_iter().map(Into::into)))
    }

    /// Builds a frozen set value, dropping duplicates
    pub fn frozenset(items: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        Value::FrozenSet(dedup(items.into_iter().map(Into::into)))
    }

    /// Builds a map value
    pub fn map<K: Into<String>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Wraps a zero-argument producer
    pub fn callable(f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        Value::Callable(Producer::new(f))
    }

    /// Wraps an opaque task handle
    pub fn awaitable<T: Any + Send + Sync>(task: T) -> Self {
        Value::Awaitable(TaskHandle::new(task))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Callable(_))
    }

    pub fn is_awaitable(&self) -> bool {
        matches!(self, Value::Awaitable(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_) | Value::Decimal(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(u) => Some(*u),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Elements of any sequence-shaped value
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::List(items)
            | Value::Tuple(items)
            | Value::Set(items)
            | Value::FrozenSet(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordInstance> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumValue> {
        match self {
            Value::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Length for strings (in chars), bytes and containers
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            Value::Bytes(b) => Some(b.len()),
            Value::Map(m) => Some(m.len()),
            other => other.as_items().map(<[Value]>::len),
        }
    }

    /// Whether a sized value is empty
    pub fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }
}

/// Keeps the first occurrence of each value
pub(crate) fn dedup(items: impl IntoIterator<Item = Value>) -> Vec<Value> {
    let mut out: Vec<Value> = Vec::new();
    for item in items {
        if !out.iter().any(|seen| loose_eq(seen, &item)) {
            out.push(item);
        }
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", json::float_text(*x)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Value::TimeDelta(d) => write!(f, "{}", format_timedelta(d)),
            Value::List(items) | Value::Set(items) | Value::FrozenSet(items) => {
                write_items(f, "[", items, "]")
            }
            Value::Tuple(items) => write_items(f, "(", items, ")"),
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                write!(f, "}}")
            }
            Value::Enum(e) => write!(f, "{}.{}", e.enum_name, e.member),
            Value::Record(r) => write!(f, "{}", r),
            Value::Callable(_) => write!(f, "<callable>"),
            Value::Awaitable(_) => write!(f, "<awaitable>"),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    write!(f, "{}", open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    write!(f, "{}", close)
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int,
    u32 => Int,
    f64 => Float,
    f32 => Float,
    String => Str,
    &str => Str,
    Vec<u8> => Bytes,
    Decimal => Decimal,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveDateTime => DateTime,
    NaiveTime => Time,
    Duration => TimeDelta,
    ValueMap => Map,
    EnumValue => Enum,
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<RecordInstance> for Value {
    fn from(record: RecordInstance) -> Self {
        Value::Record(Box::new(record))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
