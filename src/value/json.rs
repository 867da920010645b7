//! Conversion between [`Value`] and JSON

use chrono::Duration;
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value as JsonValue};

use super::{Value, ValueMap};

impl Value {
    /// Converts a JSON document into a value.
    ///
    /// JSON carries no temporal or decimal types, so those arrive as
    /// strings and are left to coercion.
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(s) => Value::Str(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => Value::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect::<ValueMap>(),
            ),
        }
    }

    /// Renders the value as JSON.
    ///
    /// Temporal, decimal and uuid values become strings; records become
    /// objects of their plain fields; callables and awaitables become null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null | Value::Callable(_) | Value::Awaitable(_) => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Int(i) => JsonValue::Number((*i).into()),
            Value::Float(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Value::Str(s) => JsonValue::String(s.clone()),
            Value::Bytes(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
            Value::Decimal(_)
            | Value::Uuid(_)
            | Value::Date(_)
            | Value::DateTime(_)
            | Value::Time(_)
            | Value::TimeDelta(_) => JsonValue::String(self.to_string()),
            Value::List(items) | Value::Tuple(items) | Value::Set(items) | Value::FrozenSet(items) => {
                JsonValue::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, JsonValue>>(),
            ),
            Value::Enum(e) => e.value.to_json(),
            Value::Record(record) => Value::Map(record.to_plain_map(false)).to_json(),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Renders a float so integral values keep a trailing `.0`
pub(crate) fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

/// Renders a duration as `[D day[s], ]H:MM:SS[.ffffff]`
pub fn format_timedelta(d: &Duration) -> String {
    let total_micros = d.num_microseconds().unwrap_or(i64::MAX);
    let micros_per_day: i64 = 86_400 * 1_000_000;
    let days = total_micros.div_euclid(micros_per_day);
    let rem = total_micros.rem_euclid(micros_per_day);

    let secs = rem / 1_000_000;
    let micros = rem % 1_000_000;
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    let mut out = String::new();
    if days != 0 {
        let unit = if days.abs() == 1 { "day" } else { "days" };
        out.push_str(&format!("{} {}, ", days, unit));
    }
    out.push_str(&format!("{}:{:02}:{:02}", h, m, s));
    if micros != 0 {
        out.push_str(&format!(".{:06}", micros));
    }
    out
}
