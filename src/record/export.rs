//! Plain-map export for encoders

use super::instance::RecordInstance;
use crate::value::{Value, ValueMap};

/// Options for [`RecordInstance::to_plain_map_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportOptions {
    /// Drop null values and empty mappings; ORed with the schema setting
    pub remove_nulls: bool,
    /// Replace enum members with their values
    pub convert_enums: bool,
}

impl RecordInstance {
    /// Field values with nested records expanded into plain maps
    pub fn to_plain_map(&self, remove_nulls: bool) -> ValueMap {
        self.to_plain_map_with(ExportOptions {
            remove_nulls,
            convert_enums: false,
        })
    }

    pub fn to_plain_map_with(&self, options: ExportOptions) -> ValueMap {
        let remove_nulls = options.remove_nulls || self.schema.remove_nulls_on_export();
        let mut out = ValueMap::with_capacity(self.values.len());
        for (name, value) in &self.values {
            let value = plain(value, options);
            if remove_nulls && is_blank(&value) {
                continue;
            }
            out.insert(name.clone(), value);
        }
        out
    }

    /// Plain map rendered as JSON
    pub fn to_json(&self) -> serde_json::Value {
        Value::Map(self.to_plain_map(false)).to_json()
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Map(map) => map.is_empty(),
        _ => false,
    }
}

fn plain(value: &Value, options: ExportOptions) -> Value {
    let items = |items: &[Value]| items.iter().map(|v| plain(v, options)).collect::<Vec<_>>();
    match value {
        Value::Record(record) => Value::Map(record.to_plain_map_with(options)),
        Value::List(v) => Value::List(items(v)),
        Value::Tuple(v) => Value::Tuple(items(v)),
        Value::Set(v) => Value::Set(items(v)),
        Value::FrozenSet(v) => Value::FrozenSet(items(v)),
        Value::Map(map) => Value::Map(map.iter().map(|(k, v)| (k.clone(), plain(v, options))).collect()),
        Value::Enum(member) if options.convert_enums => plain(&member.value, options),
        other => other.clone(),
    }
}
