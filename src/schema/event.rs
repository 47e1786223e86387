//! Raw event metadata

use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value};

/// Event metadata as an ordered field → value record.
///
/// Field names follow the upstream schedule (`EventName`, `Session1`, `Session1Date`,
/// `Session1DateUtc`, ...). Field order is preserved.
#[derive(Default, Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct EventRecord {
    fields: Mapping,
}

impl EventRecord {
    pub fn new(fields: Mapping) -> Self {
        Self { fields }
    }

    /// Build a record from `(name, value)` pairs, keeping their order.
    pub fn from_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, value)| (Value::String(name.into()), value.into()))
            .collect();
        Self { fields }
    }

    /// Field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Fields with string names, in record order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().filter_map(|(name, value)| name.as_str().map(|name| (name, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
