//! Accumulated form payload

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

/// Field name to value mapping built up across all steps.
///
/// Values are arbitrary JSON. Field names may be dotted (`address.city`) to
/// address a key inside a nested object. Unknown fields are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(transparent)]
#[ts(export)]
pub struct FormPayload(Map<String, Value>);

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Wrap a JSON value; only objects are payloads
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    /// Look up a field, following dots into nested objects
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(value) = self.0.get(path) {
            return Some(value);
        }

        let mut parts = path.split('.');
        let mut current = self.0.get(parts.next()?)?;
        for part in parts {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }

    /// Trimmed textual form of a scalar field, `None` when absent or blank
    pub fn text(&self, path: &str) -> Option<String> {
        self.get(path)
            .and_then(value_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    /// Set a field. A dotted name merges into the nested object, creating it
    /// (or replacing a non-object value) as needed. Blank names are ignored.
    pub fn set(&mut self, path: &str, value: Value) {
        if path.trim().is_empty() {
            return;
        }

        let mut parts: Vec<&str> = path.split('.').collect();
        let Some(last) = parts.pop() else {
            return;
        };

        let mut map = &mut self.0;
        for part in parts {
            let slot = map
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            match slot {
                Value::Object(inner) => map = inner,
                _ => return,
            }
        }
        map.insert(last.to_string(), value);
    }

    /// Set every field of a partial update
    pub fn merge(&mut self, fields: Map<String, Value>) {
        for (name, value) in fields {
            self.set(&name, value);
        }
    }

    /// Whether a field is set to something other than null
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some_and(|v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Deserialize a typed view of the payload; unknown fields are ignored
    pub fn section<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.0.clone()))
    }
}

/// Textual form of a scalar JSON value as a form input would hold it
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
