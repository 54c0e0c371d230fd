//! Conversion between [`Value`] and JSON.
//!
//! Plain JSON maps onto plain values: objects become `Map`, arrays become
//! `Seq`. On the way out, timestamps are written as RFC 3339 strings and
//! tagged records as objects whose first member is [`TAG_FIELD`].

use std::sync::Arc;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::TypeError;
use crate::value::{Map, Tagged, Value};

/// Member that carries the type name of a tagged record in JSON.
pub const TAG_FIELD: &str = "$type";

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(Arc::from(s)),
            serde_json::Value::Array(items) => {
                Value::Seq(Arc::new(items.into_iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(members) => Value::Map(Arc::new(
                members
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            )),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.to_string()),
            Value::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
            Value::Tagged(t) => {
                let mut members = serde_json::Map::new();
                members.insert(
                    TAG_FIELD.to_string(),
                    serde_json::Value::String(t.type_name().to_string()),
                );
                for (k, v) in t.fields() {
                    if k != TAG_FIELD {
                        members.insert(k.clone(), v.into());
                    }
                }
                serde_json::Value::Object(members)
            }
            Value::Seq(items) => {
                serde_json::Value::Array(items.iter().map(Into::into).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.into())).collect(),
            ),
        }
    }
}

impl Value {
    /// Parse a JSON document into a plain value tree.
    pub fn from_json_str(s: &str) -> Result<Self, TypeError> {
        let json: serde_json::Value =
            serde_json::from_str(s).map_err(|e| TypeError::Json(e.to_string()))?;
        Ok(Value::from(json))
    }

    /// Like `From<serde_json::Value>`, but objects carrying a string
    /// [`TAG_FIELD`] member become [`Tagged`] records.
    pub fn from_json_tagged(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Array(items) => Value::Seq(Arc::new(
                items.into_iter().map(Value::from_json_tagged).collect(),
            )),
            serde_json::Value::Object(mut members) => {
                let type_name = match members.get(TAG_FIELD) {
                    Some(serde_json::Value::String(name)) => Some(name.clone()),
                    _ => None,
                };
                if type_name.is_some() {
                    members.remove(TAG_FIELD);
                }
                let fields: Map = members
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json_tagged(v)))
                    .collect();
                match type_name {
                    Some(name) => Value::Tagged(Arc::new(Tagged::new(name, fields))),
                    None => Value::Map(Arc::new(fields)),
                }
            }
            other => Value::from(other),
        }
    }

    /// Render as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, TypeError> {
        serde_json::to_string_pretty(self).map_err(|e| TypeError::Json(e.to_string()))
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Number(n) => n.serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::Timestamp(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            Value::Tagged(t) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry(TAG_FIELD, t.type_name())?;
                for (k, v) in t.fields() {
                    if k != TAG_FIELD {
                        map.serialize_entry(k, v)?;
                    }
                }
                map.end()
            }
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}
