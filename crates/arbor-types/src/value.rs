use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Number;

use crate::key::{Key, Path};

/// Entries of a map node.
pub type Map = BTreeMap<String, Value>;

/// A record built by a custom constructor.
///
/// A tagged value carries named fields, but it is not a plain map: it is
/// compared by identity and replaced as a whole, never traversed.
#[derive(Clone, Debug, PartialEq)]
pub struct Tagged {
    type_name: String,
    fields: Map,
}

impl Tagged {
    pub fn new(type_name: impl Into<String>, fields: Map) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn fields(&self) -> &Map {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// A node of a persistent data tree.
///
/// Containers (`Seq`, `Map`) and `Tagged` records live behind an [`Arc`];
/// cloning a `Value` never copies a container, it hands out another
/// reference to the same node. [`Value::same`] compares those references,
/// while `==` compares contents.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(Arc<str>),
    Timestamp(DateTime<Utc>),
    Tagged(Arc<Tagged>),
    Seq(Arc<Vec<Value>>),
    Map(Arc<Map>),
}

/// Discriminant of a [`Value`], for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Number,
    String,
    Timestamp,
    Tagged,
    Seq,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::String => "string",
            ValueKind::Timestamp => "timestamp",
            ValueKind::Tagged => "tagged",
            ValueKind::Seq => "sequence",
            ValueKind::Map => "map",
        };
        f.write_str(s)
    }
}

impl Value {
    /// A new, empty map node.
    pub fn empty_map() -> Self {
        Value::Map(Arc::new(Map::new()))
    }

    /// A new, empty sequence node.
    pub fn empty_seq() -> Self {
        Value::Seq(Arc::new(Vec::new()))
    }

    /// Build a map node from `(name, value)` pairs.
    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(Arc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Build a sequence node from its elements.
    pub fn seq<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Value::Seq(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a custom-typed record.
    pub fn tagged(type_name: impl Into<String>, fields: Map) -> Self {
        Value::Tagged(Arc::new(Tagged::new(type_name, fields)))
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Timestamp(_) => ValueKind::Timestamp,
            Value::Tagged(_) => ValueKind::Tagged,
            Value::Seq(_) => ValueKind::Seq,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Reference identity.
    ///
    /// Containers and tagged records are the same only if they are the same
    /// allocation; scalars and timestamps are the same when their values are
    /// equal. Numbers compare by numeric value, so `1` and `1.0` are the
    /// same. Two maps with equal contents built separately are *not* the
    /// same.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => same_number(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Timestamp(a), Value::Timestamp(b)) => a == b,
            (Value::Tagged(a), Value::Tagged(b)) => Arc::ptr_eq(a, b),
            (Value::Seq(a), Value::Seq(b)) => Arc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Whether this value is a plain map or sequence, i.e. eligible for
    /// structural merge. Everything else is opaque.
    pub fn is_mergeable(&self) -> bool {
        matches!(self, Value::Seq(_) | Value::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_tagged(&self) -> Option<&Tagged> {
        match self {
            Value::Tagged(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Number of direct children of a container, `None` for anything else.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Seq(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// The child at `key`, or `None` if absent or if `self` is not a
    /// container.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        match self {
            Value::Map(map) => map.get(key.as_name().as_ref()),
            Value::Seq(items) => key.as_index().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Follow `path` down from this value.
    pub fn get_path(&self, path: &Path) -> Option<&Value> {
        path.keys()
            .iter()
            .try_fold(self, |node, key| node.get(key))
    }
}

/// Integers keep their exact representation in [`Number`], so two integers
/// are equal only if `==` says so; a float on either side compares as `f64`.
fn same_number(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    if !(a.is_f64() || b.is_f64()) {
        return false;
    }
    matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::Value::from(self);
        write!(f, "{json}")
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no number representation and become `Null`.
    fn from(n: f64) -> Self {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<Tagged> for Value {
    fn from(t: Tagged) -> Self {
        Value::Tagged(Arc::new(t))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Seq(Arc::new(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::Map(Arc::new(map))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_are_the_same_node() {
        let v = Value::map([("a", 1)]);
        let w = v.clone();
        assert!(v.same(&w));
    }

    #[test]
    fn equal_contents_are_not_the_same_node() {
        let v = Value::map([("a", 1)]);
        let w = Value::map([("a", 1)]);
        assert_eq!(v, w);
        assert!(!v.same(&w));
    }

    #[test]
    fn scalars_are_same_by_value() {
        assert!(Value::from(1).same(&Value::from(1)));
        assert!(Value::from("x").same(&Value::from("x")));
        assert!(Value::Null.same(&Value::Null));
        assert!(!Value::from(1).same(&Value::from("1")));
        assert!(!Value::from(1).same(&Value::from(2)));
    }

    #[test]
    fn default_is_null() {
        assert!(Value::default().is_null());
    }

    #[test]
    fn numbers_are_the_same_by_numeric_value() {
        assert!(Value::from(1).same(&Value::from(1.0)));
        assert!(Value::from(1.0).same(&Value::from(1u64)));
        assert!(Value::from(-2).same(&Value::from(-2.0)));
        assert!(Value::from(0.0).same(&Value::from(-0.0)));
        assert!(!Value::from(1).same(&Value::from(1.5)));
        assert!(!Value::from(u64::MAX).same(&Value::from(i64::MAX)));
    }

    #[test]
    fn tagged_values_are_same_by_reference() {
        let t = Value::tagged("Foo", Map::new());
        let u = Value::tagged("Foo", Map::new());
        assert!(t.same(&t.clone()));
        assert!(!t.same(&u));
    }

    #[test]
    fn only_maps_and_sequences_are_mergeable() {
        assert!(Value::empty_map().is_mergeable());
        assert!(Value::empty_seq().is_mergeable());
        assert!(!Value::Null.is_mergeable());
        assert!(!Value::from(3).is_mergeable());
        assert!(!Value::from(Utc::now()).is_mergeable());
        assert!(!Value::tagged("Foo", Map::new()).is_mergeable());
    }

    #[test]
    fn get_accepts_names_and_indices() {
        let v = Value::seq([10, 20, 30]);
        assert_eq!(v.get(&Key::from(1usize)), Some(&Value::from(20)));
        assert_eq!(v.get(&Key::from("1")), Some(&Value::from(20)));
        assert_eq!(v.get(&Key::from(3usize)), None);

        let m = Value::map([("0", "zero")]);
        assert_eq!(m.get(&Key::from(0usize)), Some(&Value::from("zero")));
        assert_eq!(Value::from(1).get(&Key::from("a")), None);
    }

    #[test]
    fn get_path_descends() {
        let v = Value::map([("a", Value::map([("b", Value::seq([1, 2]))]))]);
        let path: Path = "a.b.1".parse().unwrap();
        assert_eq!(v.get_path(&path), Some(&Value::from(2)));
        assert!(v.get_path(&Path::root()).unwrap().same(&v));
        assert_eq!(v.get_path(&"a.c".parse().unwrap()), None);
    }

    #[test]
    fn non_finite_float_is_null() {
        assert!(Value::from(f64::NAN).is_null());
        assert_eq!(Value::from(1.5).as_f64(), Some(1.5));
    }

    #[test]
    fn kind_names() {
        assert_eq!(Value::empty_seq().kind().to_string(), "sequence");
        assert_eq!(Value::from(true).kind(), ValueKind::Bool);
    }
}
