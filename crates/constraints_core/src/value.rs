//! Dynamic values flowing through a validation.
//!
//! Every member of the object model (field, getter result, method argument)
//! is read as a [`Value`]. Objects are shared by reference so that object
//! graphs, including cyclic ones, can be walked without copying.

use crate::object::ObjectRef;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// A value read from the object graph.
#[derive(Debug, Clone)]
pub enum Value {
    /// Null/missing value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
    /// Point in time
    DateTime(DateTime<Utc>),
    /// Collection value (list, set, queue...)
    List(Vec<Value>),
    /// Fixed-size array value
    Array(Vec<Value>),
    /// Map value with insertion-ordered entries
    Map(Vec<(Value, Value)>),
    /// Reference to an object of the model
    Object(ObjectRef),
}

/// The kinds of containers the engine can descend into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Collection,
    Map,
    Array,
}

/// Declared (static) kind of a field, parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValueKind {
    #[default]
    Any,
    Bool,
    Int,
    Float,
    String,
    DateTime,
    Collection,
    Map,
    Array,
    /// Object of the named class
    Object(String),
}

impl ValueKind {
    /// The container kind a member declared with this kind holds.
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            ValueKind::Collection => Some(ContainerKind::Collection),
            ValueKind::Map => Some(ContainerKind::Map),
            ValueKind::Array => Some(ContainerKind::Array),
            _ => None,
        }
    }
}

impl Value {
    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the type name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "int64",
            Value::Float(_) => "float64",
            Value::String(_) => "string",
            Value::DateTime(_) => "datetime",
            Value::List(_) => "collection",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Object(_) => "object",
        }
    }

    /// Classifies the value as a container.
    ///
    /// Collections take priority over maps, maps over arrays; a value is
    /// never more than one kind.
    pub fn container_kind(&self) -> Option<ContainerKind> {
        match self {
            Value::List(_) => Some(ContainerKind::Collection),
            Value::Map(_) => Some(ContainerKind::Map),
            Value::Array(_) => Some(ContainerKind::Array),
            _ => None,
        }
    }

    /// Number of elements or entries when this value is a container.
    pub fn container_len(&self) -> Option<usize> {
        match self {
            Value::List(items) | Value::Array(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            _ => None,
        }
    }

    /// Attempts to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to get this value as an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Attempts to get this value as a float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Attempts to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to get this value as a point in time.
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// Attempts to get this value as an object reference.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Builds a collection value.
    pub fn list<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Builds an array value.
    pub fn array<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }

    /// Builds a map value, keeping the entry order.
    pub fn map<K: Into<Value>, V: Into<Value>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            // objects compare by identity
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    write!(f, "[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    write!(f, "]")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::List(items) | Value::Array(items) => write_items(f, items),
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}={v}")?;
                }
                write!(f, "}}")
            }
            // never descend into objects: graphs may be cyclic
            Value::Object(o) => write!(f, "{}@{:p}", o.class().name(), Arc::as_ptr(o)),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

impl From<&ObjectRef> for Value {
    fn from(o: &ObjectRef) -> Self {
        Value::Object(o.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::list(items),
            serde_json::Value::Object(entries) => Value::map(entries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_value_types() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::from("test").type_name(), "string");
        assert_eq!(Value::Int(42).type_name(), "int64");
        assert_eq!(Value::Float(3.5).type_name(), "float64");
        assert_eq!(Value::list([1, 2]).type_name(), "collection");
    }

    #[test]
    fn test_value_conversions() {
        let val = Value::from("hello");
        assert_eq!(val.as_str(), Some("hello"));
        assert_eq!(val.as_int(), None);

        let val = Value::Int(42);
        assert_eq!(val.as_int(), Some(42));
        assert_eq!(val.as_float(), Some(42.0));
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_container_classification() {
        assert_eq!(
            Value::list(["a"]).container_kind(),
            Some(ContainerKind::Collection)
        );
        assert_eq!(
            Value::map([("k", 1)]).container_kind(),
            Some(ContainerKind::Map)
        );
        assert_eq!(
            Value::array([1, 2, 3]).container_kind(),
            Some(ContainerKind::Array)
        );
        assert_eq!(Value::from("abc").container_kind(), None);
        assert_eq!(Value::Null.container_kind(), None);
        assert_eq!(Value::array([1, 2, 3]).container_len(), Some(3));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::list([1, 2]).to_string(), "[1, 2]");
        assert_eq!(Value::map([("a", 1)]).to_string(), "{a=1}");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_from_json() {
        let json = serde_json::json!({"name": "x", "tags": ["a", "b"], "age": 3});
        let value = Value::from(json);
        let Value::Map(entries) = value else {
            panic!("expected map");
        };
        assert_eq!(entries.len(), 3);
        assert!(entries.contains(&(Value::from("tags"), Value::list(["a", "b"]))));
    }
}
