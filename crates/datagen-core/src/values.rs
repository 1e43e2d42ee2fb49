//! Runtime values produced by the evaluator and the field generators.

use crate::node::NodeValue;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

/// One generated record, keyed in field declaration order.
pub type EntityResult = IndexMap<String, Value>;

/// A generated or evaluated value.
///
/// This is the closed set of runtime kinds the language can represent.
/// Binary operators match exhaustively over it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// String value
    Str(String),

    /// Timestamp with an optional output format
    Date(DateValue),

    /// Ordered collection of values
    Collection(Vec<Value>),

    /// A nested, already generated entity
    Entity(EntityResult),
}

impl Value {
    /// Name of the runtime kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "decimal",
            Value::Str(_) => "string",
            Value::Date(_) => "date",
            Value::Collection(_) => "collection",
            Value::Entity(_) => "entity",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateValue> {
        match self {
            Self::Date(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_collection(&self) -> Option<&[Value]> {
        match self {
            Self::Collection(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityResult> {
        match self {
            Self::Entity(e) => Some(e),
            _ => None,
        }
    }
}

impl From<&NodeValue> for Value {
    fn from(value: &NodeValue) -> Self {
        match value {
            NodeValue::Null => Value::Null,
            NodeValue::Bool(b) => Value::Bool(*b),
            NodeValue::Int(i) => Value::Int(*i),
            NodeValue::Float(f) => Value::Float(*f),
            NodeValue::Str(s) => Value::Str(s.clone()),
            NodeValue::Date(d) => Value::Date(DateValue::new(*d)),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{d}"),
            Value::Collection(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Entity(entity) => {
                let json = serde_json::to_string(entity).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

/// A timestamp that remembers how it should be rendered.
///
/// Without a format it serializes as RFC 3339; otherwise the strftime
/// format is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DateValue {
    pub time: DateTime<Utc>,
    pub format: Option<String>,
}

impl DateValue {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self { time, format: None }
    }

    pub fn with_format(time: DateTime<Utc>, format: Option<String>) -> Self {
        Self { time, format }
    }

    pub fn formatted(&self) -> String {
        match self.format.as_deref() {
            Some(format) if !format.is_empty() => self.time.format(format).to_string(),
            _ => self.time.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formatted())
    }
}

impl Serialize for DateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.formatted())
    }
}
