//! Dynamic value variant used for event fields, rule literals, and path
//! extraction results.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// A scalar, list, or nested map value pulled out of an event record or a
/// predicate literal.
///
/// `Absent` is a sentinel, not a variant a record can hold directly — it is
/// what [`crate::path::extract`] returns (as the provided default) when a
/// path cannot be resolved, and it never equals any literal, including an
/// explicit [`Value::Null`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// Sentinel for "path did not resolve". Never produced by a literal.
    Absent,
}

impl Value {
    /// Textual coercion used by `contains(...)` and `regex(...)`.
    ///
    /// Absent coerces to an empty string; callers that must special-case
    /// "field missing" (both DSL functions do) check for [`Value::Absent`]
    /// before calling this.
    pub fn coerce_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::String(s) => s.clone(),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(Value::coerce_text).collect();
                format!("[{}]", parts.join(","))
            }
            Value::Map(_) => "<map>".to_string(),
            Value::Absent => String::new(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn from_json(v: &JsonValue) -> Value {
        match v {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(map) => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    out.insert(k.clone(), Value::from_json(v));
                }
                Value::Map(out)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.coerce_text())
    }
}
