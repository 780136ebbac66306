//! Event Model (spec §4.4).

use crate::value::Value;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// An immutable, timestamped field map.
#[derive(Debug, Clone)]
pub struct Event {
    pub fields: BTreeMap<String, Value>,
    pub timestamp: DateTime<Utc>,
    pub event_id: String,
}

impl Event {
    /// Build an event from a field map, assigning a timestamp and id when
    /// the caller didn't supply one (spec §4.4).
    pub fn new(
        fields: BTreeMap<String, Value>,
        timestamp: Option<DateTime<Utc>>,
        event_id: Option<String>,
    ) -> Event {
        let event_id = event_id.unwrap_or_else(|| derive_event_id(&fields));
        let timestamp = timestamp.unwrap_or_else(Utc::now);
        Event {
            fields,
            timestamp,
            event_id,
        }
    }

    /// Build an event from a raw JSON record. An optional top-level
    /// `timestamp` field (ISO-8601) is consumed as the event timestamp and
    /// otherwise left in `fields` untouched — the engine only reads what it
    /// is configured to read (spec §6).
    pub fn from_json_record(record: &JsonValue, event_id: Option<String>) -> Option<Event> {
        let obj = record.as_object()?;
        let mut fields = BTreeMap::new();
        let mut timestamp = None;

        for (k, v) in obj {
            if k == "timestamp" {
                if let Some(s) = v.as_str() {
                    timestamp = DateTime::parse_from_rfc3339(s)
                        .ok()
                        .map(|dt| dt.with_timezone(&Utc));
                }
            }
            fields.insert(k.clone(), Value::from_json(v));
        }

        Some(Event::new(fields, timestamp, event_id))
    }

    pub fn get(&self, path: &str) -> Value {
        crate::path::extract(&self.fields, path, Value::Absent)
    }
}

/// Derive a stable event id from the canonicalized (sorted-keys)
/// serialization of the field map, per spec §4.4.
fn derive_event_id(fields: &BTreeMap<String, Value>) -> String {
    let canonical = canonicalize(fields);
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn canonicalize(fields: &BTreeMap<String, Value>) -> String {
    // BTreeMap already iterates in sorted key order.
    let mut out = String::from("{");
    for (i, (k, v)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&format!("{:?}:{}", k, canonicalize_value(v)));
    }
    out.push('}');
    out
}

fn canonicalize_value(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::String(s) => format!("{s:?}"),
        Value::List(items) => {
            let parts: Vec<String> = items.iter().map(canonicalize_value).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Map(map) => canonicalize(map),
        Value::Absent => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_stable_id_from_field_map() {
        let mut fields = BTreeMap::new();
        fields.insert("a".to_string(), Value::Int(1));
        fields.insert("b".to_string(), Value::String("x".into()));
        let e1 = Event::new(fields.clone(), None, None);
        let e2 = Event::new(fields, None, None);
        assert_eq!(e1.event_id, e2.event_id);
    }

    #[test]
    fn explicit_id_is_preserved() {
        let e = Event::new(BTreeMap::new(), None, Some("custom-id".to_string()));
        assert_eq!(e.event_id, "custom-id");
    }

    #[test]
    fn from_json_record_parses_timestamp() {
        let record = serde_json::json!({
            "timestamp": "2024-01-01T10:00:00Z",
            "event": {"type": "login"}
        });
        let event = Event::from_json_record(&record, None).unwrap();
        assert_eq!(event.timestamp.to_rfc3339(), "2024-01-01T10:00:00+00:00");
        assert_eq!(event.get("event.type"), Value::String("login".into()));
    }

    #[test]
    fn from_json_record_rejects_non_object() {
        let record = serde_json::json!([1, 2, 3]);
        assert!(Event::from_json_record(&record, None).is_none());
    }
}
