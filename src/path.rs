//! Dotted-path field extraction (spec §4.1).

use crate::value::Value;
use std::collections::BTreeMap;

/// Read a value out of a nested field map by dotted path.
///
/// Traversal descends only through map nodes. If any segment is absent, or
/// an intermediate value is not a map, `default` is returned. An empty path
/// returns `default`. Never fails.
pub fn extract(record: &BTreeMap<String, Value>, path: &str, default: Value) -> Value {
    if path.is_empty() {
        return default;
    }

    let mut segments = path.split('.');
    let first = segments.next().unwrap();
    let mut current = match record.get(first) {
        Some(v) => v,
        None => return default,
    };

    for segment in segments {
        match current {
            Value::Map(map) => match map.get(segment) {
                Some(v) => current = v,
                None => return default,
            },
            _ => return default,
        }
    }

    current.clone()
}

/// Extract several dotted paths at once, mapping each to its resolved value
/// (or `default` when unresolved).
pub fn extract_multiple(
    record: &BTreeMap<String, Value>,
    paths: &[String],
    default: Value,
) -> BTreeMap<String, Value> {
    paths
        .iter()
        .map(|p| (p.clone(), extract(record, p, default.clone())))
        .collect()
}
