//! # Path Addressing
//!
//! Ledger data is a JSON tree addressed by slash-separated paths such as
//! `world/inventory/sword`. The empty path addresses the root.

use serde_json::{Map, Value};

use super::errors::LedgerError;

/// Split a path into its non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join segments into a path.
pub fn join_path(segments: &[&str]) -> String {
    segments.join("/")
}

/// Reject a single path segment that would address more than one level.
pub fn validate_segment(segment: &str) -> Result<(), LedgerError> {
    if segment.is_empty() || segment.contains('/') {
        return Err(LedgerError::InvalidPath(format!(
            "segment {segment:?} must be non-empty and contain no '/'"
        )));
    }
    Ok(())
}

/// Resolve a path, returning `None` if any segment is missing.
pub fn resolve_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = root;
    for segment in split_path(path) {
        current = current.as_object()?.get(segment)?;
    }
    if current.is_null() {
        None
    } else {
        Some(current)
    }
}

/// Set the value at a path, creating intermediate objects.
///
/// An intermediate value that is not an object is replaced. Setting the empty
/// path replaces the whole tree.
pub fn set_path(root: &mut Value, path: &str, value: Value) {
    set_segments(root, &split_path(path), value);
}

fn set_segments(current: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *current = value;
        return;
    };
    if !current.is_object() {
        *current = Value::Object(Map::new());
    }
    if let Value::Object(map) = current {
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        set_segments(child, rest, value);
    }
}

/// True for data that carries nothing: null or an empty object.
pub fn is_empty_data(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
