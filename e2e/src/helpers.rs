use log::*;
use serde_json::Value;

/// True if every field present in `part` is present in `complete` with a matching value. Arrays must match in length
/// and element-wise; scalars must be equal.
pub fn value_is_subset_of(part: &Value, complete: &Value) -> bool {
    match (part, complete) {
        (Value::Null, _) => true,
        (Value::Object(part), Value::Object(complete)) => part.iter().all(|(key, value)| match complete.get(key) {
            Some(c) => value_is_subset_of(value, c),
            None => {
                error!("Key not found: {key}");
                false
            },
        }),
        (Value::Object(_), _) => {
            error!("Expected an object, got {complete}");
            false
        },
        (Value::Array(p), Value::Array(c)) => {
            if p.len() != c.len() {
                error!("Array length mismatch: {} != {}", p.len(), c.len());
                return false;
            }
            p.iter().zip(c.iter()).all(|(p, c)| value_is_subset_of(p, c))
        },
        _ => part == complete,
    }
}
