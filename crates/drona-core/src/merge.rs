//! Key merge into an `env_params` object.

use serde_json::{Map, Value};

/// Merge `value` under `key`:
/// - absent key: set it;
/// - existing array: append;
/// - any other existing value: replace with `[old, value]`.
pub fn merge_key(params: &mut Map<String, Value>, key: &str, value: Value) {
    match params.get_mut(key) {
        None => {
            params.insert(key.to_string(), value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let old = existing.take();
            *existing = Value::Array(vec![old, value]);
        }
    }
}
