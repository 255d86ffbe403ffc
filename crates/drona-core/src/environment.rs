//! Resolving the `environment` column from a submitted or legacy `runtime`.

use serde_json::Value;

/// Used when no runtime can be resolved.
pub const UNKNOWN_ENVIRONMENT: &str = "unknown";

/// `{value, label}` objects resolve to `value`, else `label`; plain strings
/// and numbers resolve to themselves. Empty strings count as unresolved.
pub fn runtime_environment(runtime: &Value) -> Option<String> {
    match runtime {
        Value::Object(pair) => pair
            .get("value")
            .and_then(scalar_text)
            .or_else(|| pair.get("label").and_then(scalar_text)),
        other => scalar_text(other),
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolves_pairs_and_strings() {
        assert_eq!(runtime_environment(&json!({"value": "slurm", "label": "SLURM"})).as_deref(), Some("slurm"));
        assert_eq!(runtime_environment(&json!({"value": "", "label": "SLURM"})).as_deref(), Some("SLURM"));
        assert_eq!(runtime_environment(&json!("pbs")).as_deref(), Some("pbs"));
        assert_eq!(runtime_environment(&json!("")), None);
        assert_eq!(runtime_environment(&json!(null)), None);
        assert_eq!(runtime_environment(&json!({})), None);
    }
}
