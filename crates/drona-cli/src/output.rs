//! JSON presentation of records for the CLI.

use serde_json::{json, Value};

use drona_core::types::JobRecord;

/// Pretty JSON; object keys come out sorted.
pub fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn present(record: Option<&JobRecord>, include_json: bool) -> Value {
    match record {
        Some(record) => record.to_display(include_json),
        None => not_found(),
    }
}

pub fn present_list(records: &[JobRecord], include_json: bool) -> Value {
    Value::Array(
        records
            .iter()
            .map(|record| record.to_display(include_json))
            .collect(),
    )
}

pub fn not_found() -> Value {
    json!({"error": "not found"})
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_sorted() {
        let record = JobRecord::new("1", "slurm", json!({"b": 1, "a": 2}));
        let rendered = render_json(&present(Some(&record), true));
        let drona = rendered.find("\"drona_id\"").unwrap();
        let env = rendered.find("\"environment\"").unwrap();
        let status = rendered.find("\"status\"").unwrap();
        assert!(drona < env && env < status);
    }

    #[test]
    fn missing_record_is_error_object() {
        assert_eq!(present(None, false), json!({"error": "not found"}));
    }
}
