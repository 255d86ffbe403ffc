//! Field extraction rules for legacy `{user}_history.json` entries.
//!
//! The legacy document is a flat JSON array of job objects. Each entry maps
//! onto a canonical [`JobRecord`]; the whole entry is kept as `env_params`
//! so fields without a column stay recoverable.

use serde_json::Value;

use crate::environment::{runtime_environment, UNKNOWN_ENVIRONMENT};
use crate::errors::{HistoryError, HistoryResult};
use crate::types::{EnvParams, JobRecord};

/// Parse a legacy document into its entries.
pub fn parse_legacy_document(raw: &str) -> HistoryResult<Vec<Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Array(items) => Ok(items),
        other => Err(HistoryError::InvalidSource {
            reason: format!("expected a JSON array of jobs, found {}", json_kind(&other)),
        }),
    }
}

/// The entry's `job_id`, for reporting. Falls back to `"?"`.
pub fn legacy_job_id(item: &Value) -> String {
    item.get("job_id")
        .and_then(|id| scalar(id, "job_id").ok().flatten())
        .unwrap_or_else(|| "?".to_string())
}

/// Map one legacy entry to a canonical record.
pub fn extract_legacy_record(item: &Value) -> HistoryResult<JobRecord> {
    let Value::Object(fields) = item else {
        return Err(HistoryError::InvalidRecord {
            reason: format!("legacy entry is a JSON {}, not an object", json_kind(item)),
        });
    };

    let id = fields
        .get("job_id")
        .map(|v| scalar(v, "job_id"))
        .transpose()?
        .flatten()
        .ok_or_else(|| HistoryError::InvalidRecord {
            reason: "legacy entry has no job_id".to_string(),
        })?;

    let text = |key: &str| -> HistoryResult<Option<String>> {
        fields.get(key).map(|v| scalar(v, key)).transpose().map(Option::flatten)
    };

    Ok(JobRecord {
        id,
        name: text("name")?,
        environment: legacy_environment(item),
        location: text("location")?,
        runtime_meta: String::new(),
        start_time: text("timestamp")?,
        status: text("status")?,
        env_params: EnvParams::Parsed(item.clone()),
    })
}

/// `runtime` first, then `form_data.runtime`, then `"unknown"`.
pub fn legacy_environment(item: &Value) -> String {
    item.get("runtime")
        .and_then(runtime_environment)
        .or_else(|| {
            item.get("form_data")
                .filter(|fd| fd.is_object())
                .and_then(|fd| fd.get("runtime"))
                .and_then(runtime_environment)
        })
        .unwrap_or_else(|| UNKNOWN_ENVIRONMENT.to_string())
}

/// Text form of a scalar column value. Nested structures cannot be stored in a
/// text column and are rejected.
fn scalar(value: &Value, key: &str) -> HistoryResult<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Array(_) | Value::Object(_) => Err(HistoryError::InvalidRecord {
            reason: format!("{key} must be a scalar, found a JSON {}", json_kind(value)),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_canonical_fields() {
        let item = json!({
            "job_id": 918273,
            "name": "blast",
            "location": "/scratch/jobs/blast",
            "runtime": {"value": "slurm", "label": "SLURM"},
            "timestamp": "2024-01-02T10:00:00",
            "extra": {"keep": true}
        });
        let record = extract_legacy_record(&item).unwrap();
        assert_eq!(record.id, "918273");
        assert_eq!(record.name.as_deref(), Some("blast"));
        assert_eq!(record.environment, "slurm");
        assert_eq!(record.location.as_deref(), Some("/scratch/jobs/blast"));
        assert_eq!(record.start_time.as_deref(), Some("2024-01-02T10:00:00"));
        assert_eq!(record.status, None);
        assert_eq!(record.runtime_meta, "");
        assert_eq!(record.env_params, EnvParams::Parsed(item));
    }

    #[test]
    fn environment_falls_back_to_form_data() {
        assert_eq!(
            legacy_environment(&json!({"form_data": {"runtime": {"label": "PBS"}}})),
            "PBS"
        );
        assert_eq!(legacy_environment(&json!({"form_data": {"runtime": "local"}})), "local");
        assert_eq!(
            legacy_environment(&json!({"runtime": "", "form_data": {"runtime": "local"}})),
            "local"
        );
        assert_eq!(legacy_environment(&json!({"runtime": "direct"})), "direct");
        assert_eq!(legacy_environment(&json!({"name": "x"})), "unknown");
        assert_eq!(legacy_environment(&json!({"form_data": "runtime"})), "unknown");
    }

    #[test]
    fn missing_job_id_is_an_error() {
        let err = extract_legacy_record(&json!({"name": "x"})).unwrap_err();
        assert!(matches!(err, HistoryError::InvalidRecord { .. }));
        assert!(extract_legacy_record(&json!({"job_id": null})).is_err());
        assert!(extract_legacy_record(&json!("job")).is_err());
    }

    #[test]
    fn nested_status_is_rejected() {
        let err = extract_legacy_record(&json!({"job_id": "1", "status": {"s": 1}})).unwrap_err();
        assert!(err.to_string().contains("status"));
    }

    #[test]
    fn document_must_be_array() {
        assert_eq!(parse_legacy_document("[{}, {}]").unwrap().len(), 2);
        assert!(matches!(
            parse_legacy_document("{}").unwrap_err(),
            HistoryError::InvalidSource { .. }
        ));
        assert!(matches!(
            parse_legacy_document("not json").unwrap_err(),
            HistoryError::Serialization(_)
        ));
    }

    #[test]
    fn job_id_for_reporting() {
        assert_eq!(legacy_job_id(&json!({"job_id": 7})), "7");
        assert_eq!(legacy_job_id(&json!({})), "?");
    }
}
