//! Form-data normalization for job submissions.
//!
//! Pairs `<key>` / `<key>_label` fields into `{value, label}` objects and
//! rewrites stale `filepath` entries in JSON-encoded file-descriptor lists so
//! they point into the job's location directory.

use std::path::Path;

use serde_json::{Map, Value};

/// Suffix marking a display label for the field named by the stripped key.
pub const LABEL_SUFFIX: &str = "_label";

/// Normalize a flat submitted form into the canonical `form_data` fragment.
///
/// `location` is the job directory used to rebuild file paths; without it no
/// path rewriting happens.
pub fn normalize_form_data(form: &Map<String, Value>, location: Option<&str>) -> Map<String, Value> {
    let mut normalized = pair_labels(form);
    if let Some(location) = location {
        for value in normalized.values_mut() {
            if let Some(rewritten) = rewrite_file_descriptors(value, location) {
                *value = rewritten;
            }
        }
    }
    normalized
}

fn pair_labels(form: &Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, value) in form {
        if let Some(base) = label_base(key) {
            // Consumed by its plain counterpart.
            if form.contains_key(base) {
                continue;
            }
            out.insert(key.clone(), value.clone());
            continue;
        }

        match form.get(&format!("{key}{LABEL_SUFFIX}")) {
            Some(label) => {
                let mut pair = Map::new();
                pair.insert("value".to_string(), value.clone());
                pair.insert("label".to_string(), label.clone());
                out.insert(key.clone(), Value::Object(pair));
            }
            None => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    out
}

/// Base key for a label key, if `key` is one. A key whose base is itself a
/// label key is not paired, so nothing is silently dropped.
fn label_base(key: &str) -> Option<&str> {
    key.strip_suffix(LABEL_SUFFIX)
        .filter(|base| !base.ends_with(LABEL_SUFFIX))
}

/// If `value` is a string holding a JSON array of `{filename, filepath, ..}`
/// objects, return the array with every `filepath` recomputed as
/// `location/filename`. Any other shape yields `None`.
fn rewrite_file_descriptors(value: &Value, location: &str) -> Option<Value> {
    let Value::String(raw) = value else {
        return None;
    };
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) else {
        return None;
    };

    let mut rewritten = Vec::with_capacity(items.len());
    for item in items {
        let Value::Object(mut descriptor) = item else {
            return None;
        };
        if !descriptor.contains_key("filepath") {
            return None;
        }
        let filename = descriptor.get("filename")?.as_str()?;
        let filepath = Path::new(location).join(filename);
        descriptor.insert(
            "filepath".to_string(),
            Value::String(filepath.to_string_lossy().into_owned()),
        );
        rewritten.push(Value::Object(descriptor));
    }
    Some(Value::Array(rewritten))
}
