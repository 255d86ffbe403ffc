//! `JobRecord`: one row of `job_history`.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{HistoryError, HistoryResult};

/// Scalar columns shown by default in CLI output (`env_params` excluded).
pub const DISPLAY_COLUMNS: [&str; 7] = [
    "drona_id",
    "name",
    "environment",
    "location",
    "runtime_meta",
    "start_time",
    "status",
];

/// The `env_params` blob as read back from storage.
///
/// A stored blob that no longer parses as JSON is kept verbatim rather than
/// dropped. Only ever produced by reads; records carrying a malformed blob
/// fail [`JobRecord::validate`]. Serializes untagged: parsed values as
/// themselves, malformed blobs as a JSON string of the raw text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EnvParams {
    Parsed(Value),
    Malformed(String),
}

impl EnvParams {
    /// Decode a stored text blob.
    pub fn from_stored(raw: String) -> Self {
        match serde_json::from_str(&raw) {
            Ok(value) => Self::Parsed(value),
            Err(e) => {
                tracing::debug!("env_params is not valid JSON, keeping raw text: {e}");
                Self::Malformed(raw)
            }
        }
    }

    /// Encode for storage. Malformed blobs are written back unchanged.
    pub fn to_stored(&self) -> HistoryResult<String> {
        match self {
            Self::Parsed(value) => Ok(serde_json::to_string(value)?),
            Self::Malformed(raw) => Ok(raw.clone()),
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Malformed(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        self.as_value().and_then(Value::as_object)
    }

    /// Presentation form: the parsed tree, or the raw text as a JSON string.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Parsed(value) => value.clone(),
            Self::Malformed(raw) => Value::String(raw.clone()),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl From<Value> for EnvParams {
    fn from(value: Value) -> Self {
        Self::Parsed(value)
    }
}

/// One job execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobRecord {
    #[serde(rename = "drona_id")]
    pub id: String,
    pub name: Option<String>,
    pub environment: String,
    pub location: Option<String>,
    pub runtime_meta: String,
    pub start_time: Option<String>,
    pub status: Option<String>,
    pub env_params: EnvParams,
}

impl JobRecord {
    /// A record with only the required fields set.
    pub fn new(id: impl Into<String>, environment: impl Into<String>, env_params: Value) -> Self {
        Self {
            id: id.into(),
            name: None,
            environment: environment.into(),
            location: None,
            runtime_meta: String::new(),
            start_time: None,
            status: None,
            env_params: EnvParams::Parsed(env_params),
        }
    }

    /// Check the write-time invariants: non-empty id and environment, and an
    /// `env_params` that is well-formed JSON.
    pub fn validate(&self) -> HistoryResult<()> {
        if self.id.is_empty() {
            return Err(HistoryError::InvalidRecord {
                reason: "drona_id must not be empty".to_string(),
            });
        }
        if self.environment.is_empty() {
            return Err(HistoryError::InvalidRecord {
                reason: format!("environment must not be empty (drona_id {})", self.id),
            });
        }
        if self.env_params.is_malformed() {
            return Err(HistoryError::InvalidRecord {
                reason: format!("env_params is not valid JSON (drona_id {})", self.id),
            });
        }
        Ok(())
    }

    /// The seven scalar columns as a JSON object, optionally with `env_params`.
    pub fn to_display(&self, include_env_params: bool) -> Value {
        let mut out = Map::new();
        out.insert("drona_id".into(), Value::String(self.id.clone()));
        out.insert("name".into(), opt_string(&self.name));
        out.insert("environment".into(), Value::String(self.environment.clone()));
        out.insert("location".into(), opt_string(&self.location));
        out.insert("runtime_meta".into(), Value::String(self.runtime_meta.clone()));
        out.insert("start_time".into(), opt_string(&self.start_time));
        out.insert("status".into(), opt_string(&self.status));
        if include_env_params {
            out.insert("env_params".into(), self.env_params.to_value());
        }
        Value::Object(out)
    }
}

fn opt_string(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}
