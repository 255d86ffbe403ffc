//! Builds the canonical record for a newly submitted job.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::environment::{runtime_environment, UNKNOWN_ENVIRONMENT};
use crate::errors::{HistoryError, HistoryResult};
use crate::normalize::normalize_form_data;
use crate::types::JobRecord;

/// Scripts produced for the job by the composer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFiles {
    pub bash_script: Option<String>,
    pub driver_script: Option<String>,
}

/// A job as handed over by the submission front end.
#[derive(Debug, Clone, Default)]
pub struct JobSubmission {
    /// Raw form fields, including `*_label` companions.
    pub form: Map<String, Value>,
    /// Names of files uploaded with the submission.
    pub uploaded_files: Vec<String>,
    pub generated_files: GeneratedFiles,
    /// Caller-assigned id; generated when absent.
    pub job_id: Option<String>,
}

impl JobSubmission {
    pub fn new(form: Map<String, Value>) -> Self {
        Self {
            form,
            ..Self::default()
        }
    }

    /// Build the record stored for this submission, stamped with the current
    /// local time.
    pub fn into_record_now(self) -> HistoryResult<JobRecord> {
        self.into_record(Local::now())
    }

    /// Build the record stored for this submission at time `now`.
    pub fn into_record(self, now: DateTime<Local>) -> HistoryResult<JobRecord> {
        let timestamp = now.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        let job_id = self.job_id.unwrap_or_else(generate_job_id);

        let field = |key: &str| self.form.get(key).cloned().unwrap_or(Value::Null);
        let name = self.form.get("name").and_then(Value::as_str).map(str::to_string);
        let location = self
            .form
            .get("location")
            .and_then(Value::as_str)
            .map(str::to_string);

        let additional_files = match self.form.get("additional_files") {
            None | Some(Value::Null) => json!({}),
            Some(Value::String(raw)) => {
                serde_json::from_str(raw).map_err(|e| HistoryError::InvalidRecord {
                    reason: format!("additional_files is not valid JSON: {e}"),
                })?
            }
            Some(other) => other.clone(),
        };

        let runtime = field("runtime");
        let environment =
            runtime_environment(&runtime).unwrap_or_else(|| UNKNOWN_ENVIRONMENT.to_string());
        let form_data = normalize_form_data(&self.form, location.as_deref());

        let env_params = json!({
            "job_id": job_id,
            "name": name,
            "location": location,
            "runtime": runtime,
            "env_dir": field("env_dir"),
            "timestamp": timestamp,
            "uploaded_files": self.uploaded_files,
            "generated_files": self.generated_files,
            "script": field("run_command"),
            "driver": field("driver"),
            "additional_files": additional_files,
            "form_data": form_data,
        });

        let mut record = JobRecord::new(job_id, environment, env_params);
        record.name = name;
        record.location = location;
        record.start_time = Some(timestamp);
        Ok(record)
    }
}

/// Random 36-bit id rendered in decimal.
pub fn generate_job_id() -> String {
    (uuid::Uuid::new_v4().as_u128() & 0xF_FFFF_FFFF).to_string()
}
