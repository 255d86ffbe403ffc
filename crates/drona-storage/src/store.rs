//! `JobHistoryStore`: the job-history record store.
//!
//! Holds only the resolved database path, the access mode and whether the
//! backing directory was usable. Each operation opens a fresh connection,
//! does its work (mutations inside one transaction) and drops it on every
//! exit path.

use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use drona_core::config::{resolve_db_path, AccessMode, HistoryConfig};
use drona_core::errors::{HistoryError, HistoryResult};
use drona_core::merge;
use drona_core::submission::JobSubmission;
use drona_core::types::{EnvParams, InsertMode, JobRecord, ListFilter, RecordUpdate};

use crate::connection::{open_connection, prepare_directory};
use crate::queries::job_history as q;
use crate::schema::live_columns;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Availability {
    Available,
    Degraded { reason: String },
}

/// Result of [`JobHistoryStore::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StoreStatus {
    Available {
        path: PathBuf,
        mode: AccessMode,
        columns: Vec<String>,
        records: i64,
    },
    Unavailable {
        path: PathBuf,
        reason: String,
    },
}

impl StoreStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available { .. })
    }
}

/// The job-history record store.
#[derive(Debug, Clone)]
pub struct JobHistoryStore {
    db_path: PathBuf,
    mode: AccessMode,
    availability: Availability,
}

impl JobHistoryStore {
    /// Open the store described by `config`, creating the database directory
    /// and schema if needed. Fails if storage is not usable.
    pub fn open(config: &HistoryConfig) -> HistoryResult<Self> {
        let db_path = resolve_db_path(config);
        prepare_directory(&db_path)?;
        open_connection(&db_path).map_err(|e| unavailable_if_io(&db_path, e))?;
        debug!("job history store opened at {}", db_path.display());
        Ok(Self {
            db_path,
            mode: config.mode,
            availability: Availability::Available,
        })
    }

    /// Like [`open`](Self::open), but an unusable location yields a degraded
    /// store instead of an error: reads return nothing, writes fail with
    /// `StorageUnavailable`, and [`status`](Self::status) reports why.
    pub fn open_or_degrade(config: &HistoryConfig) -> Self {
        match Self::open(config) {
            Ok(store) => store,
            Err(e) => {
                let db_path = resolve_db_path(config);
                warn!(
                    "job history disabled, storage at {} unusable: {e}",
                    db_path.display()
                );
                Self {
                    db_path,
                    mode: config.mode,
                    availability: Availability::Degraded {
                        reason: e.to_string(),
                    },
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.availability, Availability::Degraded { .. })
    }

    /// Probe the backing database.
    pub fn status(&self) -> StoreStatus {
        if let Availability::Degraded { reason } = &self.availability {
            return StoreStatus::Unavailable {
                path: self.db_path.clone(),
                reason: reason.clone(),
            };
        }
        let probe = self.with_connection(|conn| {
            let columns: Vec<String> = live_columns(conn)?.into_iter().collect();
            let records = q::count_records(conn)?;
            Ok((columns, records))
        });
        match probe {
            Ok((columns, records)) => StoreStatus::Available {
                path: self.db_path.clone(),
                mode: self.mode,
                columns,
                records,
            },
            Err(e) => StoreStatus::Unavailable {
                path: self.db_path.clone(),
                reason: e.to_string(),
            },
        }
    }

    // ─── Reads ──────────────────────────────────────────────────────────

    /// Point lookup. `None` if no record has this id.
    pub fn get(&self, id: &str) -> HistoryResult<Option<JobRecord>> {
        if self.is_degraded() {
            return Ok(None);
        }
        self.with_connection(|conn| q::get_record(conn, id))
    }

    /// Records for one environment, newest first.
    pub fn list_by_environment(
        &self,
        environment: &str,
        filter: &ListFilter,
    ) -> HistoryResult<Vec<JobRecord>> {
        if self.is_degraded() {
            return Ok(Vec::new());
        }
        self.with_connection(|conn| q::list_records(conn, Some(environment), filter))
    }

    /// Records across all environments, newest first.
    pub fn list_all(&self, filter: &ListFilter) -> HistoryResult<Vec<JobRecord>> {
        if self.is_degraded() {
            return Ok(Vec::new());
        }
        self.with_connection(|conn| q::list_records(conn, None, filter))
    }

    /// The stored job description of one record.
    pub fn job(&self, id: &str) -> HistoryResult<Option<Value>> {
        Ok(self.get(id)?.map(|record| record.env_params.to_value()))
    }

    /// Every stored job description, newest first.
    pub fn history(&self) -> HistoryResult<Vec<Value>> {
        Ok(self
            .list_all(&ListFilter::default())?
            .into_iter()
            .map(|record| record.env_params.to_value())
            .collect())
    }

    // ─── Writes ─────────────────────────────────────────────────────────

    /// Insert a record. Strict mode rejects an existing id with `Collision`.
    pub fn insert(&self, record: &JobRecord, mode: InsertMode) -> HistoryResult<()> {
        self.require_writes("insert")?;
        self.with_connection(|conn| {
            let tx = conn.transaction()?;
            q::insert_record(&tx, record, mode)?;
            tx.commit()?;
            Ok(())
        })
    }

    /// Record a newly submitted job and return what was stored.
    pub fn save_submission(&self, submission: JobSubmission) -> HistoryResult<JobRecord> {
        self.require_writes("save_submission")?;
        let record = submission.into_record_now()?;
        self.insert(&record, InsertMode::Strict)?;
        debug!("saved job {} ({})", record.id, record.environment);
        Ok(record)
    }

    /// Update the supplied fields. An empty update writes nothing and returns
    /// the current record. `None` if the id does not exist.
    pub fn update(&self, id: &str, update: &RecordUpdate) -> HistoryResult<Option<JobRecord>> {
        self.require_writes("update")?;
        self.apply_edit(id, update, None)
    }

    /// Merge `value` into `env_params[key]`: set if absent, append to an
    /// array, otherwise wrap as `[old, value]`. `None` if the id does not
    /// exist.
    pub fn merge_key(&self, id: &str, key: &str, value: Value) -> HistoryResult<Option<JobRecord>> {
        self.require_writes("merge_key")?;
        self.apply_edit(id, &RecordUpdate::default(), Some((key, value)))
    }

    /// Field update plus an optional key merge in one transaction. If the
    /// merge fails nothing is written.
    pub fn edit(
        &self,
        id: &str,
        update: &RecordUpdate,
        merge: Option<(&str, Value)>,
    ) -> HistoryResult<Option<JobRecord>> {
        self.require_writes("edit")?;
        self.apply_edit(id, update, merge)
    }

    fn apply_edit(
        &self,
        id: &str,
        update: &RecordUpdate,
        merge: Option<(&str, Value)>,
    ) -> HistoryResult<Option<JobRecord>> {
        self.with_connection(|conn| {
            if update.is_empty() && merge.is_none() {
                return q::get_record(conn, id);
            }
            let tx = conn.transaction()?;
            let Some(mut record) = q::get_record(&tx, id)? else {
                return Ok(None);
            };
            if let Some((key, value)) = merge {
                let EnvParams::Parsed(Value::Object(params)) = &mut record.env_params else {
                    return Err(HistoryError::MalformedPayload { id: id.to_string() });
                };
                merge::merge_key(params, key, value);
                q::write_env_params(&tx, id, &record.env_params.to_stored()?)?;
            }
            if !update.is_empty() {
                q::update_fields(&tx, id, update)?;
            }
            let edited = q::get_record(&tx, id)?;
            tx.commit()?;
            Ok(edited)
        })
    }

    // ─── Internals ──────────────────────────────────────────────────────

    /// Reject mutations in read-only mode before any I/O, and on a degraded
    /// store.
    pub(crate) fn require_writes(&self, operation: &'static str) -> HistoryResult<()> {
        if !self.mode.allows_writes() {
            return Err(HistoryError::WriteDisabled { operation });
        }
        if let Availability::Degraded { reason } = &self.availability {
            return Err(HistoryError::StorageUnavailable {
                path: self.db_path.clone(),
                reason: reason.clone(),
            });
        }
        Ok(())
    }

    /// Run `f` on a fresh connection that is closed when this returns.
    pub(crate) fn with_connection<F, T>(&self, f: F) -> HistoryResult<T>
    where
        F: FnOnce(&mut Connection) -> HistoryResult<T>,
    {
        let mut conn = open_connection(&self.db_path)?;
        f(&mut conn)
    }
}

fn unavailable_if_io(path: &Path, e: HistoryError) -> HistoryError {
    match e {
        HistoryError::Storage(rusqlite::Error::SqliteFailure(ref f, _))
            if matches!(
                f.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::ReadOnly
                    | rusqlite::ErrorCode::PermissionDenied
            ) =>
        {
            HistoryError::StorageUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        }
        other => other,
    }
}
