//! One-shot import of a legacy `{user}_history.json` document.
//!
//! Items are processed independently: a failure to extract or insert one
//! item is counted and logged, and the loop moves on. All successful inserts
//! share one transaction, committed once after the loop. Anything failing
//! outside the per-item step rolls the whole batch back.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use drona_core::errors::{HistoryError, HistoryResult};
use drona_core::legacy::{extract_legacy_record, legacy_job_id, parse_legacy_document};
use drona_core::types::InsertMode;

use crate::queries::job_history::insert_record;
use crate::store::JobHistoryStore;

/// What to import and how.
#[derive(Debug, Clone)]
pub struct MigrationOptions {
    /// The legacy JSON document.
    pub source: PathBuf,
    /// Strict fails an item whose id already exists; upsert overwrites it.
    pub mode: InsertMode,
    /// Delete the source afterwards, honoured only when no item failed.
    pub delete_source: bool,
}

/// One item that could not be migrated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Position in the legacy array.
    pub index: usize,
    pub job_id: String,
    pub reason: String,
}

/// Outcome of a migration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub inserted: usize,
    pub errors: usize,
    pub failures: Vec<ItemFailure>,
    pub source_deleted: bool,
    pub source_path: PathBuf,
    pub db_path: PathBuf,
}

/// Bulk importer from the legacy document into a [`JobHistoryStore`].
pub struct LegacyMigrator<'a> {
    store: &'a JobHistoryStore,
}

impl<'a> LegacyMigrator<'a> {
    pub fn new(store: &'a JobHistoryStore) -> Self {
        Self { store }
    }

    pub fn migrate(&self, options: &MigrationOptions) -> HistoryResult<MigrationReport> {
        self.store.require_writes("migrate")?;

        let source = &options.source;
        if !source.is_file() {
            return Err(HistoryError::SourceMissing {
                path: source.clone(),
            });
        }
        let items = parse_legacy_document(&std::fs::read_to_string(source)?)?;
        info!(
            "migrating {} legacy job(s) from {} ({:?})",
            items.len(),
            source.display(),
            options.mode
        );

        let failures = self.store.with_connection(|conn| {
            let tx = conn.transaction()?;
            let mut failures = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let outcome = extract_legacy_record(item)
                    .and_then(|record| insert_record(&tx, &record, options.mode));
                if let Err(e) = outcome {
                    let job_id = legacy_job_id(item);
                    warn!("failed to migrate job_id {job_id}: {e}");
                    failures.push(ItemFailure {
                        index,
                        job_id,
                        reason: e.to_string(),
                    });
                }
            }
            tx.commit()?;
            Ok(failures)
        })?;

        let errors = failures.len();
        let inserted = items.len() - errors;
        info!(
            "migration complete: inserted {inserted}, errors {errors}, db {}",
            self.store.path().display()
        );

        let source_deleted = match (options.delete_source, errors) {
            (false, _) => false,
            (true, 0) => match std::fs::remove_file(source) {
                Ok(()) => {
                    info!("deleted legacy history {}", source.display());
                    true
                }
                Err(e) => {
                    warn!("failed to delete legacy history {}: {e}", source.display());
                    false
                }
            },
            (true, _) => {
                warn!(
                    "not deleting {} because {errors} item(s) failed to migrate",
                    source.display()
                );
                false
            }
        };

        Ok(MigrationReport {
            inserted,
            errors,
            failures,
            source_deleted,
            source_path: source.clone(),
            db_path: self.store.path().to_path_buf(),
        })
    }
}
