//! `job_history` schema management.
//!
//! Create-if-absent for the table, add any expected column missing from an
//! older database, then create the indexes. Never drops or renames columns,
//! and extra columns from newer writers are left alone.

use std::collections::BTreeSet;

use rusqlite::Connection;
use tracing::{debug, info};

use drona_core::errors::{HistoryError, HistoryResult};

pub const TABLE_NAME: &str = "job_history";

pub const JOB_HISTORY_TABLE_SQL: &str = "
    CREATE TABLE IF NOT EXISTS job_history (
        drona_id     TEXT PRIMARY KEY,
        name         TEXT,
        environment  TEXT NOT NULL,
        location     TEXT,
        runtime_meta TEXT NOT NULL DEFAULT '',
        start_time   TEXT,
        status       TEXT,
        env_params   TEXT NOT NULL
    );
";

pub const JOB_HISTORY_INDEX_SQL: &str = "
    CREATE INDEX IF NOT EXISTS idx_job_history_environment ON job_history(environment);
    CREATE INDEX IF NOT EXISTS idx_job_history_start_time ON job_history(start_time);
";

/// Every column the store reads or writes.
pub const EXPECTED_COLUMNS: [&str; 8] = [
    "drona_id",
    "name",
    "environment",
    "location",
    "runtime_meta",
    "start_time",
    "status",
    "env_params",
];

/// Bring the schema up to date. Idempotent. Returns the columns it added.
pub fn ensure_schema(conn: &Connection) -> HistoryResult<Vec<&'static str>> {
    conn.execute_batch(JOB_HISTORY_TABLE_SQL)
        .map_err(|e| schema_err("create job_history", e))?;

    let live = live_columns(conn)?;
    let mut added = Vec::new();
    for column in EXPECTED_COLUMNS {
        if live.contains(column) {
            continue;
        }
        let sql = format!(
            "ALTER TABLE {TABLE_NAME} ADD COLUMN {column} TEXT{}",
            column_default(column)
        );
        conn.execute_batch(&sql)
            .map_err(|e| schema_err(&format!("add column {column}"), e))?;
        info!("added missing column {TABLE_NAME}.{column}");
        added.push(column);
    }

    conn.execute_batch(JOB_HISTORY_INDEX_SQL)
        .map_err(|e| schema_err("create job_history indexes", e))?;

    if added.is_empty() {
        debug!("job_history schema is up to date");
    }
    Ok(added)
}

/// Column names currently present on `job_history`.
pub fn live_columns(conn: &Connection) -> HistoryResult<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({TABLE_NAME})"))
        .map_err(|e| schema_err("introspect job_history", e))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| schema_err("introspect job_history", e))?;

    let mut columns = BTreeSet::new();
    for name in names {
        columns.insert(name.map_err(|e| schema_err("introspect job_history", e))?);
    }
    Ok(columns)
}

fn column_default(column: &str) -> &'static str {
    match column {
        "runtime_meta" => " NOT NULL DEFAULT ''",
        _ => "",
    }
}

fn schema_err(step: &str, e: rusqlite::Error) -> HistoryError {
    HistoryError::Schema {
        message: format!("{step}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_names(conn: &Connection) -> BTreeSet<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'job_history'")
            .unwrap();
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .map(Result::unwrap)
            .collect();
        names
    }

    #[test]
    fn fresh_database_gets_full_schema() {
        let conn = Connection::open_in_memory().unwrap();
        let added = ensure_schema(&conn).unwrap();
        assert!(added.is_empty(), "create should not need ALTERs");

        let columns = live_columns(&conn).unwrap();
        for column in EXPECTED_COLUMNS {
            assert!(columns.contains(column), "missing {column}");
        }
        let indexes = index_names(&conn);
        assert!(indexes.contains("idx_job_history_environment"));
        assert!(indexes.contains("idx_job_history_start_time"));
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        let first = live_columns(&conn).unwrap();
        let added = ensure_schema(&conn).unwrap();
        assert!(added.is_empty());
        assert_eq!(first, live_columns(&conn).unwrap());
    }

    #[test]
    fn old_schema_is_evolved_without_data_loss() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE job_history (
                drona_id TEXT PRIMARY KEY,
                environment TEXT NOT NULL,
                env_params TEXT NOT NULL
            );
            INSERT INTO job_history VALUES ('1', 'slurm', '{}');",
        )
        .unwrap();

        let added = ensure_schema(&conn).unwrap();
        assert_eq!(
            added,
            vec!["name", "location", "runtime_meta", "start_time", "status"]
        );

        let (env, meta): (String, String) = conn
            .query_row(
                "SELECT environment, runtime_meta FROM job_history WHERE drona_id = '1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(env, "slurm");
        assert_eq!(meta, "");
    }

    #[test]
    fn superset_schema_is_tolerated() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn.execute_batch("ALTER TABLE job_history ADD COLUMN exit_code INTEGER")
            .unwrap();
        let added = ensure_schema(&conn).unwrap();
        assert!(added.is_empty());
        assert!(live_columns(&conn).unwrap().contains("exit_code"));
    }
}
