//! job_history table queries.

use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use drona_core::errors::{HistoryError, HistoryResult};
use drona_core::types::{EnvParams, InsertMode, JobRecord, ListFilter, RecordUpdate};

const SELECT_COLUMNS: &str = "SELECT drona_id, name, environment, location, runtime_meta,
        start_time, status, env_params
    FROM job_history";

/// Later start times first; NULL sorts as the empty string, i.e. last.
const ORDER_BY: &str = "ORDER BY COALESCE(start_time, '') DESC, drona_id DESC";

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
    // Columns added by schema evolution may hold NULL on old rows.
    let env_params: Option<String> = row.get(7)?;
    Ok(JobRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        environment: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        location: row.get(3)?,
        runtime_meta: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
        start_time: row.get(5)?,
        status: row.get(6)?,
        env_params: env_params
            .map(EnvParams::from_stored)
            .unwrap_or(EnvParams::Parsed(serde_json::Value::Null)),
    })
}

/// Point lookup by `drona_id`.
pub fn get_record(conn: &Connection, id: &str) -> HistoryResult<Option<JobRecord>> {
    let mut stmt = conn.prepare_cached(&format!("{SELECT_COLUMNS} WHERE drona_id = ?1"))?;
    Ok(stmt.query_row(params![id], row_to_record).optional()?)
}

pub fn record_exists(conn: &Connection, id: &str) -> HistoryResult<bool> {
    let mut stmt = conn.prepare_cached("SELECT 1 FROM job_history WHERE drona_id = ?1")?;
    Ok(stmt.exists(params![id])?)
}

pub fn count_records(conn: &Connection) -> HistoryResult<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM job_history", [], |row| row.get(0))?)
}

/// Filtered, ordered listing. `environment: None` lists every environment.
pub fn list_records(
    conn: &Connection,
    environment: Option<&str>,
    filter: &ListFilter,
) -> HistoryResult<Vec<JobRecord>> {
    let mut clauses = Vec::new();
    let mut values: Vec<SqlValue> = Vec::new();
    if let Some(environment) = environment {
        clauses.push("environment = ?");
        values.push(environment.to_string().into());
    }
    if let Some(after) = &filter.start_after {
        clauses.push("start_time >= ?");
        values.push(after.clone().into());
    }
    if let Some(before) = &filter.start_before {
        clauses.push("start_time < ?");
        values.push(before.clone().into());
    }

    let mut sql = SELECT_COLUMNS.to_string();
    if !clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clauses.join(" AND "));
    }
    sql.push(' ');
    sql.push_str(ORDER_BY);
    if let Some(limit) = filter.effective_limit() {
        // SQLite integers are i64; anything larger is as good as unlimited.
        sql.push_str(" LIMIT ?");
        values.push(i64::try_from(limit).unwrap_or(i64::MAX).into());
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(values), row_to_record)?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Insert one record. Strict mode fails with `Collision` on an existing id;
/// upsert replaces the whole row.
pub fn insert_record(conn: &Connection, record: &JobRecord, mode: InsertMode) -> HistoryResult<()> {
    record.validate()?;
    let env_params = record.env_params.to_stored()?;

    let verb = match mode {
        InsertMode::Strict => {
            if record_exists(conn, &record.id)? {
                return Err(HistoryError::Collision { id: record.id.clone() });
            }
            "INSERT"
        }
        InsertMode::Upsert => "INSERT OR REPLACE",
    };

    let sql = format!(
        "{verb} INTO job_history
         (drona_id, name, environment, location, runtime_meta, start_time, status, env_params)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
    );
    conn.prepare_cached(&sql)?
        .execute(params![
            record.id,
            record.name,
            record.environment,
            record.location,
            record.runtime_meta,
            record.start_time,
            record.status,
            env_params,
        ])
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(ref f, _)
                if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                HistoryError::Collision { id: record.id.clone() }
            }
            other => other.into(),
        })?;
    Ok(())
}

/// Write only the supplied fields. Returns the number of rows changed.
pub fn update_fields(conn: &Connection, id: &str, update: &RecordUpdate) -> HistoryResult<usize> {
    let mut assignments = Vec::new();
    let mut values: Vec<&str> = Vec::new();
    if let Some(status) = update.status.as_deref() {
        assignments.push("status = ?");
        values.push(status);
    }
    if let Some(runtime_meta) = update.runtime_meta.as_deref() {
        assignments.push("runtime_meta = ?");
        values.push(runtime_meta);
    }
    if let Some(start_time) = update.start_time.as_deref() {
        assignments.push("start_time = ?");
        values.push(start_time);
    }
    if assignments.is_empty() {
        return Ok(0);
    }
    values.push(id);

    let sql = format!(
        "UPDATE job_history SET {} WHERE drona_id = ?",
        assignments.join(", ")
    );
    Ok(conn.execute(&sql, params_from_iter(values))?)
}

/// Replace the stored `env_params` blob.
pub fn write_env_params(conn: &Connection, id: &str, env_params: &str) -> HistoryResult<usize> {
    Ok(conn.execute(
        "UPDATE job_history SET env_params = ?1 WHERE drona_id = ?2",
        params![env_params, id],
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ensure_schema;
    use serde_json::json;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn record(id: &str, env: &str, start: Option<&str>) -> JobRecord {
        let mut r = JobRecord::new(id, env, json!({"job_id": id}));
        r.start_time = start.map(str::to_string);
        r
    }

    #[test]
    fn strict_insert_collides() {
        let conn = conn();
        insert_record(&conn, &record("1", "slurm", None), InsertMode::Strict).unwrap();
        let err = insert_record(&conn, &record("1", "pbs", None), InsertMode::Strict).unwrap_err();
        assert!(matches!(err, HistoryError::Collision { ref id } if id == "1"));
        assert_eq!(get_record(&conn, "1").unwrap().unwrap().environment, "slurm");
    }

    #[test]
    fn upsert_replaces_whole_row() {
        let conn = conn();
        let mut first = record("1", "slurm", Some("2024-01-01"));
        first.status = Some("running".into());
        insert_record(&conn, &first, InsertMode::Strict).unwrap();
        insert_record(&conn, &record("1", "pbs", None), InsertMode::Upsert).unwrap();

        let stored = get_record(&conn, "1").unwrap().unwrap();
        assert_eq!(stored.environment, "pbs");
        assert_eq!(stored.status, None);
        assert_eq!(stored.start_time, None);
        assert_eq!(count_records(&conn).unwrap(), 1);
    }

    #[test]
    fn list_filters_by_environment_and_range() {
        let conn = conn();
        for (id, env, start) in [
            ("a", "slurm", "2024-01-01"),
            ("b", "slurm", "2024-01-05"),
            ("c", "slurm", "2024-01-10"),
            ("d", "pbs", "2024-01-05"),
        ] {
            insert_record(&conn, &record(id, env, Some(start)), InsertMode::Strict).unwrap();
        }

        let filter = ListFilter {
            start_after: Some("2024-01-05".into()),
            start_before: Some("2024-01-10".into()),
            limit: None,
        };
        let ids: Vec<String> = list_records(&conn, Some("slurm"), &filter)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["b"]);

        let filter = ListFilter {
            limit: Some(2),
            ..Default::default()
        };
        let ids: Vec<String> = list_records(&conn, None, &filter)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["c", "d"]);
    }

    #[test]
    fn update_only_touches_supplied_fields() {
        let conn = conn();
        let mut r = record("1", "slurm", Some("2024-01-01"));
        r.runtime_meta = "node17".into();
        insert_record(&conn, &r, InsertMode::Strict).unwrap();

        let changed = update_fields(
            &conn,
            "1",
            &RecordUpdate {
                status: Some("completed".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(changed, 1);

        let stored = get_record(&conn, "1").unwrap().unwrap();
        assert_eq!(stored.status.as_deref(), Some("completed"));
        assert_eq!(stored.runtime_meta, "node17");
        assert_eq!(stored.start_time.as_deref(), Some("2024-01-01"));
        assert_eq!(update_fields(&conn, "1", &RecordUpdate::default()).unwrap(), 0);
    }

    #[test]
    fn malformed_blob_is_surfaced_raw() {
        let conn = conn();
        conn.execute(
            "INSERT INTO job_history (drona_id, environment, env_params) VALUES ('x', 'slurm', '{broken')",
            [],
        )
        .unwrap();
        let stored = get_record(&conn, "x").unwrap().unwrap();
        assert_eq!(stored.env_params, EnvParams::Malformed("{broken".into()));
    }

    #[test]
    fn insert_rejects_malformed_env_params() {
        let conn = conn();
        let mut r = record("bad", "slurm", None);
        r.env_params = EnvParams::Malformed("garbage".into());
        for mode in [InsertMode::Strict, InsertMode::Upsert] {
            let err = insert_record(&conn, &r, mode).unwrap_err();
            assert!(matches!(err, HistoryError::InvalidRecord { .. }));
        }
        assert!(!record_exists(&conn, "bad").unwrap());
    }

    #[test]
    fn oversized_limit_lists_everything() {
        let conn = conn();
        for id in ["a", "b", "c"] {
            insert_record(&conn, &record(id, "slurm", None), InsertMode::Strict).unwrap();
        }
        let filter = ListFilter {
            limit: Some(usize::MAX),
            ..Default::default()
        };
        assert_eq!(list_records(&conn, None, &filter).unwrap().len(), 3);
        assert_eq!(list_records(&conn, Some("slurm"), &filter).unwrap().len(), 3);
    }
}
