//! SQLite PRAGMA configuration.
//! Must be applied on every connection immediately after opening.

use rusqlite::Connection;

use drona_core::errors::HistoryResult;

/// WAL so readers never block the single writer; `busy_timeout` so concurrent
/// processes wait on the lock instead of failing.
pub fn apply_pragmas(conn: &Connection) -> HistoryResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA temp_store = MEMORY;
        ",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_wal_or_memory() {
        let conn = Connection::open_in_memory().unwrap();
        apply_pragmas(&conn).unwrap();

        let journal_mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        // In-memory databases report "memory" instead of "wal"
        assert!(
            journal_mode == "wal" || journal_mode == "memory",
            "Expected wal or memory, got: {}",
            journal_mode
        );
    }

    #[test]
    fn sets_busy_timeout_and_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        apply_pragmas(&conn).unwrap();

        let timeout: i64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);
        let fk: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
