//! Per-operation SQLite connections.
//!
//! Every store operation opens its own connection, applies PRAGMAs, ensures
//! the schema, does its work and drops the connection. There is no shared
//! connection state between operations.

pub mod pragmas;

use std::path::Path;

use rusqlite::Connection;

use drona_core::errors::{HistoryError, HistoryResult};

use crate::schema::ensure_schema;

/// Create the parent directory of `path` if needed.
pub fn prepare_directory(path: &Path) -> HistoryResult<()> {
    let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) else {
        return Ok(());
    };
    std::fs::create_dir_all(parent).map_err(|e| HistoryError::StorageUnavailable {
        path: parent.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Open a read-write connection with PRAGMAs applied and the schema ensured.
pub fn open_connection(path: &Path) -> HistoryResult<Connection> {
    let conn = Connection::open(path)?;
    pragmas::apply_pragmas(&conn)?;
    ensure_schema(&conn)?;
    Ok(conn)
}
