//! # drona-storage
//!
//! SQLite persistence layer for Drona job history.
//! WAL mode, connection per operation, idempotent schema evolution,
//! and the legacy JSON importer.

pub mod connection;
pub mod migrate;
pub mod queries;
pub mod schema;
pub mod store;

pub use migrate::{LegacyMigrator, MigrationOptions, MigrationReport};
pub use schema::ensure_schema;
pub use store::{JobHistoryStore, StoreStatus};
