//! Configuration for the job-history store.
//!
//! Everything the store needs from its surroundings (write mode, path
//! overrides, environment variables) is captured once in a [`HistoryConfig`]
//! and passed in at construction. Path resolution is a pure function of it.

pub mod history_config;
pub mod paths;

pub use history_config::{AccessMode, EnvSnapshot, HistoryConfig};
pub use paths::{resolve_base_dir, resolve_db_path, resolve_legacy_path, resolve_user};
