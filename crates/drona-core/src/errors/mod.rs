//! Error taxonomy for job-history persistence and migration.

pub mod error_code;
pub mod history_error;

pub use error_code::HistoryErrorCode;
pub use history_error::{HistoryError, HistoryResult};
