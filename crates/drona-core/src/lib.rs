//! # drona-core
//!
//! Foundation crate for Drona job history.
//! Defines the record types, errors, configuration, form-data normalization
//! and legacy extraction rules. The storage crate depends on this.

pub mod config;
pub mod environment;
pub mod errors;
pub mod legacy;
pub mod merge;
pub mod normalize;
pub mod submission;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::{AccessMode, HistoryConfig};
pub use errors::{HistoryError, HistoryErrorCode, HistoryResult};
pub use normalize::normalize_form_data;
pub use submission::{GeneratedFiles, JobSubmission};
pub use types::{EnvParams, InsertMode, JobRecord, ListFilter, RecordUpdate};
