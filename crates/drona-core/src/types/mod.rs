//! Record and request types shared by the store, the migrator and the CLI.

pub mod record;
pub mod requests;

pub use record::{EnvParams, JobRecord, DISPLAY_COLUMNS};
pub use requests::{InsertMode, ListFilter, RecordUpdate};
