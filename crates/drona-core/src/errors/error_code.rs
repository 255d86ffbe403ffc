//! Stable string codes for history errors.
//! Used by the CLI for machine-readable failure output.

pub const COLLISION: &str = "ID_COLLISION";
pub const WRITE_DISABLED: &str = "WRITE_DISABLED";
pub const MALFORMED_PAYLOAD: &str = "MALFORMED_PAYLOAD";
pub const SOURCE_MISSING: &str = "SOURCE_MISSING";
pub const INVALID_SOURCE: &str = "INVALID_SOURCE";
pub const STORAGE_UNAVAILABLE: &str = "STORAGE_UNAVAILABLE";
pub const SCHEMA_ERROR: &str = "SCHEMA_ERROR";
pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
pub const INVALID_RECORD: &str = "INVALID_RECORD";
pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";
pub const IO_ERROR: &str = "IO_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";

/// Implemented by every error type that crosses the library boundary.
pub trait HistoryErrorCode {
    fn error_code(&self) -> &'static str;
}
