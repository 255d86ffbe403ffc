//! The single error enum covering store, schema and migration operations.

use std::path::PathBuf;

use super::error_code::{self, HistoryErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    // Validation
    #[error("Record with drona_id {id} already exists")]
    Collision { id: String },

    #[error("Invalid record: {reason}")]
    InvalidRecord { reason: String },

    // Gating
    #[error("Write operation '{operation}' rejected: store is read-only")]
    WriteDisabled { operation: &'static str },

    // Payload
    #[error("env_params for {id} is not a JSON object and cannot be merged")]
    MalformedPayload { id: String },

    // Legacy source
    #[error("Legacy history JSON not found at {}", path.display())]
    SourceMissing { path: PathBuf },

    #[error("Legacy history JSON is invalid: {reason}")]
    InvalidSource { reason: String },

    // Storage
    #[error("History storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },

    #[error("Schema error: {message}")]
    Schema { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl HistoryErrorCode for HistoryError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Collision { .. } => error_code::COLLISION,
            Self::InvalidRecord { .. } => error_code::INVALID_RECORD,
            Self::WriteDisabled { .. } => error_code::WRITE_DISABLED,
            Self::MalformedPayload { .. } => error_code::MALFORMED_PAYLOAD,
            Self::SourceMissing { .. } => error_code::SOURCE_MISSING,
            Self::InvalidSource { .. } => error_code::INVALID_SOURCE,
            Self::StorageUnavailable { .. } => error_code::STORAGE_UNAVAILABLE,
            Self::Schema { .. } => error_code::SCHEMA_ERROR,
            Self::Storage(_) => error_code::STORAGE_ERROR,
            Self::Serialization(_) => error_code::SERIALIZATION_ERROR,
            Self::Io(_) => error_code::IO_ERROR,
            Self::Config(_) | Self::TomlParse(_) => error_code::CONFIG_ERROR,
        }
    }
}

pub type HistoryResult<T> = Result<T, HistoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = HistoryError::WriteDisabled { operation: "insert" };
        assert_eq!(err.error_code(), "WRITE_DISABLED");
        assert!(err.to_string().contains("read-only"));

        let err = HistoryError::Collision { id: "42".into() };
        assert_eq!(err.error_code(), "ID_COLLISION");
        assert_eq!(err.to_string(), "Record with drona_id 42 already exists");
    }

    #[test]
    fn source_missing_mentions_path() {
        let err = HistoryError::SourceMissing {
            path: PathBuf::from("/scratch/alice_history.json"),
        };
        assert!(err.to_string().contains("/scratch/alice_history.json"));
        assert_eq!(err.error_code(), "SOURCE_MISSING");
    }
}
