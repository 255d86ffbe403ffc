//! `HistoryConfig`: store settings from a TOML file, the environment, or code.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::HistoryResult;

/// Whether mutating operations are permitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    #[default]
    ReadOnly,
    Admin,
}

impl AccessMode {
    pub fn allows_writes(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Process environment captured at a single point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment. Non-UTF-8 entries are skipped.
    pub fn capture() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Build a snapshot from explicit pairs (tests, embedding callers).
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of a variable, treating empty strings as unset.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The user's home directory (`HOME`, falling back to `USERPROFILE`).
    pub fn home(&self) -> Option<PathBuf> {
        self.get("HOME")
            .or_else(|| self.get("USERPROFILE"))
            .map(PathBuf::from)
    }
}

/// Job-history configuration.
///
/// TOML layout:
///
/// ```toml
/// db_path = "$SCRATCH/drona_composer/jobs/job_history.db"
/// legacy_path = "~/old_history.json"
/// user = "alice"
/// mode = "admin"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Explicit database file. Wins over every environment default.
    pub db_path: Option<PathBuf>,
    /// Explicit legacy `{user}_history.json` document.
    pub legacy_path: Option<PathBuf>,
    /// Username used to locate the legacy document.
    pub user: Option<String>,
    /// Read-only unless explicitly switched to admin.
    pub mode: AccessMode,
    #[serde(skip)]
    pub env: EnvSnapshot,
}

impl HistoryConfig {
    /// Defaults plus the current process environment.
    pub fn from_env() -> Self {
        Self {
            env: EnvSnapshot::capture(),
            ..Self::default()
        }
    }

    /// Parse a TOML string; missing fields fall back to defaults.
    /// The environment snapshot is left empty.
    pub fn from_toml(toml_str: &str) -> HistoryResult<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Load a TOML file and attach the current process environment.
    pub fn load(path: &Path) -> HistoryResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(Self::from_toml(&raw)?.with_env(EnvSnapshot::capture()))
    }

    pub fn with_env(mut self, env: EnvSnapshot) -> Self {
        self.env = env;
        self
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn with_legacy_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.legacy_path = Some(path.into());
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_read_only() {
        let config = HistoryConfig::default();
        assert_eq!(config.mode, AccessMode::ReadOnly);
        assert!(!config.mode.allows_writes());
        assert!(AccessMode::Admin.allows_writes());
    }

    #[test]
    fn from_toml_partial() {
        let config = HistoryConfig::from_toml(
            r#"
            db_path = "/tmp/history.db"
            mode = "admin"
            "#,
        )
        .unwrap();
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/history.db")));
        assert_eq!(config.mode, AccessMode::Admin);
        assert!(config.user.is_none());
        assert!(config.legacy_path.is_none());
    }

    #[test]
    fn from_toml_rejects_unknown_mode() {
        assert!(HistoryConfig::from_toml(r#"mode = "superuser""#).is_err());
    }

    #[test]
    fn snapshot_treats_empty_as_unset() {
        let env = EnvSnapshot::from_pairs([("SCRATCH", ""), ("HOME", "/home/alice")]);
        assert_eq!(env.get("SCRATCH"), None);
        assert_eq!(env.home(), Some(PathBuf::from("/home/alice")));
    }
}
