//! `drona-migrate`: import a legacy `{user}_history.json` into the SQLite store.

use std::path::PathBuf;

use clap::Parser;

use drona_core::config::{resolve_legacy_path, AccessMode, HistoryConfig};
use drona_core::errors::{HistoryError, HistoryResult};
use drona_core::types::InsertMode;
use drona_storage::{JobHistoryStore, LegacyMigrator, MigrationOptions, MigrationReport};

/// Shown after a missing-source message.
pub const SOURCE_TIP: &str = "Tip: supply --user USER or --json PATH. Use -h for help.";

/// Migrate legacy JSON job history to SQLite (with optional cleanup).
#[derive(Parser, Debug)]
#[command(name = "drona-migrate", version)]
pub struct MigrateArgs {
    /// Username used to locate <base>/drona_composer/jobs/{user}_history.json
    #[arg(long)]
    pub user: Option<String>,

    /// Explicit path to the legacy JSON file (overrides --user)
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Explicit path to the SQLite DB (defaults to the shared history location)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overwrite existing records with the same drona_id
    #[arg(long)]
    pub overwrite: bool,

    /// Delete the JSON file after a successful migration
    #[arg(short = 'd', long = "delete")]
    pub delete: bool,
}

impl MigrateArgs {
    /// Migration always runs in admin mode.
    pub fn history_config(&self) -> HistoryResult<HistoryConfig> {
        let mut config = match &self.config {
            Some(path) => HistoryConfig::load(path)?,
            None => HistoryConfig::from_env(),
        };
        if let Some(user) = &self.user {
            config = config.with_user(user);
        }
        if let Some(json) = &self.json {
            config = config.with_legacy_path(json);
        }
        if let Some(db) = &self.db {
            config = config.with_db_path(db);
        }
        Ok(config.with_mode(AccessMode::Admin))
    }

    pub fn options(&self, config: &HistoryConfig) -> MigrationOptions {
        MigrationOptions {
            source: resolve_legacy_path(config),
            mode: if self.overwrite {
                InsertMode::Upsert
            } else {
                InsertMode::Strict
            },
            delete_source: self.delete,
        }
    }
}

/// Run the migration the arguments describe. A missing source is reported
/// before the database is created or opened.
pub fn run(args: &MigrateArgs) -> HistoryResult<MigrationReport> {
    let config = args.history_config()?;
    let options = args.options(&config);
    if !options.source.is_file() {
        return Err(HistoryError::SourceMissing {
            path: options.source,
        });
    }
    let store = JobHistoryStore::open(&config)?;
    LegacyMigrator::new(&store).migrate(&options)
}

/// Human-readable lines describing a finished run.
pub fn summary(report: &MigrationReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Migration complete. Inserted: {} | Errors: {} | DB: {}",
        report.inserted,
        report.errors,
        report.db_path.display()
    )];
    if report.source_deleted {
        lines.push(format!("Deleted legacy file: {}", report.source_path.display()));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> MigrateArgs {
        MigrateArgs::try_parse_from(std::iter::once("drona-migrate").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn flags_map_to_options() {
        let args = parse(&["--json", "/tmp/x.json", "--overwrite", "-d"]);
        let config = args.history_config().unwrap();
        assert_eq!(config.mode, AccessMode::Admin);
        let options = args.options(&config);
        assert_eq!(options.source, PathBuf::from("/tmp/x.json"));
        assert_eq!(options.mode, InsertMode::Upsert);
        assert!(options.delete_source);

        let options = parse(&[]).options(&parse(&[]).history_config().unwrap());
        assert_eq!(options.mode, InsertMode::Strict);
        assert!(!options.delete_source);
    }

    #[test]
    fn user_selects_legacy_file_name() {
        let args = parse(&["--user", "alice"]);
        let options = args.options(&args.history_config().unwrap());
        assert!(options.source.ends_with("drona_composer/jobs/alice_history.json"));
    }

    #[test]
    fn runs_migration_and_deletes_source() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("legacy.json");
        let db = dir.path().join("h.db");
        std::fs::write(
            &source,
            json!([
                {"job_id": "1", "environment": "slurm", "status": "done"},
                {"job_id": "2", "environment": "slurm"}
            ])
            .to_string(),
        )
        .unwrap();

        let args = parse(&[
            "--json",
            source.to_str().unwrap(),
            "--db",
            db.to_str().unwrap(),
            "-d",
        ]);
        let report = run(&args).unwrap();
        assert_eq!((report.inserted, report.errors), (2, 0));
        assert!(report.source_deleted);
        assert!(!source.exists());

        let lines = summary(&report);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Migration complete. Inserted: 2 | Errors: 0 | DB: "));
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = TempDir::new().unwrap();
        let args = parse(&[
            "--json",
            dir.path().join("absent.json").to_str().unwrap(),
            "--db",
            dir.path().join("h.db").to_str().unwrap(),
        ]);
        assert!(matches!(run(&args), Err(HistoryError::SourceMissing { .. })));
        assert!(!dir.path().join("h.db").exists());
    }
}
