//! `drona-history`: look up, list and (with `--edit`) modify job records.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;

use drona_core::config::{AccessMode, HistoryConfig};
use drona_core::errors::HistoryResult;
use drona_core::types::{ListFilter, RecordUpdate};
use drona_storage::JobHistoryStore;

use crate::output::{present, present_list};

/// One-line usage printed when invoked without arguments.
pub const COMPACT_USAGE: &str = "Usage: drona-history [-h] [--db PATH] [-j|--with-json] \
(-a|--all | -i ID | -e ENV [--after ISO] [--before ISO] [--limit N]) \
[--edit -i ID [--status STATUS] [--runtime-meta META] [--start-time ISO] \
[--merge-key KEY --merge-value VALUE]]";

/// Read job history from the Drona SQLite database (read-only unless --edit is used).
#[derive(Parser, Debug)]
#[command(name = "drona-history", version)]
pub struct HistoryArgs {
    /// Path to the SQLite file (overrides environment defaults)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Include env_params JSON in output
    #[arg(short = 'j', long = "with-json")]
    pub with_json: bool,

    /// Get a record by drona_id
    #[arg(short = 'i', long = "id")]
    pub id: Option<String>,

    /// List records by environment
    #[arg(short = 'e', long = "env")]
    pub environment: Option<String>,

    /// List all records
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Filter start_time >= ISO8601
    #[arg(long)]
    pub after: Option<String>,

    /// Filter start_time < ISO8601
    #[arg(long)]
    pub before: Option<String>,

    /// Max results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Report whether the history database is usable
    #[arg(long)]
    pub check: bool,

    /// Enable editing of status, runtime_meta, start_time and env_params (requires -i).
    /// Field updates and --merge-key are applied together or not at all
    #[arg(long, requires = "id")]
    pub edit: bool,

    /// New status (with --edit)
    #[arg(long, requires = "edit")]
    pub status: Option<String>,

    /// New runtime_meta (with --edit)
    #[arg(long = "runtime-meta", requires = "edit")]
    pub runtime_meta: Option<String>,

    /// New start_time (with --edit)
    #[arg(long = "start-time", requires = "edit")]
    pub start_time: Option<String>,

    /// env_params key to add or merge into (with --edit)
    #[arg(long = "merge-key", requires_all = ["edit", "merge_value"])]
    pub merge_key: Option<String>,

    /// Value for --merge-key; parsed as JSON, else stored as a string
    #[arg(long = "merge-value", requires = "merge_key")]
    pub merge_value: Option<String>,
}

/// What a parsed command line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Check,
    Edit {
        id: String,
        update: RecordUpdate,
        merge: Option<(String, Value)>,
    },
    Get {
        id: String,
    },
    ListAll {
        filter: ListFilter,
    },
    ListByEnvironment {
        environment: String,
        filter: ListFilter,
    },
}

impl HistoryArgs {
    /// The selected operation, or `None` if the flags select nothing.
    pub fn operation(&self) -> Option<Operation> {
        if self.check {
            return Some(Operation::Check);
        }
        if self.edit {
            return Some(Operation::Edit {
                id: self.id.clone()?,
                update: RecordUpdate {
                    status: self.status.clone(),
                    runtime_meta: self.runtime_meta.clone(),
                    start_time: self.start_time.clone(),
                },
                merge: self
                    .merge_key
                    .clone()
                    .zip(self.merge_value.as_deref().map(parse_merge_value)),
            });
        }

        let filter = ListFilter {
            start_after: self.after.clone(),
            start_before: self.before.clone(),
            limit: self.limit,
        };
        match (&self.id, &self.environment, self.all) {
            (None, None, true) => Some(Operation::ListAll { filter }),
            (Some(id), None, _) => Some(Operation::Get { id: id.clone() }),
            (None, Some(environment), _) => Some(Operation::ListByEnvironment {
                environment: environment.clone(),
                filter,
            }),
            _ => None,
        }
    }

    /// Configuration: the `--config` file or the process environment, with
    /// `--db` on top. Only `--edit` switches to admin mode.
    pub fn history_config(&self) -> HistoryResult<HistoryConfig> {
        let mut config = match &self.config {
            Some(path) => HistoryConfig::load(path)?,
            None => HistoryConfig::from_env(),
        };
        if let Some(db) = &self.db {
            config = config.with_db_path(db);
        }
        let mode = if self.edit {
            AccessMode::Admin
        } else {
            AccessMode::ReadOnly
        };
        Ok(config.with_mode(mode))
    }
}

/// How a `drona-history` command line should be handled.
#[derive(Debug)]
pub enum Invocation {
    /// Print [`COMPACT_USAGE`] and exit with [`EXIT_NO_OPERATION`](crate::EXIT_NO_OPERATION).
    Usage,
    Run(HistoryArgs, Operation),
}

/// Parse a full argv (program name first). No arguments at all, or flags
/// that select no operation, yield [`Invocation::Usage`].
pub fn parse_invocation<I, T>(argv: I) -> Result<Invocation, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
    if argv.len() <= 1 {
        return Ok(Invocation::Usage);
    }
    let args = HistoryArgs::try_parse_from(argv)?;
    Ok(match args.operation() {
        Some(operation) => Invocation::Run(args, operation),
        None => Invocation::Usage,
    })
}

/// `--merge-value` is JSON when it parses, a plain string otherwise.
pub fn parse_merge_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Run an operation and return the JSON to print.
pub fn execute(store: &JobHistoryStore, operation: &Operation, include_json: bool) -> HistoryResult<Value> {
    match operation {
        Operation::Check => Ok(serde_json::to_value(store.status())?),
        Operation::Get { id } => Ok(present(store.get(id)?.as_ref(), include_json)),
        Operation::ListAll { filter } => Ok(present_list(&store.list_all(filter)?, include_json)),
        Operation::ListByEnvironment {
            environment,
            filter,
        } => Ok(present_list(
            &store.list_by_environment(environment, filter)?,
            include_json,
        )),
        Operation::Edit { id, update, merge } => {
            let merge = merge.as_ref().map(|(key, value)| (key.as_str(), value.clone()));
            Ok(present(store.edit(id, update, merge)?.as_ref(), include_json))
        }
    }
}
