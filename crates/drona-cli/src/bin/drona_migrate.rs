use std::process::ExitCode;

use clap::Parser;

use drona_cli::logging::init_logging;
use drona_cli::migrate::{run, summary, MigrateArgs, SOURCE_TIP};
use drona_cli::{EXIT_FAILURE, EXIT_SOURCE_MISSING};
use drona_core::errors::{HistoryError, HistoryErrorCode};

fn main() -> ExitCode {
    init_logging();
    let args = MigrateArgs::parse();

    match run(&args) {
        Ok(report) => {
            for line in summary(&report) {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(HistoryError::SourceMissing { path }) => {
            eprintln!("Legacy JSON not found: {}", path.display());
            eprintln!("{SOURCE_TIP}");
            ExitCode::from(EXIT_SOURCE_MISSING)
        }
        Err(e) => {
            eprintln!("error [{}]: {e}", e.error_code());
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
