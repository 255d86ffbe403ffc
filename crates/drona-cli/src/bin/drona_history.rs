use std::process::ExitCode;

use tracing::debug;

use drona_cli::history::{execute, parse_invocation, HistoryArgs, Invocation, Operation, COMPACT_USAGE};
use drona_cli::logging::init_logging;
use drona_cli::output::render_json;
use drona_cli::{EXIT_FAILURE, EXIT_NO_OPERATION};
use drona_core::errors::{HistoryErrorCode, HistoryResult};
use drona_storage::JobHistoryStore;

fn main() -> ExitCode {
    let (args, operation) = match parse_invocation(std::env::args_os()) {
        Ok(Invocation::Run(args, operation)) => (args, operation),
        Ok(Invocation::Usage) => {
            eprintln!("{COMPACT_USAGE}");
            return ExitCode::from(EXIT_NO_OPERATION);
        }
        Err(e) => e.exit(),
    };
    init_logging();

    match run(&args, &operation) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error [{}]: {e}", e.error_code());
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(args: &HistoryArgs, operation: &Operation) -> HistoryResult<String> {
    let config = args.history_config()?;
    let store = match operation {
        Operation::Check => JobHistoryStore::open_or_degrade(&config),
        _ => JobHistoryStore::open(&config)?,
    };
    debug!("using history database {}", store.path().display());
    Ok(render_json(&execute(&store, operation, args.with_json)?))
}
