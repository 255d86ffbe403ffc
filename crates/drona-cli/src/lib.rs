//! # drona-cli
//!
//! Argument handling and dispatch for the `drona-history` and
//! `drona-migrate` binaries. Kept in a library so dispatch is testable
//! without spawning processes.

pub mod history;
pub mod logging;
pub mod migrate;
pub mod output;

/// Exit status when a store or migration operation fails.
pub const EXIT_FAILURE: u8 = 1;
/// Exit status when the source document is missing (migration).
pub const EXIT_SOURCE_MISSING: u8 = 2;
/// Exit status when no operation was selected. Clap reports parse errors
/// with 2, so this is kept distinct.
pub const EXIT_NO_OPERATION: u8 = 3;
