//! tracing-subscriber setup shared by the binaries.

use tracing_subscriber::EnvFilter;

/// Install a stderr subscriber. `RUST_LOG` overrides the default `warn`
/// level. Stdout is left for JSON output.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
