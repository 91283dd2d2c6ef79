//! stderr logging for the CLI.

use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter, e.g. `lazyrun_store=debug`.
const LOG_ENV: &str = "LAZYRUN_LOG";

/// Install the global subscriber. `verbose` forces `debug`; otherwise
/// `$LAZYRUN_LOG` applies, defaulting to `warn`.
pub fn init(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .ok();
}
