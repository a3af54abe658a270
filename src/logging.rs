//! Diagnostic logging.
//!
//! Command output owns stdout, so log events go to stderr only. The filter
//! comes from `RECALL_LOG` (standard `EnvFilter` directives, e.g.
//! `RECALL_LOG=recall=debug`) and defaults to `warn`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "RECALL_LOG";

/// Filter used when `RECALL_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Build the filter from `RECALL_LOG`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Calling it again is a no-op.
pub fn init() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
