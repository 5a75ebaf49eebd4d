use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "VKV_LOG";

/// Initialize structured logging with environment filter.
/// Set VKV_LOG=debug (or trace, info, warn, error) for verbosity control;
/// `fallback_level` applies when the variable is unset or unparsable.
///
/// The layer is loaded into processes that may already have installed a
/// global subscriber, so an existing one is left in place.
pub fn init_logging(fallback_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}
