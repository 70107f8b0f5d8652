//! File-based structured logging
//!
//! The terminal belongs to the TUI, so log output goes to a daily rolling file
//! instead of stderr.

use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Environment variable holding a log filter (e.g. `pulseboard=debug`)
pub const ENV_VAR: &str = "PULSEBOARD_LOG";

const FALLBACK_LEVEL: &str = "info";

/// Picks the first usable filter from the environment and the configured level
///
/// # Arguments
/// * `env_value` - Contents of `PULSEBOARD_LOG`, if set
/// * `default_level` - Level from the config file
///
/// # Returns
/// A directive string that `EnvFilter` accepts
pub fn filter_directives(env_value: Option<&str>, default_level: &str) -> String {
    [env_value, Some(default_level)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|directives| !directives.is_empty() && EnvFilter::try_new(directives).is_ok())
        .unwrap_or(FALLBACK_LEVEL)
        .to_string()
}

/// Installs the global subscriber writing to `log_dir`
///
/// The returned guard flushes buffered lines when dropped and must be kept
/// alive until the program exits.
pub fn init(log_dir: &Path, default_level: &str) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = tracing_appender::rolling::daily(log_dir, "pulseboard.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_value = std::env::var(ENV_VAR).ok();
    let directives = filter_directives(env_value.as_deref(), default_level);

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .with_filter(EnvFilter::new(&directives)),
    );
    if subscriber.try_init().is_err() {
        tracing::debug!("Global tracing subscriber already initialized");
    }

    tracing::info!(log_dir = %log_dir.display(), filter = %directives, "Logging initialized");
    Ok(guard)
}
