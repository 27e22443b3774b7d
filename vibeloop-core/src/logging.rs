//! Log setup for the vibeloop binary.
//!
//! Everything goes to a daily-rotated file under the XDG state dir
//! (`~/.local/state/vibeloop/vibeloop.log.<date>`). Stdout belongs to command
//! output, so nothing is ever logged there outside of tests.

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// File name stem; the appender adds the date suffix.
pub const LOG_FILE_PREFIX: &str = "vibeloop.log";

/// Start file logging for one CLI run.
///
/// `RUST_LOG` wins over `[logging] level` when set. Old files beyond
/// `max_files` are pruned by the appender on rotation. Keep the returned
/// guard alive until the command finishes or the tail of the log is lost.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    let log_dir = Config::state_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .max_log_files(config.max_files.max(1))
        .build(&log_dir)
        .map_err(|e| {
            Error::Config(format!("cannot open log file in {}: {}", log_dir.display(), e))
        })?;
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(&config.level)?,
    };

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("log subscriber already set: {}", e)))?;

    tracing::debug!(
        log_dir = %log_dir.display(),
        level = %config.level,
        keep = config.max_files,
        "vibeloop logging started"
    );

    Ok(LoggingGuard { _guard: guard })
}

/// Parse the configured level (or any `EnvFilter` directive string).
///
/// A typo in `config.toml` is reported instead of silently logging nothing.
pub fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level.trim())
        .map_err(|e| Error::Config(format!("invalid logging.level {:?}: {}", level, e)))
}

/// Route logs to the test harness output. Safe to call from every test.
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Flushes buffered log lines when dropped.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}
