//! Structured logging setup.
//!
//! JSON events go to stderr. When a log directory is configured, the same
//! events are also written to a daily-rolling file through a non-blocking
//! writer; the returned [`LoggingGuard`] must outlive all logging.

use std::io;
use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix for rolled log files (`paperview.log.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "paperview.log";

/// Verbosity selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Only error-level events.
    Quiet,
    /// Info-level and above (default).
    #[default]
    Normal,
    /// Debug-level and above, including resource snapshots.
    Verbose,
}

impl Verbosity {
    pub fn directive(self) -> &'static str {
        match self {
            Verbosity::Quiet => "paperview=error",
            Verbosity::Normal => "paperview=info",
            Verbosity::Verbose => "paperview=debug",
        }
    }
}

/// Options for [`init_logging`].
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    pub verbosity: Verbosity,
    /// Directory for rolled log files. `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
}

/// Keeps the file writer alive. Dropping it flushes pending log lines.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize logging.
///
/// Must be called at most once per process.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created.
pub fn init_logging(options: &LoggingOptions) -> Result<LoggingGuard, io::Error> {
    let filter = build_filter(options.verbosity);

    let stderr_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(io::stderr)
        .with_current_span(false)
        .with_span_list(false);

    let Some(log_dir) = options.log_dir.as_deref() else {
        tracing_subscriber::registry()
            .with(stderr_layer)
            .with(filter)
            .init();
        return Ok(LoggingGuard { _file_guard: None });
    };

    let (writer, guard) = file_writer(log_dir)?;
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(writer)
        .with_ansi(false)
        .with_current_span(false)
        .with_span_list(false);

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(filter)
        .init();

    Ok(LoggingGuard {
        _file_guard: Some(guard),
    })
}

fn build_filter(verbosity: Verbosity) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    match verbosity.directive().parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

fn file_writer(
    log_dir: &Path,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard), io::Error> {
    std::fs::create_dir_all(log_dir)?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_directives() {
        assert_eq!(Verbosity::Quiet.directive(), "paperview=error");
        assert_eq!(Verbosity::Normal.directive(), "paperview=info");
        assert_eq!(Verbosity::Verbose.directive(), "paperview=debug");
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn test_file_writer_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");

        let (_writer, _guard) = file_writer(&log_dir).unwrap();

        assert!(log_dir.is_dir());
    }
}
