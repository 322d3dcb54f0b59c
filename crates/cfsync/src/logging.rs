//! Logging setup
//!
//! Console output plus an append-only log file. The subscriber is scoped to
//! the returned guard rather than installed process-wide.

use std::path::Path;
use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::fmt::format::{DefaultFields, Format, Full};
use tracing_subscriber::{EnvFilter, fmt};

/// Log file name inside the cfsync directory
pub const LOG_FILE_NAME: &str = "dns_update.log";

/// Dependency targets that are far too chatty at debug level
const QUIET_TARGETS: &str = "hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn,lettre=warn";

/// Keeps logging alive; dropping it flushes the file writer
pub struct LogGuard {
    _subscriber: DefaultGuard,
    _file: Option<WorkerGuard>,
}

/// Console lines carry only the level and the message
fn console_layer<S, W>(writer: W) -> fmt::Layer<S, DefaultFields, Format<Full, ()>, W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    fmt::layer()
        .without_time()
        .with_target(false)
        .with_writer(writer)
}

fn filter(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy(QUIET_TARGETS)
}

/// Install the subscriber for the current thread
///
/// The log directory is created if needed. If the log file cannot be opened,
/// logging continues on the console only and a warning is emitted.
pub fn init(level: Level, log_dir: &Path) -> LogGuard {
    let file = std::fs::create_dir_all(log_dir)
        .map_err(|e| e.to_string())
        .and_then(|()| {
            RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix(LOG_FILE_NAME)
                .build(log_dir)
                .map_err(|e| e.to_string())
        });

    let (file_layer, file_guard, file_error) = match file {
        Ok(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(writer);
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter(level))
        .with(console_layer(std::io::stderr))
        .with(file_layer);

    let guard = LogGuard {
        _subscriber: tracing::subscriber::set_default(subscriber),
        _file: file_guard,
    };

    if let Some(e) = file_error {
        tracing::warn!(
            "Cannot write log file {}: {}",
            log_dir.join(LOG_FILE_NAME).display(),
            e
        );
    }

    guard
}
