use std::path::Path;

use file_rotate::{compression::Compression, suffix::AppendCount, ContentLimit, FileRotate};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::{config::LogSettings, AppError, AppResult};

pub const LOG_FILE_NAME: &str = "phonebook.log";

// Notices already reach the user; the terminal only gets hard failures.
const STDERR_FILTER: &str = "phonebook=error,sqlx=error";

/// Keeps the non-blocking file writer alive. Dropping it flushes buffered lines.
#[must_use = "dropping the guard stops the file sink"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Install the global subscriber: compact stderr output plus, when a logs
/// directory is given, JSON lines in a size-rotated `phonebook.log`.
///
/// Calling this more than once is harmless; later calls keep the first
/// subscriber.
pub fn init_logging(logs_dir: Option<&Path>, settings: &LogSettings) -> AppResult<LoggingGuard> {
    let (file_layer, file_guard) = match logs_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|err| {
                AppError::from(err)
                    .with_context("operation", "create_logs_dir")
                    .with_context("path", dir.display().to_string())
            })?;
            let writer = FileRotate::new(
                dir.join(LOG_FILE_NAME),
                AppendCount::new(settings.max_files),
                ContentLimit::Bytes(settings.max_size_bytes),
                Compression::None,
                #[cfg(unix)]
                None,
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(writer);
            let layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_target(true)
                .with_timer(fmt::time::UtcTime::rfc_3339())
                .with_writer(non_blocking)
                .with_filter(file_filter(&settings.filter));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(STDERR_FILTER));

    if tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok()
    {
        tracing::debug!(target: "phonebook", event = "logging_ready", file_sink = logs_dir.is_some());
    }

    Ok(LoggingGuard { _file: file_guard })
}

fn file_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|err| {
        eprintln!("Ignoring invalid log filter {directives:?}: {err}");
        EnvFilter::new(LogSettings::default().filter)
    })
}
