//! Tracing setup.
//!
//! Logs always go to stdout as JSON. When `log_dir` is configured they are
//! also written as JSON to daily-rotated files there, keeping the newest
//! [`MAX_LOG_FILES`].

use crate::config::ServerConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FILE_PREFIX: &str = "app";
pub const MAX_LOG_FILES: usize = 5;

/// Rotating file writer for `dir`. Files are named `app.<date>.log`.
pub fn log_file_appender(dir: &str) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(dir)
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must live as long
/// as the server.
pub fn init_tracing(config: &ServerConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let (writer, guard) = tracing_appender::non_blocking(log_file_appender(dir)?);
            let layer = fmt::layer()
                .json()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log_level))
        .with(
            fmt::layer()
                .json()
                .with_target(false)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
