use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::core::config::AppPaths;

/// Install the global subscriber: human-readable stdout plus a daily
/// rolling file under the log directory.
///
/// The returned guard flushes the file writer on drop and must be held
/// for the lifetime of the process.
pub fn init(paths: &AppPaths) -> io::Result<WorkerGuard> {
    init_with_dir(&paths.log_dir)
}

fn init_with_dir(log_dir: &Path) -> io::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;

    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "docchat.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    // RUST_LOG wins; otherwise keep our own crate chatty and deps quiet.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,docchat_backend=debug,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .init();

    Ok(guard)
}
