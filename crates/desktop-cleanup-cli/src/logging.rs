use std::env;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_LOG_PATH: &str = "./logs/desktop-cleanup.log";

/// Console logging on stderr, so the table on stdout stays readable, plus a
/// log file when one can be opened. The returned guard flushes the file.
pub fn init_logger() -> Option<WorkerGuard> {
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| "info".to_string());
    let filter_layer = EnvFilter::new(filter);

    let log_file_path = env::var("LOG_FILE_PATH").unwrap_or_else(|_| DEFAULT_LOG_PATH.to_string());

    // After an elevated run the file may belong to root; log to the console only then.
    let (file_layer, guard, open_error) = match open_log_file(Path::new(&log_file_path)) {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard), None)
        }
        Err(err) => (None, None, Some(err)),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .without_time()
                .compact(),
        )
        .with(file_layer)
        .with(filter_layer)
        .init();

    match open_error {
        Some(err) => warn!("Not writing log file {}: {}", log_file_path, err),
        None => debug!("Logging to stderr and {}", log_file_path),
    }

    guard
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
