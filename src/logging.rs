use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

/// Log file name inside the log directory.
pub const LOG_FILE: &str = "volume-osd.log";

/// Level filter for the given debug setting. `RUST_LOG` is only honoured
/// when debug logging is on, so a stray environment variable cannot make a
/// normal run verbose.
pub fn filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::new("info")
    }
}

/// Initialise logging. With `log_dir` the output goes to a file in that
/// directory through a background writer; keep the returned guard alive
/// until exit so buffered lines are flushed. Without a directory, or when
/// the file cannot be opened, logs go to stderr.
pub fn init(debug: bool, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let appender = log_dir.and_then(|dir| {
        RollingFileAppender::builder()
            .rotation(Rotation::NEVER)
            .filename_prefix(LOG_FILE)
            .build(dir)
            .map_err(|e| eprintln!("Cannot open log file in {}: {}", dir.display(), e))
            .ok()
    });

    match appender {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter(debug))
                .with_writer(writer)
                .with_ansi(false)
                .try_init();
            Some(guard)
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter(debug))
                .try_init();
            None
        }
    }
}
