//! Logging Infrastructure
//!
//! `RUST_LOG` drives the filter; without it the server logs its own crate and
//! request traces at info. Output goes to stdout, or to a daily rolling file
//! when a log directory is configured.

use std::path::Path;

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "bookstore_server=info,tower_http=info";

/// Initialize the logger with optional file output
pub fn init_logger_with_file(log_dir: Option<&Path>) {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false);

    if let Some(dir) = log_dir {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(dir, "bookstore-server");
                subscriber.with_ansi(false).with_writer(file_appender).init();
                return;
            }
            Err(e) => eprintln!("Log directory {} unavailable ({e}), logging to stdout", dir.display()),
        }
    }

    subscriber.init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into())
}
