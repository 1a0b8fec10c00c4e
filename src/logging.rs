//! Log output for the gateway.
//!
//! Startup progress, document uploads, and every query are logged to the console and to a log
//! file. The file is `logs/textgate.log` unless `TEXTGATE_LOG_FILE` names another path.
//! Call [`crate::config::load_dotenv`] first so both variables can come from `.env`.
use std::path::PathBuf;
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILE_ENV: &str = "TEXTGATE_LOG_FILE";
const DEFAULT_LOG_DIR: &str = "logs";
const DEFAULT_LOG_FILE: &str = "textgate.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the console and log-file subscribers.
///
/// `RUST_LOG` selects levels, `info` otherwise. When the log file cannot be opened the gateway
/// keeps logging to the console only. Repeated calls keep the first subscriber.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console = fmt::layer().with_target(false).compact();
    let registry = tracing_subscriber::registry().with(env_filter).with(console);

    let installed = match file_writer() {
        Some(writer) => registry
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .compact(),
            )
            .try_init(),
        None => registry.try_init(),
    };

    if let Err(err) = installed {
        eprintln!("Tracing already initialized: {err}");
    }
}

/// Path of the gateway log file.
fn log_file_path() -> PathBuf {
    std::env::var(LOG_FILE_ENV)
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR).join(DEFAULT_LOG_FILE))
}

fn file_writer() -> Option<NonBlocking> {
    let path = log_file_path();
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        if let Err(err) = std::fs::create_dir_all(dir) {
            eprintln!("Failed to create log directory {}: {err}", dir.display());
            return None;
        }
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .inspect_err(|err| eprintln!("Failed to open log file {}: {err}", path.display()))
        .ok()?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let _ = LOG_GUARD.set(guard);
    Some(writer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_location_can_come_from_dotenv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("gateway.log");
        let dotenv = dir.path().join(".env");
        std::fs::write(&dotenv, format!("{LOG_FILE_ENV}={}\n", target.display())).expect("dotenv");

        // SAFETY: no other test reads or writes this variable.
        unsafe { std::env::remove_var(LOG_FILE_ENV) };
        assert_eq!(
            log_file_path(),
            PathBuf::from(DEFAULT_LOG_DIR).join(DEFAULT_LOG_FILE)
        );

        dotenvy::from_path(&dotenv).expect("load dotenv");
        assert_eq!(log_file_path(), target);
    }
}
