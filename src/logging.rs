use crate::config::cache_dir;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_ENV: &str = "CODEX_NOTIFY_LOG";
const DEFAULT_LEVEL: &str = "warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    /// The detached popup helper has no stderr; it appends to a file instead.
    HelperFile,
}

pub fn helper_log_path() -> PathBuf {
    cache_dir().join("popup.log")
}

pub fn init(target: LogTarget) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));
    let registry = tracing_subscriber::registry().with(filter);

    let file = match target {
        LogTarget::Stderr => None,
        LogTarget::HelperFile => {
            let path = helper_log_path();
            path.parent()
                .map(std::fs::create_dir_all)
                .transpose()
                .ok()
                .and_then(|_| OpenOptions::new().create(true).append(true).open(&path).ok())
        }
    };

    // Logging is best effort: a second init or an unwritable log file is not fatal.
    let _ = match file {
        Some(file) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init(),
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
    };
}
