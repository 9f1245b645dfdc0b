//! Session logger: `tracing` output to stderr and to a single file in the
//! OS data directory.
//!
//! The file is **truncated at each launch**, so it only ever contains output
//! from the most recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\tileviz\tileviz.log`
//!   Linux:    `~/.local/share/tileviz/tileviz.log`
//!   macOS:    `~/Library/Application Support/tileviz/tileviz.log`
//!
//! Filtering follows `RUST_LOG`, defaulting to `info`.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Returns the path to the current session log file.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Install the global subscriber and a panic hook that logs panics before
/// the default handler runs.  Call once, before any logging.
pub fn init() {
    let file = open_session_file();

    let stderr_layer = fmt::layer().with_writer(std::io::stderr);
    let file_layer = file.map(|f| fmt::layer().with_ansi(false).with_writer(Arc::new(f)));

    let installed = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
    if installed.is_err() {
        // Already installed (tests, embedding); keep the existing one.
        return;
    }

    if let Some(path) = log_path() {
        tracing::info!(log_file = %path.display(), "session started");
    }

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!("PANIC: {info}");
        prev(info);
    }));
}

fn open_session_file() -> Option<File> {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    match OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path)
    {
        Ok(f) => {
            let _ = LOG_PATH.set(path);
            Some(f)
        }
        Err(e) => {
            // Not fatal; stderr logging still works.
            eprintln!("[logger] failed to open log file {}: {e}", path.display());
            None
        }
    }
}

fn log_file_path() -> PathBuf {
    data_dir().join("tileviz").join("tileviz.log")
}

/// Platform data directory (without the app sub-folder).
fn data_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata);
        }
    }
    #[cfg(target_os = "macos")]
    {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support");
        }
    }
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}
