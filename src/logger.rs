//! Session logger: routes all `tracing` output to a single file in the OS
//! data directory.
//!
//! The file is **truncated (overwritten) at each launch**, so it only ever
//! contains output from the most recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\RasterPaint\rasterpaint.log`
//!   Linux:    `~/.local/share/RasterPaint/rasterpaint.log`
//!   macOS:    `~/Library/Application Support/RasterPaint/rasterpaint.log`
//!
//! The library only emits events; installing the subscriber is up to the
//! binary, which calls [`init`] once at startup.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Returns the path to the current session log file.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// `RUST_LOG` wins; otherwise `fallback` (e.g. "info", "rasterpaint=debug").
fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Initialise the session logger. Call once before any logging.
///
/// * Creates (or truncates) the log file and installs a `tracing` fmt
///   subscriber writing to it. If the file cannot be opened, events go to
///   stderr instead.
/// * Installs a panic hook that records the panic before handing over to the
///   previous hook.
pub fn init(level: &str) {
    let path = log_file_path(&data_dir());

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path);

    let installed = match file {
        Ok(f) => {
            let _ = LOG_PATH.set(path.clone());
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_ansi(false)
                .with_writer(Mutex::new(f))
                .try_init()
        }
        Err(e) => {
            eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter(level))
                .with_writer(std::io::stderr)
                .try_init()
        }
    };
    if installed.is_err() {
        // Someone else already owns the global subscriber
        return;
    }

    info!("=== RasterPaint session started {} ===", human_timestamp());
    if let Some(p) = log_path() {
        info!("Log file: {}", p.display());
    }

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        error!(target: "panic", "PANIC: {}", panic);
        prev(panic);
    }));
}

fn log_file_path(base: &Path) -> PathBuf {
    base.join("RasterPaint").join("rasterpaint.log")
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
            return PathBuf::from(home).join("Library").join("Application Support");
        }
    }
    // Linux / fallback
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    PathBuf::from(".")
}

/// Human-readable start time for the session header.
fn human_timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => format!("(unix {})", d.as_secs()),
        Err(_) => "(unknown time)".to_string(),
    }
}
