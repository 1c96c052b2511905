//! Session logger: installs a `tracing` subscriber that writes to a single
//! file in the OS data directory.
//!
//! The file is **truncated at each launch**, so it only ever holds the
//! most recent session.
//!
//! Log location:
//!   Windows:  `%APPDATA%\AgentCanvas\agentcanvas.log`
//!   Linux:    `$XDG_DATA_HOME/AgentCanvas/agentcanvas.log` (or `~/.local/share/...`)
//!   macOS:    `~/Library/Application Support/AgentCanvas/agentcanvas.log`
//!
//! If the file cannot be opened, events go to stderr instead.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

use tracing::{Level, error, info};

#[cfg(test)]
#[path = "logger_test.rs"]
mod logger_test;

const APP_DIR: &str = "AgentCanvas";
const LOG_FILE: &str = "agentcanvas.log";

static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Path of the current session log, once [`init`] has opened it.
pub fn log_path() -> Option<&'static PathBuf> {
    LOG_PATH.get()
}

/// Install the global subscriber. Safe to call more than once; only the
/// first call has any effect.
///
/// * Creates (or truncates) the log file.
/// * `verbose` lowers the threshold from INFO to DEBUG.
/// * Installs a panic hook that records the panic before handing over to
///   the previous hook.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let path = log_file_path();

    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }

    // Open file, truncating any previous session's content
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(&path);

    let builder = tracing_subscriber::fmt().with_max_level(level).with_target(false);
    let installed = match file {
        Ok(f) => {
            let _ = LOG_PATH.set(path.clone());
            builder.with_ansi(false).with_writer(Mutex::new(f)).try_init()
        }
        Err(e) => {
            // Can't open log file, not fatal
            eprintln!("[logger] Failed to open log file {:?}: {}", path, e);
            builder.with_writer(std::io::stderr).try_init()
        }
    };
    if installed.is_err() {
        return;
    }

    info!(log_file = %path.display(), version = env!("CARGO_PKG_VERSION"), "session started");

    let prev = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!("PANIC: {}", info);
        prev(info);
    }));
}

fn log_file_path() -> PathBuf {
    data_dir().join(APP_DIR).join(LOG_FILE)
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
    // Last resort: current working directory
    PathBuf::from(".")
}
