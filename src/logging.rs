//! Logging configuration for devpanel.
//!
//! Writes to a file in TUI mode (so the terminal display stays intact) and to stderr in
//! headless mode.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "devpanel.log";

/// `RUST_LOG` when set, `info` otherwise.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initializes logging for TUI mode.
///
/// The file is truncated on each run. Location: `~/.local/state/devpanel/devpanel.log` on
/// Linux, or the platform state/config directory elsewhere.
pub fn init_file_logging() {
    let log_path = get_log_path();

    // Make sure the directory exists
    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            // No subscriber; writing to the terminal would garble the panel
            return;
        }
    }

    // Truncated each run, so the file never grows past one session
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false) // Plain text in the file
        .init();
}

/// Initializes logging for headless mode.
///
/// Logs go to stderr, leaving stdout for the run summary.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the path for the log file.
///
/// Prefers the XDG state directory, then the config directory, then the temp directory.
pub fn get_log_path() -> PathBuf {
    // XDG_STATE_HOME on Linux
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("devpanel").join(LOG_FILE_NAME);
    }

    // macOS and Windows have no state directory
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("devpanel").join(LOG_FILE_NAME);
    }

    // Last resort
    std::env::temp_dir().join(LOG_FILE_NAME)
}
