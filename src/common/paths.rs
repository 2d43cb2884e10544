//! Configuration and log file locations
//!
//! Uses the directories crate for platform-appropriate locations.

use std::io;
use std::path::PathBuf;

/// Application name used for config and data directories
const APP_NAME: &str = "uicd-runner";

/// Get the configuration directory path
///
/// - Linux: `~/.config/uicd-runner/`
/// - macOS: `~/Library/Application Support/uicd-runner/`
/// - Windows: `%APPDATA%\uicd-runner\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().join("logs"))
}

/// Directory under which per-run work directories are created when the
/// configuration does not name one
pub fn default_work_root() -> PathBuf {
    std::env::temp_dir()
}

/// Ensure the log directory exists
pub fn ensure_log_dir() -> io::Result<Option<PathBuf>> {
    if let Some(dir) = log_dir() {
        if !dir.exists() {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(Some(dir))
    } else {
        Ok(None)
    }
}
