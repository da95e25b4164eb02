//! Locations of files Juliabrot reads and writes. Everything lives next to
//! the executable unless the preferences say otherwise.

use std::path::{Path, PathBuf};

/// Directory containing the running executable, or the working directory
/// when that cannot be determined.
pub fn exe_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match exe_dir {
        Some(dir) => dir,
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

pub fn preferences_path() -> PathBuf {
    exe_directory().join("preferences.json")
}

/// Where finished renders go: `configured` if set, else `images/` beside
/// the executable.
pub fn output_directory(configured: &str) -> PathBuf {
    let configured = configured.trim();
    if configured.is_empty() {
        exe_directory().join("images")
    } else {
        PathBuf::from(configured)
    }
}
