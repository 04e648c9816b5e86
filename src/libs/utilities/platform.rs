// Host facts the package step needs: the operating system and whether we already
// run with root privileges.

use crate::log_debug;
use colored::Colorize;

/// Detects the current operating system as a normalized string ("linux", "macos", ...).
pub fn detect_os() -> String {
    normalize_os(std::env::consts::OS)
}

/// Maps the various spellings of an OS name to the form used in logs and config.
pub fn normalize_os(os: &str) -> String {
    match os.to_lowercase().as_str() {
        "macos" | "darwin" | "apple-darwin" => "macos".to_string(),
        "windows" | "win32" | "win64" => "windows".to_string(),
        other => other.to_string(),
    }
}

/// `true` when the effective user is root.
#[cfg(unix)]
pub fn is_effective_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    let euid = unsafe { libc::geteuid() };
    log_debug!("[Platform] Effective uid: {}", euid.to_string().cyan());
    euid == 0
}

#[cfg(not(unix))]
pub fn is_effective_root() -> bool {
    log_debug!("[Platform] {} has no uid concept, assuming unprivileged", detect_os().cyan());
    false
}
