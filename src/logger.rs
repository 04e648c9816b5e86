// This file implements the application's logging system.
// It provides macros for the log levels (INFO, WARN, ERROR, DEBUG) plus a PLAN level
// used by `--dry-run`, all printed to stderr with coloured tags.
// Stdout is reserved for `export` lines so that `eval "$(setup-workspace ...)"` stays clean.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// `log_info!` for general progress messages.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => (eprintln!("{} {}", colored::Colorize::bright_green("[INFO]"), format!($($arg)*)));
}

/// `log_warn!` for non-fatal conditions worth noticing.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => (eprintln!("{} {}", colored::Colorize::bright_yellow("[WARN]"), format!($($arg)*)));
}

/// `log_error!` for failures that abort the run.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => (eprintln!("{} {}", colored::Colorize::bright_red("[ERROR]"), format!($($arg)*)));
}

/// `log_plan!` describes what a step would do under `--dry-run`.
#[macro_export]
macro_rules! log_plan {
    ($($arg:tt)*) => (eprintln!("{} {}", colored::Colorize::bright_cyan("[PLAN]"), format!($($arg)*)));
}

/// `log_debug!` is only printed once debug mode is enabled.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if $crate::logger::is_debug_enabled() {
           eprintln!("{} {}", colored::Colorize::dimmed("[DEBUG]"), format!($($arg)*));
        }
    };
}

// Global debug flag, set once at startup.
static DEBUG_ENABLED: OnceLock<AtomicBool> = OnceLock::new();

/// Environment variable that turns debug logging on without the `--debug` flag.
pub const DEBUG_ENV_VAR: &str = "SETUP_WORKSPACE_DEBUG";

/// Initializes the logger.
///
/// Debug output is enabled when `debug` is `true` or when `SETUP_WORKSPACE_DEBUG`
/// is set to a truthy value (`1`, `true`, `yes`).
pub fn init(debug: bool) {
    let enabled = debug || env_requests_debug(std::env::var(DEBUG_ENV_VAR).ok().as_deref());
    DEBUG_ENABLED
        .get_or_init(|| AtomicBool::new(enabled))
        .store(enabled, Ordering::Relaxed);

    log_debug!("Logger initialized in DEBUG mode");
}

/// Checks if debug logging is currently enabled.
/// Used by the `log_debug!` macro.
pub fn is_debug_enabled() -> bool {
    DEBUG_ENABLED
        .get()
        .map(|f| f.load(Ordering::Relaxed))
        .unwrap_or(false)
}

fn env_requests_debug(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}
