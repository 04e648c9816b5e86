// Small helpers shared by the config loader, the steps and the commands.

use crate::libs::session_env::SessionEnv;
use crate::log_debug;
use colored::Colorize;
use std::path::PathBuf;

/// Name of the per-user directory holding `config.yaml` and `state.json`.
pub const WORKSPACE_DIR_NAME: &str = ".setup-workspace";

/// Expands `~` and `$VAR`/`${VAR}` in `raw`, resolving both against the session
/// environment so paths follow variables set earlier in the run.
///
/// Unknown variables are left in place. When `HOME` is unset the `dirs` crate's
/// idea of the home directory is used instead.
pub fn expand_path(raw: &str, session: &SessionEnv) -> PathBuf {
    let home = || {
        session
            .get("HOME")
            .map(str::to_string)
            .or_else(|| dirs::home_dir().map(|h| h.to_string_lossy().into_owned()))
    };
    let expanded =
        shellexpand::full_with_context_no_errors(raw, home, |var| session.get(var).map(str::to_string));
    PathBuf::from(expanded.into_owned())
}

/// Returns `~/.setup-workspace`, falling back to `./.setup-workspace` when no home
/// directory can be determined.
pub fn get_workspace_dir() -> PathBuf {
    let dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(WORKSPACE_DIR_NAME);
    log_debug!(
        "[Utils] Workspace directory resolved to: {}",
        dir.display().to_string().cyan()
    );
    dir
}

/// `true` when `name` is usable as a shell variable name: `[A-Za-z_][A-Za-z0-9_]*`.
pub fn is_valid_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
