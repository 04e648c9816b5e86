// Resolves where `config.yaml` and `state.json` live.
//
// A path given on the command line (or through SETUP_WORKSPACE_CONFIG /
// SETUP_WORKSPACE_STATE, which clap folds into the same flag) is "explicit". The
// difference matters for the config file only: a missing default file means
// built-in defaults, a missing explicit file is an error.

use crate::libs::session_env::SessionEnv;
use crate::libs::utilities::misc_utils::{expand_path, get_workspace_dir};
use crate::log_debug;
use colored::Colorize;
use std::path::PathBuf;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const STATE_FILE_NAME: &str = "state.json";

/// A resolved config file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigLocation {
    pub path: PathBuf,
    /// `true` when the user named the file.
    pub explicit: bool,
}

/// `~`- and `$VAR`-expanded `--config` value, or the default location.
pub fn resolve_config_path(config_path: Option<&str>) -> ConfigLocation {
    let location = match config_path {
        Some(raw) => ConfigLocation {
            path: expand_path(raw, &SessionEnv::from_process()),
            explicit: true,
        },
        None => ConfigLocation {
            path: get_workspace_dir().join(CONFIG_FILE_NAME),
            explicit: false,
        },
    };
    log_debug!(
        "[Paths] Config file: {} (explicit: {})",
        location.path.display().to_string().cyan(),
        location.explicit
    );
    location
}

/// `~`- and `$VAR`-expanded `--state` value, or the default location.
pub fn resolve_state_path(state_path: Option<&str>) -> PathBuf {
    let path = match state_path {
        Some(raw) => expand_path(raw, &SessionEnv::from_process()),
        None => get_workspace_dir().join(STATE_FILE_NAME),
    };
    log_debug!("[Paths] State file: {}", path.display().to_string().yellow());
    path
}
