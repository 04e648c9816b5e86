// `setup-workspace generate`: writes the commented default `config.yaml` so a new
// user has every knob in front of them. An existing file is left alone unless
// `--force` is given.

use crate::errors::{BootstrapError, BootstrapResult};
use crate::libs::config_loading::render_default_config;
use crate::libs::paths::resolve_config_path;
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::fs;
use std::process::ExitCode;

pub fn run(config_path: Option<String>, force: bool) -> BootstrapResult<ExitCode> {
    let path = resolve_config_path(config_path.as_deref()).path;

    if path.exists() {
        if !force {
            return Err(BootstrapError::Config {
                path,
                reason: "file already exists; pass --force to overwrite it".into(),
            });
        }
        log_warn!(
            "[Generate] Overwriting {}",
            path.display().to_string().yellow()
        );
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        log_debug!("[Generate] Ensuring {} exists", parent.display());
        fs::create_dir_all(parent).map_err(|e| {
            BootstrapError::io(format!("Failed to create {}", parent.display()), e)
        })?;
    }
    fs::write(&path, render_default_config())
        .map_err(|e| BootstrapError::io(format!("Failed to write {}", path.display()), e))?;

    log_info!(
        "[Generate] Wrote default configuration to {}",
        path.display().to_string().green()
    );
    Ok(ExitCode::SUCCESS)
}
