// Loads and validates `config.yaml`, and renders the commented default file that
// `setup-workspace generate` writes.

use crate::errors::{BootstrapError, BootstrapResult};
use crate::libs::paths::ConfigLocation;
use crate::schemas::bootstrap_config::BootstrapConfig;
use crate::{log_debug, log_info};
use colored::Colorize;
use std::fs;

/// The file `generate` writes. Parsing it yields `BootstrapConfig::default()`.
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# setup-workspace configuration.
# Every key is optional; removing one restores its default.

# System packages installed through the host package manager.
packages:
  - git
  - curl
  - tmux

# auto | apt | dnf | yum | apk | pacman | zypper | brew
package_manager: auto

# How package installs get root: auto (root runs directly, otherwise `sudo -n`),
# sudo (always prefix with `sudo -n`) or none (never escalate).
privilege: auto

installer:
  # Fetched over HTTPS and run with `shell`.
  url: https://astral.sh/uv/install.sh
  shell: sh
  args: []
  env: {}
  timeout_secs: 120
  # Skip the download when this binary is on PATH and env_file exists.
  # Set to null to always run the installer.
  skip_if_present: uv
  # Sourced after the installer so its PATH changes apply to this session.
  env_file: ~/.local/bin/env

# Exported verbatim at the end of a successful run.
cache:
  variable: HF_HOME
  path: /workspace/cache/
"#;

pub fn render_default_config() -> &'static str {
    DEFAULT_CONFIG_TEMPLATE
}

/// Reads the configuration at `location`.
///
/// A missing file at the default location yields the built-in defaults; a missing
/// file that was named explicitly, unreadable YAML or a failed validation is a
/// `Config` error.
pub fn load_config(location: &ConfigLocation) -> BootstrapResult<BootstrapConfig> {
    let path = &location.path;
    let config_error = |reason: String| BootstrapError::Config {
        path: path.clone(),
        reason,
    };

    if !path.exists() {
        if location.explicit {
            return Err(config_error("file does not exist".into()));
        }
        log_debug!(
            "[Config] No config at {}; using built-in defaults",
            path.display()
        );
        return Ok(BootstrapConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(|e| config_error(format!("unreadable: {e}")))?;
    let config = if contents.trim().is_empty() {
        BootstrapConfig::default()
    } else {
        serde_yaml::from_str::<BootstrapConfig>(&contents).map_err(|e| config_error(e.to_string()))?
    };
    config.validate(path)?;

    log_info!("[Config] Using {}", path.display().to_string().cyan());
    log_debug!("[Config] Loaded: {:?}", config);
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn at(path: PathBuf, explicit: bool) -> ConfigLocation {
        ConfigLocation { path, explicit }
    }

    #[test]
    fn template_parses_to_defaults() {
        let parsed: BootstrapConfig = serde_yaml::from_str(render_default_config()).unwrap();
        assert_eq!(parsed, BootstrapConfig::default());
    }

    #[test]
    fn missing_default_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(&at(dir.path().join("config.yaml"), false)).unwrap();
        assert_eq!(config, BootstrapConfig::default());
    }

    #[test]
    fn missing_explicit_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&at(dir.path().join("config.yaml"), true)).unwrap_err();
        assert_eq!(err.category(), "ConfigError");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn empty_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "\n  \n").unwrap();
        assert_eq!(load_config(&at(path, true)).unwrap(), BootstrapConfig::default());
    }

    #[test]
    fn invalid_values_are_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "cache:\n  variable: 1BAD\n").unwrap();
        let err = load_config(&at(path, true)).unwrap_err();
        assert!(err.to_string().contains("cache.variable"));
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "packages: [git\n").unwrap();
        assert!(matches!(
            load_config(&at(path, false)),
            Err(BootstrapError::Config { .. })
        ));
    }
}
