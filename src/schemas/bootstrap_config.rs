//! # Bootstrap Configuration Schema (`config.yaml`)
//!
//! This module defines the optional configuration file read by `setup-workspace now`.
//! Every field has a default, and the defaults reproduce the fixed behaviour of the
//! tool: install `git`, `curl` and `tmux`, run the uv installer, source
//! `~/.local/bin/env` and export `HF_HOME=/workspace/cache/`.
//!
//! ## Example
//!
//! ```yaml
//! packages: [git, curl, tmux]
//! package_manager: auto
//! privilege: auto
//! installer:
//!   url: https://astral.sh/uv/install.sh
//!   shell: sh
//!   timeout_secs: 120
//!   skip_if_present: uv
//!   env_file: ~/.local/bin/env
//! cache:
//!   variable: HF_HOME
//!   path: /workspace/cache/
//! ```
//!
//! Unknown keys are rejected so that a typo does not silently fall back to a default.

use crate::cli::type_enums::{PackageManagerKind, PrivilegeMode};
use crate::errors::{BootstrapError, BootstrapResult};
use crate::libs::utilities::misc_utils::is_valid_env_name;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// DEFAULTS
// ============================================================================

pub const DEFAULT_PACKAGES: [&str; 3] = ["git", "curl", "tmux"];
pub const DEFAULT_INSTALLER_URL: &str = "https://astral.sh/uv/install.sh";
pub const DEFAULT_INSTALLER_SHELL: &str = "sh";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SKIP_BINARY: &str = "uv";
pub const DEFAULT_ENV_FILE: &str = "~/.local/bin/env";
pub const DEFAULT_CACHE_VARIABLE: &str = "HF_HOME";
pub const DEFAULT_CACHE_PATH: &str = "/workspace/cache/";

// ============================================================================
// TOP-LEVEL CONFIGURATION
// ============================================================================

/// The complete structure of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    /// System packages to ensure are installed, in order.
    pub packages: Vec<String>,
    /// Package manager to use; `auto` detects one from PATH.
    pub package_manager: PackageManagerKind,
    /// How to obtain root for package installs.
    pub privilege: PrivilegeMode,
    /// The third-party installer that is fetched and executed.
    pub installer: InstallerConfig,
    /// The variable exported at the end of a successful run.
    pub cache: CacheConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        BootstrapConfig {
            packages: DEFAULT_PACKAGES.iter().map(|p| p.to_string()).collect(),
            package_manager: PackageManagerKind::default(),
            privilege: PrivilegeMode::default(),
            installer: InstallerConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Installer fetch-and-run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InstallerConfig {
    /// HTTPS location of the installer script.
    pub url: String,
    /// Interpreter the downloaded script is handed to.
    pub shell: String,
    /// Extra arguments appended after the script path.
    pub args: Vec<String>,
    /// Extra environment for the installer process only.
    pub env: BTreeMap<String, String>,
    /// Network timeout for the download, in seconds.
    pub timeout_secs: u64,
    /// Skip fetch and run when this binary is already on PATH and `env_file` exists.
    /// Set to `null` to always run the installer.
    pub skip_if_present: Option<String>,
    /// Shell definitions file the installer writes; sourced by the next step.
    pub env_file: String,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        InstallerConfig {
            url: DEFAULT_INSTALLER_URL.to_string(),
            shell: DEFAULT_INSTALLER_SHELL.to_string(),
            args: Vec::new(),
            env: BTreeMap::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            skip_if_present: Some(DEFAULT_SKIP_BINARY.to_string()),
            env_file: DEFAULT_ENV_FILE.to_string(),
        }
    }
}

/// The exported cache-directory variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub variable: String,
    /// Exported verbatim: no normalisation and no existence check.
    pub path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            variable: DEFAULT_CACHE_VARIABLE.to_string(),
            path: DEFAULT_CACHE_PATH.to_string(),
        }
    }
}

// ============================================================================
// VALIDATION
// ============================================================================

impl BootstrapConfig {
    /// Checks the invariants serde cannot express. `source` is only used in the
    /// error message.
    pub fn validate(&self, source: &Path) -> BootstrapResult<()> {
        let invalid = |reason: String| BootstrapError::Config {
            path: source.to_path_buf(),
            reason,
        };

        for package in &self.packages {
            let trimmed = package.trim();
            if trimmed.is_empty() {
                return Err(invalid("package names must not be empty".into()));
            }
            if trimmed.starts_with('-') || trimmed.chars().any(char::is_whitespace) {
                return Err(invalid(format!(
                    "'{package}' is not a package name (no leading '-' or whitespace)"
                )));
            }
        }

        if !self.installer.url.starts_with("https://") {
            return Err(invalid(format!(
                "installer.url must use https://, got '{}'",
                self.installer.url
            )));
        }
        if self.installer.shell.trim().is_empty() {
            return Err(invalid("installer.shell must not be empty".into()));
        }
        if self.installer.timeout_secs == 0 {
            return Err(invalid("installer.timeout_secs must be greater than 0".into()));
        }
        if self.installer.env_file.trim().is_empty() {
            return Err(invalid("installer.env_file must not be empty".into()));
        }
        if let Some(name) = self.installer.env.keys().find(|k| !is_valid_env_name(k)) {
            return Err(invalid(format!(
                "installer.env key '{name}' is not a valid variable name"
            )));
        }

        if !is_valid_env_name(&self.cache.variable) {
            return Err(invalid(format!(
                "cache.variable '{}' is not a valid variable name",
                self.cache.variable
            )));
        }
        if self.cache.path.is_empty() {
            return Err(invalid("cache.path must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(config: &BootstrapConfig) -> BootstrapResult<()> {
        config.validate(Path::new("config.yaml"))
    }

    #[test]
    fn defaults_match_fixed_behaviour() {
        let config = BootstrapConfig::default();
        assert_eq!(config.packages, ["git", "curl", "tmux"]);
        assert_eq!(config.installer.url, "https://astral.sh/uv/install.sh");
        assert_eq!(config.installer.env_file, "~/.local/bin/env");
        assert_eq!(config.cache.variable, "HF_HOME");
        assert_eq!(config.cache.path, "/workspace/cache/");
        assert!(check(&config).is_ok());
    }

    #[test]
    fn partial_yaml_falls_back_to_defaults() {
        let config: BootstrapConfig = serde_yaml::from_str(
            "packages: [git]\ncache:\n  path: /data/cache\n",
        )
        .unwrap();
        assert_eq!(config.packages, ["git"]);
        assert_eq!(config.cache.variable, "HF_HOME");
        assert_eq!(config.cache.path, "/data/cache");
        assert_eq!(config.installer, InstallerConfig::default());
    }

    #[test]
    fn skip_binary_can_be_disabled() {
        let config: BootstrapConfig =
            serde_yaml::from_str("installer:\n  skip_if_present: null\n").unwrap();
        assert_eq!(config.installer.skip_if_present, None);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let parsed = serde_yaml::from_str::<BootstrapConfig>("pakages: [git]\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn plain_http_installer_is_invalid() {
        let mut config = BootstrapConfig::default();
        config.installer.url = "http://astral.sh/uv/install.sh".into();
        let err = check(&config).unwrap_err();
        assert!(err.to_string().contains("https://"));
    }

    #[test]
    fn bad_package_names_are_invalid() {
        for bad in ["", "  ", "-y", "git curl"] {
            let mut config = BootstrapConfig::default();
            config.packages = vec![bad.to_string()];
            assert!(check(&config).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn cache_variable_must_be_a_shell_name() {
        let mut config = BootstrapConfig::default();
        config.cache.variable = "HF-HOME".into();
        assert!(matches!(check(&config), Err(BootstrapError::Config { .. })));
    }

    #[test]
    fn empty_package_list_is_valid() {
        let mut config = BootstrapConfig::default();
        config.packages.clear();
        assert!(check(&config).is_ok());
    }
}
