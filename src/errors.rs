//! Error types for setup-workspace.
//!
//! Every step returns `BootstrapResult<T>`. Nothing is recovered locally: the first
//! error aborts the pipeline and decides the process exit code.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias used throughout the crate.
pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Exit code used for configuration and usage errors.
pub const CONFIG_EXIT_CODE: u8 = 2;

/// All errors that can stop a bootstrap run.
#[derive(Error, Debug)]
pub enum BootstrapError {
    // Package provisioning
    #[error("No supported package manager found on PATH (looked for: {searched})")]
    UnsupportedPackageManager { searched: String },

    #[error("Installing packages with {manager} needs `sudo` ({reason}), but it is not on PATH")]
    PrivilegesRequired { manager: String, reason: String },

    #[error("Package manager {manager} failed running `{command}` ({}): {}", describe_status(.code), excerpt(.stderr))]
    PackageManager {
        manager: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    // Installer fetch and run
    #[error("Failed to fetch installer from {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Installer downloaded from {url} failed ({}): {}", describe_status(.code), excerpt(.stderr))]
    InstallerExecution {
        url: String,
        code: Option<i32>,
        stderr: String,
    },

    // Environment sourcing
    #[error("Environment file not found: {path}")]
    MissingEnvironmentFile { path: PathBuf },

    #[error("Sourcing {path} failed ({}): {}", describe_status(.code), excerpt(.stderr))]
    EnvironmentSourcing {
        path: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    // Configuration
    #[error("Invalid configuration at {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    // Process and filesystem plumbing
    #[error("Failed to start `{program}`: {source}")]
    CommandSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl BootstrapError {
    /// The exit status the process should end with for this error.
    ///
    /// A failing external command passes its own exit code through; everything
    /// else maps to 1, except configuration errors which map to 2.
    pub fn exit_code(&self) -> u8 {
        let code = match self {
            BootstrapError::PackageManager { code, .. }
            | BootstrapError::InstallerExecution { code, .. }
            | BootstrapError::EnvironmentSourcing { code, .. } => *code,
            BootstrapError::Config { .. } => return CONFIG_EXIT_CODE,
            _ => None,
        };
        match code {
            Some(c) if (1..=255).contains(&c) => c as u8,
            _ => 1,
        }
    }

    /// Stable name of the error category, recorded in `state.json`.
    pub fn category(&self) -> &'static str {
        match self {
            BootstrapError::UnsupportedPackageManager { .. }
            | BootstrapError::PrivilegesRequired { .. }
            | BootstrapError::PackageManager { .. } => "PackageManagerError",
            BootstrapError::Network { .. } => "NetworkError",
            BootstrapError::InstallerExecution { .. } => "InstallerExecutionError",
            BootstrapError::MissingEnvironmentFile { .. } => "MissingEnvironmentFileError",
            BootstrapError::EnvironmentSourcing { .. } => "EnvironmentSourcingError",
            BootstrapError::Config { .. } => "ConfigError",
            BootstrapError::CommandSpawn { .. } => "CommandSpawnError",
            BootstrapError::Io { .. } => "IoError",
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        BootstrapError::Io {
            context: context.into(),
            source,
        }
    }
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {c}"),
        None => "terminated by signal".to_string(),
    }
}

/// Most lines of stderr kept in an error message; the step logs the full output.
const EXCERPT_LINES: usize = 5;

// Last few non-empty lines of captured stderr, oldest first, on one line.
fn excerpt(stderr: &str) -> String {
    let mut lines: Vec<&str> = stderr
        .lines()
        .rev()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(EXCERPT_LINES)
        .collect();
    if lines.is_empty() {
        return "no error output".to_string();
    }
    lines.reverse();
    lines.join(" | ")
}
