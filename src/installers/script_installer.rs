//! # Tool Installer Step
//!
//! Step 2 of the pipeline: download a third-party installer script (by default the
//! uv installer from `https://astral.sh/uv/install.sh`) and execute it with a shell.
//!
//! ## Workflow
//!
//! 1. **Skip Check**: when `installer.skip_if_present` names a binary that is already on
//!    PATH *and* `installer.env_file` exists, nothing is downloaded
//! 2. **Fetch**: HTTPS GET with a timeout; any transport error, non-2xx status or empty
//!    body is a `Network` error and the script is never executed
//! 3. **Stage**: the body is written to a private temporary file
//! 4. **Execute**: `<shell> <tmpfile> [args...]` with `installer.env` added to the
//!    session environment; a non-zero exit is an `InstallerExecution` error
//!
//! The temporary file is removed when the step returns, whatever the outcome.

use crate::errors::{BootstrapError, BootstrapResult};
use crate::libs::command_runner::CommandSpec;
use crate::libs::pipeline::{Step, StepContext, StepOutcome};
use crate::libs::utilities::misc_utils::expand_path;
use crate::{log_debug, log_error, log_info};
use colored::Colorize;
use std::io::{Read, Write};
use std::time::Duration;

/// Upper bound on the size of a downloaded installer script.
const MAX_SCRIPT_BYTES: u64 = 16 * 1024 * 1024;

const USER_AGENT: &str = concat!("setup-workspace/", env!("CARGO_PKG_VERSION"));

/// Retrieves installer scripts.
pub trait Fetcher {
    /// Downloads `url` and returns the complete body.
    fn fetch(&self, url: &str, timeout: Duration) -> BootstrapResult<Vec<u8>>;
}

/// HTTPS fetcher backed by `ureq`.
pub struct UreqFetcher;

impl Fetcher for UreqFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> BootstrapResult<Vec<u8>> {
        let network = |reason: String| BootstrapError::Network {
            url: url.to_string(),
            reason,
        };

        if !url.starts_with("https://") {
            return Err(network("only https:// URLs are fetched".into()));
        }

        log_debug!("[Installer] GET {} (timeout {}s)", url.blue(), timeout.as_secs());
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();

        // ureq reports 4xx/5xx as `Status`; those go through the same status check.
        let response = match agent.get(url).call() {
            Ok(resp) => resp,
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(transport)) => {
                return Err(network(transport.to_string()));
            }
        };

        let body = read_body(response.status(), response.into_reader(), MAX_SCRIPT_BYTES)
            .map_err(network)?;
        log_debug!("[Installer] Downloaded {} bytes", body.len());
        Ok(body)
    }
}

/// Checks an HTTP answer and reads its body.
///
/// # Arguments
/// * `status`: The HTTP status code of the response.
/// * `reader`: The response body.
/// * `limit`: Largest body accepted, in bytes.
///
/// # Returns
/// * `Ok(body)` for a 2xx answer whose body fits in `limit`.
/// * `Err(reason)` for any other status, a read failure or an oversized body.
fn read_body(status: u16, reader: impl Read, limit: u64) -> Result<Vec<u8>, String> {
    if !(200..300).contains(&status) {
        return Err(format!("server answered HTTP {status}"));
    }

    let mut body = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut body)
        .map_err(|e| format!("failed reading response body: {e}"))?;

    if body.len() as u64 > limit {
        return Err(format!("response body is larger than {limit} bytes"));
    }
    Ok(body)
}

pub struct ToolInstallerStep;

impl ToolInstallerStep {
    /// Returns the reason to skip, if the tool is already in place.
    fn already_installed(&self, ctx: &StepContext<'_>) -> Option<String> {
        let binary = ctx.config.installer.skip_if_present.as_deref()?;
        let found = ctx.runner.locate(binary, &ctx.session)?;
        let env_file = expand_path(&ctx.config.installer.env_file, &ctx.session);
        if !env_file.is_file() {
            log_debug!(
                "[Installer] {} found at {} but {} is missing; reinstalling",
                binary,
                found.display(),
                env_file.display()
            );
            return None;
        }
        Some(format!("{} already present at {}", binary, found.display()))
    }

    fn command_for(&self, ctx: &StepContext<'_>, script: &str) -> CommandSpec {
        let installer = &ctx.config.installer;
        let args = std::iter::once(script.to_string()).chain(installer.args.iter().cloned());
        installer
            .env
            .iter()
            .fold(CommandSpec::new(installer.shell.clone(), args), |spec, (k, v)| {
                spec.with_env(k.clone(), v.clone())
            })
    }
}

impl Step for ToolInstallerStep {
    fn name(&self) -> &'static str {
        "tool-installer"
    }

    fn plan(&self, ctx: &StepContext<'_>) -> Vec<String> {
        if let Some(reason) = self.already_installed(ctx) {
            return vec![format!("skip: {reason}")];
        }
        vec![
            format!("fetch {}", ctx.config.installer.url),
            self.command_for(ctx, "<downloaded script>").display(),
        ]
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> BootstrapResult<StepOutcome> {
        if let Some(reason) = self.already_installed(ctx) {
            log_info!("[Installer] {}", reason.green());
            return Ok(StepOutcome::Skipped(reason));
        }

        let installer = &ctx.config.installer;
        log_info!("[Installer] Fetching {}", installer.url.cyan());
        let body = ctx
            .fetcher
            .fetch(&installer.url, Duration::from_secs(installer.timeout_secs))?;
        if body.is_empty() {
            return Err(BootstrapError::Network {
                url: installer.url.clone(),
                reason: "response body is empty".into(),
            });
        }

        let mut script = tempfile::Builder::new()
            .prefix("setup-workspace-installer-")
            .suffix(".sh")
            .tempfile()
            .map_err(|e| BootstrapError::io("Failed to create a temporary file for the installer", e))?;
        script
            .write_all(&body)
            .and_then(|()| script.flush())
            .map_err(|e| BootstrapError::io("Failed to write the installer script", e))?;

        let spec = self.command_for(ctx, &script.path().display().to_string());
        log_info!("[Installer] Running {}", spec.display().cyan());
        let output = ctx.runner.run(&spec, &ctx.session)?;

        if !output.success() {
            let stderr = output.stderr_lossy();
            log_error!("[Installer] Installer output:\n{}", stderr.trim_end());
            return Err(BootstrapError::InstallerExecution {
                url: installer.url.clone(),
                code: output.code,
                stderr,
            });
        }

        log_debug!("[Installer] stdout:\n{}", output.stdout_lossy().trim_end());
        log_info!("[Installer] Installer from {} finished", installer.url.green());
        Ok(StepOutcome::Done(format!("ran installer from {}", installer.url)))
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Canned fetcher for unit tests.

    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves one fixed body, or fails every fetch when it has none.
    pub struct FakeFetcher {
        body: Option<Vec<u8>>,
        fetches: AtomicUsize,
    }

    impl FakeFetcher {
        pub const fn unreachable() -> Self {
            FakeFetcher {
                body: None,
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn script(body: &str) -> Self {
            FakeFetcher {
                body: Some(body.as_bytes().to_vec()),
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl Fetcher for FakeFetcher {
        fn fetch(&self, url: &str, _timeout: Duration) -> BootstrapResult<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.body.clone().ok_or_else(|| BootstrapError::Network {
                url: url.to_string(),
                reason: "connection refused".into(),
            })
        }
    }
}
