//! # Environment Sourcing Step
//!
//! Step 3 of the pipeline: load the shell definitions the installer wrote (by default
//! `~/.local/bin/env`) into the session, so later steps, any trailing command and the
//! `--emit-env` output see the updated `PATH`.
//!
//! ## Workflow
//!
//! 1. **Resolve**: expand `~` and `$VAR` in `installer.env_file` against the session
//! 2. **Check**: a missing file is a `MissingEnvironmentFile` error; no shell is started
//! 3. **Source**: run `sh -c '. "$1" && env -0' sh <file>` with the session environment
//! 4. **Merge**: every variable that the file added or changed is set on the session,
//!    and every variable it unset is removed from it
//!
//! Shell bookkeeping variables (`PWD`, `SHLVL`, `_`, `OLDPWD`) are ignored, as are
//! dump entries that are not valid UTF-8: those are never part of the session, and
//! child processes inherit them unchanged.

use crate::errors::{BootstrapError, BootstrapResult};
use crate::libs::command_runner::CommandSpec;
use crate::libs::pipeline::{Step, StepContext, StepOutcome};
use crate::libs::session_env::SessionEnv;
use crate::libs::utilities::misc_utils::{expand_path, is_valid_env_name};
use crate::{log_debug, log_error, log_info};
use colored::Colorize;
use std::collections::HashSet;
use std::path::Path;

const SOURCE_SCRIPT: &str = r#". "$1" && env -0"#;

// Set by the shell itself, not by the sourced file.
const SHELL_BOOKKEEPING: [&str; 4] = ["PWD", "SHLVL", "_", "OLDPWD"];

pub struct SourceEnvStep;

fn source_command(path: &Path) -> CommandSpec {
    CommandSpec::new(
        "sh",
        [
            "-c".to_string(),
            SOURCE_SCRIPT.to_string(),
            "sh".to_string(),
            path.display().to_string(),
        ],
    )
}

fn dump_entries(dump: &[u8]) -> impl Iterator<Item = (&str, &str)> {
    dump.split(|b| *b == 0)
        .filter_map(|entry| std::str::from_utf8(entry).ok()?.split_once('='))
        .filter(|(name, _)| !SHELL_BOOKKEEPING.contains(name))
}

/// Variables in the NUL-separated `env -0` dump that differ from `session`.
///
/// # Arguments
/// * `dump`: Output of `env -0` after sourcing the file.
/// * `session`: The environment the shell was started with.
///
/// # Returns
/// * `Vec<(String, String)>`: New or changed variables, in dump order. Entries
///   without `=` or with non-UTF-8 bytes are dropped.
pub fn changed_variables(dump: &[u8], session: &SessionEnv) -> Vec<(String, String)> {
    dump_entries(dump)
        .filter(|(name, value)| session.get(name) != Some(*value))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Session variables the sourced file unset, i.e. those missing from the dump.
///
/// Only names a shell can carry are considered; anything else is not guaranteed to
/// survive `sh` and its absence says nothing about the file.
pub fn removed_variables(dump: &[u8], session: &SessionEnv) -> Vec<String> {
    let present: HashSet<&str> = dump_entries(dump).map(|(name, _)| name).collect();
    session
        .names()
        .into_iter()
        .filter(|name| is_valid_env_name(name))
        .filter(|name| !SHELL_BOOKKEEPING.contains(name))
        .filter(|name| !present.contains(name))
        .map(str::to_string)
        .collect()
}

impl Step for SourceEnvStep {
    fn name(&self) -> &'static str {
        "source-env"
    }

    fn plan(&self, ctx: &StepContext<'_>) -> Vec<String> {
        let path = expand_path(&ctx.config.installer.env_file, &ctx.session);
        vec![format!(
            "source {} into the session ({})",
            path.display(),
            source_command(&path).display()
        )]
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> BootstrapResult<StepOutcome> {
        let path = expand_path(&ctx.config.installer.env_file, &ctx.session);
        if !path.is_file() {
            log_error!(
                "[Env] {} does not exist; the installer did not write its environment file",
                path.display().to_string().red()
            );
            return Err(BootstrapError::MissingEnvironmentFile { path });
        }

        log_info!("[Env] Sourcing {}", path.display().to_string().cyan());
        let output = ctx.runner.run(&source_command(&path), &ctx.session)?;
        if !output.success() {
            let stderr = output.stderr_lossy();
            log_error!(
                "[Env] Sourcing {} failed, shell output:\n{}",
                path.display().to_string().red(),
                stderr.trim_end()
            );
            return Err(BootstrapError::EnvironmentSourcing {
                path,
                code: output.code,
                stderr,
            });
        }

        let changed = changed_variables(&output.stdout, &ctx.session);
        for (name, value) in &changed {
            log_debug!("[Env] {} = {}", name.bold(), value);
            ctx.session.set(name.clone(), value.clone());
        }

        let removed = removed_variables(&output.stdout, &ctx.session);
        for name in &removed {
            log_debug!("[Env] {} unset", name.bold());
            ctx.session.unset(name.clone());
        }

        let names: Vec<&str> = changed.iter().map(|(n, _)| n.as_str()).collect();
        if names.is_empty() && removed.is_empty() {
            log_info!("[Env] {} made no changes to the environment", path.display());
        }
        if !names.is_empty() {
            log_info!("[Env] Updated: {}", names.join(", ").green());
        }
        if !removed.is_empty() {
            log_info!("[Env] Unset: {}", removed.join(", ").yellow());
        }
        Ok(StepOutcome::Done(format!(
            "sourced {} ({} variables changed, {} unset)",
            path.display(),
            changed.len(),
            removed.len()
        )))
    }
}
