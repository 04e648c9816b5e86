// Persists the outcome of each `now` run to `state.json`.
//
// The file is informational only. Reading a broken file or failing to write a new
// one is logged and otherwise ignored: the exit code of a run never depends on it.

use crate::libs::pipeline::PipelineReport;
use crate::libs::session_env::SessionEnv;
use crate::libs::utilities::timestamps::{current_timestamp, format_duration, time_since};
use crate::schemas::bootstrap_config::BootstrapConfig;
use crate::schemas::state_file::{AbortPoint, RunState, RunStatus};
use crate::{log_debug, log_info, log_warn};
use colored::Colorize;
use std::fs;
use std::path::Path;

/// Builds the record for a finished pipeline run.
///
/// # Arguments
/// * `report`: Per-step outcomes and the failure, if any.
/// * `config`: Supplies the cache variable name.
/// * `session`: The final environment; the cache path is read from it.
///
/// # Returns
/// * `RunState`: `cache_path` is only set when every step completed.
pub fn build_run_state(
    report: &PipelineReport,
    config: &BootstrapConfig,
    session: &SessionEnv,
) -> RunState {
    let (status, aborted_at) = match &report.failure {
        None => (RunStatus::Complete, None),
        Some((number, step, _)) => (
            RunStatus::Aborted,
            Some(AbortPoint {
                number: *number,
                step: step.to_string(),
            }),
        ),
    };
    let cache_path = report
        .is_complete()
        .then(|| session.get(&config.cache.variable).map(str::to_string))
        .flatten();

    RunState {
        last_run: current_timestamp(),
        status,
        aborted_at,
        steps: report.records.clone(),
        cache_variable: config.cache.variable.clone(),
        cache_path,
    }
}

/// Reads a previous run record.
///
/// # Arguments
/// * `path`: Location of `state.json`.
///
/// # Returns
/// * `Some(RunState)` when the file exists and parses.
/// * `None` for a missing, unreadable or malformed file (the last two are logged).
pub fn load_run_state(path: &Path) -> Option<RunState> {
    if !path.exists() {
        log_debug!("[State] No state file at {}", path.display());
        return None;
    }
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            log_warn!("[State] Could not read {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(state) => Some(state),
        Err(e) => {
            log_warn!(
                "[State] Ignoring malformed state file {}: {}",
                path.display().to_string().yellow(),
                e
            );
            None
        }
    }
}

/// Logs when the previous run happened and how it ended.
pub fn log_previous_run(path: &Path) {
    let Some(previous) = load_run_state(path) else {
        return;
    };
    let when = time_since(&previous.last_run)
        .map(|d| format!("{} ago", format_duration(&d)))
        .unwrap_or_else(|| previous.last_run.clone());
    match previous.aborted_at {
        Some(point) => log_info!(
            "[State] Previous run {} aborted at step {} ({})",
            when,
            point.number,
            point.step.yellow()
        ),
        None => log_info!("[State] Previous run {} completed", when),
    }
}

/// Writes `state` as pretty JSON, creating parent directories.
///
/// # Arguments
/// * `path`: Location of `state.json`.
/// * `state`: The record to persist.
///
/// # Returns
/// * `bool`:
///   - `true` if the file was written.
///   - `false` otherwise, after logging a warning. Callers never fail on it.
pub fn save_run_state(path: &Path, state: &RunState) -> bool {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent) {
            log_warn!(
                "[State] Could not create {}: {}",
                parent.display().to_string().yellow(),
                e
            );
            return false;
        }
    }

    let json = match serde_json::to_string_pretty(state) {
        Ok(j) => j,
        Err(e) => {
            log_warn!("[State] Could not serialize run state: {}", e);
            return false;
        }
    };
    match fs::write(path, json) {
        Ok(()) => {
            log_debug!("[State] Saved run state to {}", path.display().to_string().cyan());
            true
        }
        Err(e) => {
            log_warn!(
                "[State] Could not write {}: {}",
                path.display().to_string().yellow(),
                e
            );
            false
        }
    }
}
