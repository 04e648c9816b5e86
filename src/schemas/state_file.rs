//! # Run State File Schema (`state.json`)
//!
//! After every `now` run the outcome is written to `~/.setup-workspace/state.json`
//! (or the path given by `--state` / `SETUP_WORKSPACE_STATE`). The file is a record
//! for humans and scripts; nothing reads it back to change behaviour beyond a log line
//! at the start of the next run.
//!
//! ## Example State File
//! ```json
//! {
//!   "last_run": "2026-10-18T09:12:44.120391+00:00",
//!   "status": "aborted",
//!   "aborted_at": { "number": 2, "step": "tool-installer" },
//!   "steps": [
//!     { "name": "system-packages", "outcome": "skipped", "detail": "all 3 packages already installed" },
//!     { "name": "tool-installer", "outcome": "failed", "detail": "NetworkError: ..." },
//!     { "name": "source-env", "outcome": "not-run" },
//!     { "name": "export-cache-dir", "outcome": "not-run" }
//!   ],
//!   "cache_variable": "HF_HOME",
//!   "cache_path": null
//! }
//! ```

use serde::{Deserialize, Serialize};

/// Top-level structure of `state.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunState {
    /// RFC 3339 timestamp of the run.
    pub last_run: String,
    pub status: RunStatus,
    /// Set only when `status` is `aborted`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted_at: Option<AbortPoint>,
    pub steps: Vec<StepRecord>,
    pub cache_variable: String,
    /// The exported value, or `null` when the run never got that far.
    pub cache_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
    Complete,
    Aborted,
}

/// The step that stopped the run, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortPoint {
    pub number: usize,
    pub step: String,
}

/// The outcome of one named step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub name: String,
    pub outcome: StepOutcomeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepOutcomeKind {
    Done,
    Skipped,
    Failed,
    NotRun,
}

impl StepRecord {
    pub fn new(name: &str, outcome: StepOutcomeKind, detail: Option<String>) -> Self {
        StepRecord {
            name: name.to_string(),
            outcome,
            detail,
        }
    }
}
