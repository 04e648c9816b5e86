// The bootstrap pipeline: an ordered list of named steps run until the first failure.
//
// States: not started -> complete, or aborted at step N. There is no recovery and no
// partial-success reporting beyond the per-step records kept for `state.json`.

use crate::errors::{BootstrapError, BootstrapResult};
use crate::installers::cache_export::CacheExportStep;
use crate::installers::env_file::SourceEnvStep;
use crate::installers::script_installer::{Fetcher, ToolInstallerStep};
use crate::installers::system_packages::SystemPackagesStep;
use crate::libs::command_runner::CommandRunner;
use crate::libs::session_env::SessionEnv;
use crate::schemas::bootstrap_config::BootstrapConfig;
use crate::schemas::state_file::{StepOutcomeKind, StepRecord};
use crate::{log_debug, log_error, log_info, log_plan};
use colored::Colorize;

/// Everything a step may read or change.
pub struct StepContext<'a> {
    pub config: &'a BootstrapConfig,
    pub runner: &'a dyn CommandRunner,
    pub fetcher: &'a dyn Fetcher,
    /// Mutated by steps; later steps and the caller see the changes.
    pub session: SessionEnv,
    pub is_root: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done(String),
    Skipped(String),
}

pub trait Step {
    /// Stable kebab-case name used in logs and `state.json`.
    fn name(&self) -> &'static str;

    /// What the step would do, for `--dry-run`. Must not run anything that changes
    /// the host.
    fn plan(&self, ctx: &StepContext<'_>) -> Vec<String>;

    fn run(&self, ctx: &mut StepContext<'_>) -> BootstrapResult<StepOutcome>;
}

/// Result of a full pipeline run.
#[derive(Debug)]
pub struct PipelineReport {
    /// One record per step, in order; steps after a failure are `NotRun`.
    pub records: Vec<StepRecord>,
    /// 1-based position, step name and error of the step that aborted the run.
    pub failure: Option<(usize, &'static str, BootstrapError)>,
}

impl PipelineReport {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct Pipeline<'s> {
    steps: Vec<Box<dyn Step + 's>>,
}

impl Pipeline<'static> {
    /// The four bootstrap steps in their fixed order.
    pub fn standard() -> Self {
        let steps: Vec<Box<dyn Step>> = vec![
            Box::new(SystemPackagesStep),
            Box::new(ToolInstallerStep),
            Box::new(SourceEnvStep),
            Box::new(CacheExportStep),
        ];
        Pipeline::new(steps)
    }
}

impl<'s> Pipeline<'s> {
    pub fn new(steps: Vec<Box<dyn Step + 's>>) -> Self {
        Pipeline { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Runs the steps in order and stops at the first error.
    pub fn run(&self, ctx: &mut StepContext<'_>) -> PipelineReport {
        let total = self.steps.len();
        let mut records = Vec::with_capacity(total);
        let mut failure = None;

        for (index, step) in self.steps.iter().enumerate() {
            let number = index + 1;
            if failure.is_some() {
                records.push(StepRecord::new(step.name(), StepOutcomeKind::NotRun, None));
                continue;
            }

            log_info!(
                "[Pipeline] Step {}/{}: {}",
                number,
                total,
                step.name().bold()
            );
            match step.run(ctx) {
                Ok(StepOutcome::Done(detail)) => {
                    log_debug!("[Pipeline] {} done: {}", step.name(), detail);
                    records.push(StepRecord::new(step.name(), StepOutcomeKind::Done, Some(detail)));
                }
                Ok(StepOutcome::Skipped(reason)) => {
                    log_info!("[Pipeline] {} skipped: {}", step.name(), reason.dimmed());
                    records.push(StepRecord::new(step.name(), StepOutcomeKind::Skipped, Some(reason)));
                }
                Err(err) => {
                    log_error!(
                        "[Pipeline] Aborted at step {}/{} ({}): {}",
                        number,
                        total,
                        step.name().red(),
                        err
                    );
                    records.push(StepRecord::new(
                        step.name(),
                        StepOutcomeKind::Failed,
                        Some(format!("{}: {}", err.category(), err)),
                    ));
                    failure = Some((number, step.name(), err));
                }
            }
        }

        PipelineReport { records, failure }
    }

    /// Logs every step's plan without running anything.
    pub fn plan(&self, ctx: &StepContext<'_>) {
        let total = self.steps.len();
        for (index, step) in self.steps.iter().enumerate() {
            log_plan!("Step {}/{}: {}", index + 1, total, step.name().bold());
            for line in step.plan(ctx) {
                log_plan!("    {}", line);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::installers::script_installer::fake::FakeFetcher;

    static UNREACHABLE: FakeFetcher = FakeFetcher::unreachable();

    /// A context with a fixed session (`HOME=/home/dev`) and a fetcher that fails.
    pub fn context<'a>(
        config: &'a BootstrapConfig,
        runner: &'a dyn CommandRunner,
        is_root: bool,
    ) -> StepContext<'a> {
        context_with_fetcher(config, runner, &UNREACHABLE, is_root)
    }

    pub fn context_with_fetcher<'a>(
        config: &'a BootstrapConfig,
        runner: &'a dyn CommandRunner,
        fetcher: &'a dyn Fetcher,
        is_root: bool,
    ) -> StepContext<'a> {
        StepContext {
            config,
            runner,
            fetcher,
            session: SessionEnv::from_vars([("HOME", "/home/dev"), ("PATH", "/usr/bin:/bin")]),
            is_root,
        }
    }
}
