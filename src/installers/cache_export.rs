//! # Cache Export Step
//!
//! Step 4, the last step of the pipeline: set the cache-directory variable (by default
//! `HF_HOME=/workspace/cache/`) on the session. The path is exported exactly as
//! configured; it is neither normalised nor created.

use crate::errors::BootstrapResult;
use crate::libs::pipeline::{Step, StepContext, StepOutcome};
use crate::libs::session_env::export_line;
use crate::log_info;
use colored::Colorize;

pub struct CacheExportStep;

impl Step for CacheExportStep {
    fn name(&self) -> &'static str {
        "export-cache-dir"
    }

    fn plan(&self, ctx: &StepContext<'_>) -> Vec<String> {
        vec![export_line(&ctx.config.cache.variable, &ctx.config.cache.path)]
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> BootstrapResult<StepOutcome> {
        let cache = &ctx.config.cache;
        ctx.session.set(cache.variable.clone(), cache.path.clone());
        log_info!(
            "[Cache] {}={}",
            cache.variable.bold(),
            cache.path.green()
        );
        Ok(StepOutcome::Done(format!("{}={}", cache.variable, cache.path)))
    }
}
