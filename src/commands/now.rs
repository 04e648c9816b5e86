// This file contains the primary logic for the `setup-workspace now` command.
// It loads the configuration, runs the four-step pipeline against the real system,
// records the outcome in `state.json` and hands the resulting environment to the
// caller: as `export` lines (`--emit-env`) or to a trailing command (`-- CMD`).

use crate::cli::cmd_enums::NowArgs;
use crate::errors::BootstrapResult;
use crate::installers::script_installer::UreqFetcher;
use crate::libs::command_runner::{CommandSpec, SystemRunner, run_attached};
use crate::libs::config_loading::load_config;
use crate::libs::paths::{resolve_config_path, resolve_state_path};
use crate::libs::pipeline::{Pipeline, StepContext};
use crate::libs::session_env::SessionEnv;
use crate::libs::state_management::{build_run_state, log_previous_run, save_run_state};
use crate::libs::utilities::platform::{detect_os, is_effective_root};
use crate::{log_debug, log_info, log_plan};
use colored::Colorize;
use std::process::ExitCode;

/// Main entry point for the `now` command.
///
/// # Workflow
/// 1. Resolve and load `config.yaml`, then apply command-line overrides.
/// 2. With `--dry-run`, log every step's plan and stop.
/// 3. Run the pipeline; it stops at the first failing step.
/// 4. Save `state.json` whatever the outcome (a failed write is only a warning).
/// 5. On failure return the step's error; on success emit or hand over the environment.
pub fn run(args: NowArgs) -> BootstrapResult<ExitCode> {
    log_debug!("[Now] Arguments: {:?}", args);

    let location = resolve_config_path(args.config.as_deref());
    let mut config = load_config(&location)?;
    if let Some(manager) = args.package_manager {
        config.package_manager = manager;
    }
    if let Some(privilege) = args.privilege {
        config.privilege = privilege;
    }

    let runner = SystemRunner;
    let fetcher = UreqFetcher;
    let mut ctx = StepContext {
        config: &config,
        runner: &runner,
        fetcher: &fetcher,
        session: SessionEnv::from_process(),
        is_root: is_effective_root(),
    };
    log_debug!("[Now] OS: {}, root: {}", detect_os(), ctx.is_root);

    let pipeline = Pipeline::standard();
    log_debug!("[Now] Steps: {}", pipeline.step_names().join(" -> "));
    if args.dry_run {
        log_info!("{}", "Dry run: nothing will be installed or executed".yellow());
        pipeline.plan(&ctx);
        if !args.exec.is_empty() {
            log_plan!("Then run: {}", args.exec.join(" ").bold());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let state_path = resolve_state_path(args.state.as_deref());
    log_previous_run(&state_path);

    let report = pipeline.run(&mut ctx);
    save_run_state(&state_path, &build_run_state(&report, &config, &ctx.session));
    if let Some((_, _, err)) = report.failure {
        return Err(err);
    }

    log_info!(
        "{} {}={}",
        "Workspace ready:".green().bold(),
        config.cache.variable,
        config.cache.path
    );

    log_debug!("[Now] Session variables set: {}", ctx.session.overlay().len());
    if args.emit_env {
        for line in ctx.session.export_lines() {
            println!("{line}");
        }
    }

    if let Some((program, rest)) = args.exec.split_first() {
        let spec = CommandSpec::new(program.clone(), rest.iter().cloned());
        let code = run_attached(&spec, &ctx.session)?;
        log_debug!("[Now] `{}` exited with {:?}", program, code);
        return Ok(match code {
            Some(c) if (0..=255).contains(&c) => ExitCode::from(c as u8),
            _ => ExitCode::FAILURE,
        });
    }

    if !args.emit_env {
        log_info!(
            "Run `{}` to apply the environment to your shell",
            "eval \"$(setup-workspace now --emit-env)\"".cyan()
        );
    }
    Ok(ExitCode::SUCCESS)
}
