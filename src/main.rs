mod cli;
mod commands;
mod errors;
mod installers;
mod libs;
mod logger;
mod schemas;

use clap::Parser;
use cli::cmd_enums::{Cli, Commands, NowArgs};
use colored::Colorize;
use commands::{env, generate, now, version};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logger::init(cli.debug);

    let result = match cli.command.unwrap_or_else(|| Commands::Now(NowArgs::from_env())) {
        Commands::Now(args) => now::run(args),
        Commands::Generate { config, force } => generate::run(config, force),
        Commands::Env { config } => env::run(config),
        Commands::Version => Ok(version::run()),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            log_error!("{}: {}", err.category().red().bold(), err);
            ExitCode::from(err.exit_code())
        }
    }
}
