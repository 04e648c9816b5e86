// `setup-workspace env`: prints the cache-directory export without running any step,
// e.g. for a shell profile: `eval "$(setup-workspace env)"`.

use crate::errors::BootstrapResult;
use crate::libs::config_loading::load_config;
use crate::libs::paths::resolve_config_path;
use crate::libs::session_env::export_line;
use std::process::ExitCode;

pub fn run(config_path: Option<String>) -> BootstrapResult<ExitCode> {
    let config = load_config(&resolve_config_path(config_path.as_deref()))?;
    println!("{}", export_line(&config.cache.variable, &config.cache.path));
    Ok(ExitCode::SUCCESS)
}
