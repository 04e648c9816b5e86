// Shared machinery behind the commands: process execution, the session
// environment, the step pipeline and config/state file handling.

pub(crate) mod command_runner;
pub(crate) mod config_loading;
pub(crate) mod paths;
pub(crate) mod pipeline;
pub(crate) mod session_env;
pub(crate) mod state_management;
pub(crate) mod utilities;
