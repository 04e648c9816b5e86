use crate::cli::type_enums::{PackageManagerKind, PrivilegeMode};
use clap::{Args, Parser, Subcommand};

/// Defines the command-line interface (CLI) for 'setup-workspace'.
#[derive(Parser, Debug)]
#[command(name = "setup-workspace")]
#[command(version, about = "Bootstrap a workspace: system packages, uv, and a cache directory", long_about = None)]
pub struct Cli {
    /// Enables detailed debug output on stderr (also: SETUP_WORKSPACE_DEBUG=1).
    #[arg(short, long, global = true)]
    pub(crate) debug: bool,

    /// Defaults to `now` when omitted.
    #[command(subcommand)]
    pub(crate) command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the bootstrap pipeline: packages, installer, environment, cache export.
    Now(NowArgs),
    /// Writes a commented default configuration file.
    Generate {
        /// Where to write the file (defaults to ~/.setup-workspace/config.yaml).
        #[arg(long, env = "SETUP_WORKSPACE_CONFIG")]
        config: Option<String>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Prints the cache export line without running any step.
    Env {
        /// Optional path to the configuration file.
        #[arg(long, env = "SETUP_WORKSPACE_CONFIG")]
        config: Option<String>,
    },
    /// Show the current version of the tool.
    Version,
}

#[derive(Args, Debug, Default)]
pub struct NowArgs {
    /// Optional path to the configuration file (defaults to ~/.setup-workspace/config.yaml).
    #[arg(long, env = "SETUP_WORKSPACE_CONFIG")]
    pub config: Option<String>,

    /// Optional path to the run state file (defaults to ~/.setup-workspace/state.json).
    #[arg(long, env = "SETUP_WORKSPACE_STATE")]
    pub state: Option<String>,

    /// Overrides `package_manager` from the configuration file.
    #[arg(long, value_name = "MANAGER")]
    pub package_manager: Option<PackageManagerKind>,

    /// Overrides `privilege` from the configuration file [auto, sudo, none].
    #[arg(long, value_name = "MODE")]
    pub privilege: Option<PrivilegeMode>,

    /// Logs what each step would do and runs nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Prints `export` lines for the variables the run set, for `eval "$(...)"`.
    #[arg(long, conflicts_with = "exec")]
    pub emit_env: bool,

    /// Command to run with the final environment once every step succeeded.
    #[arg(last = true, value_name = "CMD")]
    pub exec: Vec<String>,
}

impl NowArgs {
    /// Arguments for a bare `setup-workspace` invocation, where clap never sees the
    /// `now` flags and so cannot apply their environment fallbacks.
    pub fn from_env() -> Self {
        NowArgs {
            config: std::env::var("SETUP_WORKSPACE_CONFIG").ok(),
            state: std::env::var("SETUP_WORKSPACE_STATE").ok(),
            ..NowArgs::default()
        }
    }
}
