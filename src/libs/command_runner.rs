// Every external program the pipeline drives goes through `CommandRunner`.
// The system implementation spawns real processes; tests substitute a recording
// fake so step ordering and failure propagation can be checked without a package
// manager or network.

use crate::errors::{BootstrapError, BootstrapResult};
use crate::libs::session_env::SessionEnv;
use crate::libs::utilities::binary::find_in_dirs;
use crate::log_debug;
use colored::Colorize;
use std::path::PathBuf;
use std::process::Command;

/// A fully described external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Set on top of the session environment for this command only.
    pub extra_env: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            extra_env: Vec::new(),
        }
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_env.push((name.into(), value.into()));
        self
    }

    /// The command line as it would be typed, for logs and error messages.
    pub fn display(&self) -> String {
        let env = self.extra_env.iter().map(|(k, v)| format!("{k}={v}"));
        env.chain(std::iter::once(self.program.clone()))
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

pub trait CommandRunner {
    /// Runs `spec` to completion and captures its output.
    ///
    /// # Arguments
    /// * `spec`: Program, arguments and per-command variables.
    /// * `session`: The environment the command runs in.
    ///
    /// # Returns
    /// * `Ok(CommandOutput)` once the process exits, whatever its exit code.
    /// * `Err(CommandSpawn)` only when the process could not be started.
    fn run(&self, spec: &CommandSpec, session: &SessionEnv) -> BootstrapResult<CommandOutput>;

    /// Resolves `program` against the session's PATH.
    ///
    /// # Returns
    /// * `Some(path)` of the first executable match, `None` when there is none.
    fn locate(&self, program: &str, session: &SessionEnv) -> Option<PathBuf> {
        find_in_dirs(program, &session.path_dirs())
    }
}

/// Spawns real processes.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec, session: &SessionEnv) -> BootstrapResult<CommandOutput> {
        log_debug!("[Runner] Executing: {}", spec.display().cyan());

        let output = command_for(spec, session)
            .output()
            .map_err(|source| BootstrapError::CommandSpawn {
                program: spec.program.clone(),
                source,
            })?;

        let result = CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        };
        log_debug!(
            "[Runner] `{}` finished with {:?}",
            spec.program,
            result.code
        );
        Ok(result)
    }
}

// This process's environment, then the session overlay, then the per-command variables.
fn command_for(spec: &CommandSpec, session: &SessionEnv) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);
    session.apply_to(&mut cmd);
    cmd.envs(spec.extra_env.iter().map(|(k, v)| (k, v)));
    cmd
}

/// Runs `spec` attached to the caller's terminal.
///
/// # Arguments
/// * `spec`: The command to run; its `extra_env` is applied last.
/// * `session`: Its overlay is applied on top of this process's environment.
///
/// # Returns
/// * `Ok(Some(code))` with the child's exit code.
/// * `Ok(None)` when the child was killed by a signal.
/// * `Err(CommandSpawn)` when the program could not be started.
pub fn run_attached(spec: &CommandSpec, session: &SessionEnv) -> BootstrapResult<Option<i32>> {
    log_debug!("[Runner] Handing over to: {}", spec.display().cyan());
    let status = command_for(spec, session)
        .status()
        .map_err(|source| BootstrapError::CommandSpawn {
            program: spec.program.clone(),
            source,
        })?;
    Ok(status.code())
}

#[cfg(test)]
pub(crate) mod fake {
    //! Recording runner for unit tests.

    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;

    /// Answers commands by matching their display string against registered
    /// prefixes; the first match wins, unmatched commands succeed with no output.
    #[derive(Default)]
    pub struct FakeRunner {
        responses: Vec<(String, CommandOutput)>,
        programs: HashSet<String>,
        pub calls: RefCell<Vec<CommandSpec>>,
    }

    impl FakeRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes `locate` find `program`.
        pub fn with_program(mut self, program: &str) -> Self {
            self.programs.insert(program.to_string());
            self
        }

        pub fn respond(mut self, prefix: &str, code: i32, stdout: &str, stderr: &str) -> Self {
            self.responses.push((
                prefix.to_string(),
                CommandOutput {
                    code: Some(code),
                    stdout: stdout.as_bytes().to_vec(),
                    stderr: stderr.as_bytes().to_vec(),
                },
            ));
            self
        }

        pub fn fail(self, prefix: &str, code: i32, stderr: &str) -> Self {
            self.respond(prefix, code, "", stderr)
        }

        pub fn displayed_calls(&self) -> Vec<String> {
            self.calls.borrow().iter().map(CommandSpec::display).collect()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, spec: &CommandSpec, _session: &SessionEnv) -> BootstrapResult<CommandOutput> {
            self.calls.borrow_mut().push(spec.clone());
            let line = spec.display();
            Ok(self
                .responses
                .iter()
                .find(|(prefix, _)| line.starts_with(prefix.as_str()))
                .map(|(_, out)| out.clone())
                .unwrap_or(CommandOutput {
                    code: Some(0),
                    ..CommandOutput::default()
                }))
        }

        fn locate(&self, program: &str, _session: &SessionEnv) -> Option<PathBuf> {
            self.programs
                .contains(program)
                .then(|| PathBuf::from("/usr/bin").join(program))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_env_then_command() {
        let spec = CommandSpec::new("apt-get", ["install", "-y", "git"])
            .with_env("DEBIAN_FRONTEND", "noninteractive");
        assert_eq!(
            spec.display(),
            "DEBIAN_FRONTEND=noninteractive apt-get install -y git"
        );
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_uses_session_environment() {
        let mut session = SessionEnv::from_process();
        session.set("SETUP_WORKSPACE_MARKER", "from-session");
        let spec = CommandSpec::new("sh", ["-c", "printf %s \"$SETUP_WORKSPACE_MARKER$EXTRA\""])
            .with_env("EXTRA", "+extra");
        let out = SystemRunner.run(&spec, &session).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout_lossy(), "from-session+extra");
    }

    #[cfg(unix)]
    #[test]
    fn system_runner_reports_exit_codes() {
        let session = SessionEnv::from_process();
        let out = SystemRunner
            .run(&CommandSpec::new("sh", ["-c", "echo oops >&2; exit 7"]), &session)
            .unwrap();
        assert_eq!(out.code, Some(7));
        assert!(!out.success());
        assert_eq!(out.stderr_lossy().trim(), "oops");
    }

    #[cfg(unix)]
    #[test]
    fn attached_run_returns_exit_code() {
        let mut session = SessionEnv::from_process();
        session.set("SETUP_WORKSPACE_MARKER", "5");
        let spec = CommandSpec::new("sh", ["-c", "exit $SETUP_WORKSPACE_MARKER"]);
        assert_eq!(run_attached(&spec, &session).unwrap(), Some(5));
    }

    #[test]
    fn missing_programs_are_spawn_errors() {
        let session = SessionEnv::from_process();
        let err = SystemRunner
            .run(&CommandSpec::new("setup-workspace-no-such-binary", Vec::<String>::new()), &session)
            .unwrap_err();
        assert!(matches!(err, BootstrapError::CommandSpawn { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn children_inherit_variables_missing_from_the_session() {
        // An empty session still passes this process's environment through.
        let mut session = SessionEnv::default();
        session.unset("HOME");
        let spec = CommandSpec::new("sh", ["-c", "printf '%s|%s' \"${PATH:+set}\" \"${HOME-unset}\""]);
        let out = SystemRunner.run(&spec, &session).unwrap();
        assert_eq!(out.stdout_lossy(), "set|unset");
    }
}
