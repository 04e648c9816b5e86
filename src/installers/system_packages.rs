//! # System Package Step
//!
//! Step 1 of the pipeline: make sure every configured package (by default `git`,
//! `curl` and `tmux`) is installed through the host package manager.
//!
//! ## Workflow
//!
//! 1. **Manager Resolution**: use the configured manager, or search PATH for
//!    `apt-get`, `dnf`, `yum`, `apk`, `pacman`, `zypper`, `brew` in that order
//! 2. **Installed Check**: query each package (`dpkg-query`, `rpm -q`, ...) so a second
//!    run finds nothing to do
//! 3. **Privilege Decision**: run as-is when root, otherwise through `sudo -n`
//! 4. **Refresh + Install**: one non-interactive install command for the missing packages
//!
//! Any failure is a `PackageManager`-class error and aborts the pipeline before the
//! installer is fetched.

use crate::cli::type_enums::{PackageManagerKind, PrivilegeMode};
use crate::errors::{BootstrapError, BootstrapResult};
use crate::libs::command_runner::{CommandOutput, CommandSpec};
use crate::libs::pipeline::{Step, StepContext, StepOutcome};
use crate::{log_debug, log_error, log_info, log_warn};
use colored::Colorize;

/// A concrete package manager the step knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
    Apk,
    Pacman,
    Zypper,
    Brew,
}

/// Detection order for `package_manager: auto`.
pub const DETECTION_ORDER: [PackageManager; 7] = [
    PackageManager::Apt,
    PackageManager::Dnf,
    PackageManager::Yum,
    PackageManager::Apk,
    PackageManager::Pacman,
    PackageManager::Zypper,
    PackageManager::Brew,
];

impl PackageManager {
    /// Maps an explicit config choice; `Auto` has no fixed manager.
    pub fn from_kind(kind: PackageManagerKind) -> Option<Self> {
        match kind {
            PackageManagerKind::Auto => None,
            PackageManagerKind::Apt => Some(PackageManager::Apt),
            PackageManagerKind::Dnf => Some(PackageManager::Dnf),
            PackageManagerKind::Yum => Some(PackageManager::Yum),
            PackageManagerKind::Apk => Some(PackageManager::Apk),
            PackageManagerKind::Pacman => Some(PackageManager::Pacman),
            PackageManagerKind::Zypper => Some(PackageManager::Zypper),
            PackageManagerKind::Brew => Some(PackageManager::Brew),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Apk => "apk",
            PackageManager::Pacman => "pacman",
            PackageManager::Zypper => "zypper",
            PackageManager::Brew => "brew",
        }
    }

    /// The executable whose presence identifies this manager.
    pub fn binary(&self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get",
            other => other.name(),
        }
    }

    /// Homebrew refuses to run as root.
    pub fn allows_escalation(&self) -> bool {
        !matches!(self, PackageManager::Brew)
    }

    fn noninteractive_env(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            PackageManager::Apt => &[("DEBIAN_FRONTEND", "noninteractive")],
            PackageManager::Brew => &[("HOMEBREW_NO_AUTO_UPDATE", "1")],
            _ => &[],
        }
    }

    /// Read-only query telling whether `package` is installed.
    pub fn query_command(&self, package: &str) -> CommandSpec {
        match self {
            PackageManager::Apt => {
                CommandSpec::new("dpkg-query", ["-W", "-f=${Status}", package])
            }
            PackageManager::Dnf | PackageManager::Yum | PackageManager::Zypper => {
                CommandSpec::new("rpm", ["-q", package])
            }
            PackageManager::Apk => CommandSpec::new("apk", ["info", "-e", package]),
            PackageManager::Pacman => CommandSpec::new("pacman", ["-Q", package]),
            PackageManager::Brew => CommandSpec::new("brew", ["list", "--versions", package]),
        }
    }

    /// Interprets the output of `query_command`.
    pub fn reports_installed(&self, output: &CommandOutput) -> bool {
        match self {
            // dpkg-query also succeeds for removed packages that left config files behind.
            PackageManager::Apt => {
                output.success() && output.stdout_lossy().contains("install ok installed")
            }
            // `brew list --versions` exits 0 with empty output for unknown formulae.
            PackageManager::Brew => output.success() && !output.stdout_lossy().trim().is_empty(),
            _ => output.success(),
        }
    }

    /// Index refresh to run before installing, if the manager needs one.
    pub fn refresh_args(&self) -> Option<Vec<String>> {
        match self {
            PackageManager::Apt => Some(vec!["update".into()]),
            _ => None,
        }
    }

    /// Arguments (after the binary) that install `packages` without prompting.
    pub fn install_args(&self, packages: &[String]) -> Vec<String> {
        let base: &[&str] = match self {
            PackageManager::Apt => &["install", "-y"],
            PackageManager::Dnf | PackageManager::Yum => &["install", "-y"],
            PackageManager::Apk => &["add", "--no-cache"],
            PackageManager::Pacman => &["-S", "--noconfirm", "--needed"],
            PackageManager::Zypper => &["--non-interactive", "install"],
            PackageManager::Brew => &["install"],
        };
        base.iter()
            .map(|s| s.to_string())
            .chain(packages.iter().cloned())
            .collect()
    }

    /// Builds the full command, wrapping it in `sudo -n env ...` when escalating.
    /// `sudo` drops the caller's environment, so the non-interactive variables are
    /// passed through `env` in that case.
    pub fn command(&self, args: Vec<String>, escalate: bool) -> CommandSpec {
        let env = self.noninteractive_env();
        if escalate {
            let mut sudo_args: Vec<String> = vec!["-n".into()];
            if !env.is_empty() {
                sudo_args.push("env".into());
                sudo_args.extend(env.iter().map(|(k, v)| format!("{k}={v}")));
            }
            sudo_args.push(self.binary().into());
            sudo_args.extend(args);
            CommandSpec::new("sudo", sudo_args)
        } else {
            env.iter().fold(CommandSpec::new(self.binary(), args), |spec, (k, v)| {
                spec.with_env(*k, *v)
            })
        }
    }
}

/// Decides whether installs go through `sudo`.
///
/// * `none`: never.
/// * `sudo`: always, unless the manager forbids it (Homebrew). `sudo` must exist.
/// * `auto`: not when already root or for Homebrew; otherwise `sudo` must exist.
///
/// # Arguments
/// * `mode`: The configured `privilege` setting.
/// * `manager`: The resolved package manager.
/// * `is_root`: Whether this process runs with effective uid 0.
/// * `sudo_available`: Whether `sudo` is on the session PATH.
///
/// # Returns
/// * `Ok(true)` to prefix installs with `sudo -n`, `Ok(false)` to run them as-is.
/// * `Err(PrivilegesRequired)` when `sudo` is needed but missing, so nothing is
///   spawned that could only fail.
pub fn resolve_escalation(
    mode: PrivilegeMode,
    manager: PackageManager,
    is_root: bool,
    sudo_available: bool,
) -> BootstrapResult<bool> {
    if !manager.allows_escalation() {
        if mode == PrivilegeMode::Sudo {
            log_warn!(
                "[Packages] Ignoring 'privilege: sudo' for {}, it must not run as root",
                manager.name().yellow()
            );
        }
        return Ok(false);
    }
    let missing_sudo = |reason: &str| BootstrapError::PrivilegesRequired {
        manager: manager.name().to_string(),
        reason: reason.to_string(),
    };
    match mode {
        PrivilegeMode::None => Ok(false),
        PrivilegeMode::Sudo if sudo_available => Ok(true),
        PrivilegeMode::Sudo => Err(missing_sudo("privilege is set to sudo")),
        PrivilegeMode::Auto if is_root => Ok(false),
        PrivilegeMode::Auto if sudo_available => Ok(true),
        PrivilegeMode::Auto => Err(missing_sudo("this process is not root")),
    }
}

/// Step 1: `system-packages`.
pub struct SystemPackagesStep;

impl SystemPackagesStep {
    fn resolve_manager(&self, ctx: &StepContext<'_>) -> BootstrapResult<PackageManager> {
        if let Some(manager) = PackageManager::from_kind(ctx.config.package_manager) {
            log_debug!("[Packages] Using configured package manager {}", manager.name().cyan());
            return Ok(manager);
        }
        DETECTION_ORDER
            .into_iter()
            .find(|m| ctx.runner.locate(m.binary(), &ctx.session).is_some())
            .inspect(|m| log_debug!("[Packages] Detected package manager {}", m.name().cyan()))
            .ok_or_else(|| BootstrapError::UnsupportedPackageManager {
                searched: DETECTION_ORDER
                    .iter()
                    .map(|m| m.binary())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    fn missing_packages(&self, ctx: &StepContext<'_>, manager: PackageManager) -> Vec<String> {
        ctx.config
            .packages
            .iter()
            .filter(|package| {
                let query = manager.query_command(package);
                match ctx.runner.run(&query, &ctx.session) {
                    Ok(out) if manager.reports_installed(&out) => {
                        log_debug!("[Packages] {} already installed", package.green());
                        false
                    }
                    Ok(_) => true,
                    Err(e) => {
                        // Treat an unanswerable query as "missing" and let the install decide.
                        log_debug!("[Packages] Could not query {}: {}", package, e);
                        true
                    }
                }
            })
            .cloned()
            .collect()
    }

    fn execute(
        &self,
        ctx: &StepContext<'_>,
        manager: PackageManager,
        spec: &CommandSpec,
    ) -> BootstrapResult<()> {
        log_info!("[Packages] Executing: {}", spec.display().cyan());
        let output = ctx.runner.run(spec, &ctx.session)?;
        if !output.stdout.is_empty() {
            log_debug!("[Packages] Stdout: {}", output.stdout_lossy());
        }
        if output.success() {
            return Ok(());
        }
        let stderr = output.stderr_lossy();
        log_error!(
            "[Packages] `{}` failed, {} output:\n{}",
            spec.display().red(),
            manager.name(),
            stderr.trim_end()
        );
        Err(BootstrapError::PackageManager {
            manager: manager.name().to_string(),
            command: spec.display(),
            code: output.code,
            stderr,
        })
    }
}

impl Step for SystemPackagesStep {
    fn name(&self) -> &'static str {
        "system-packages"
    }

    // Runs only the read-only installed queries, so the plan shows what `run` would do.
    fn plan(&self, ctx: &StepContext<'_>) -> Vec<String> {
        if ctx.config.packages.is_empty() {
            return vec!["no packages configured, nothing to install".into()];
        }
        let manager = match self.resolve_manager(ctx) {
            Ok(manager) => manager,
            Err(e) => return vec![format!("would fail: {e}")],
        };
        let missing = self.missing_packages(ctx, manager);
        if missing.is_empty() {
            return vec![format!(
                "all {} packages already installed via {}, nothing to install",
                ctx.config.packages.len(),
                manager.name()
            )];
        }

        let sudo_available = ctx.runner.locate("sudo", &ctx.session).is_some();
        let escalate =
            match resolve_escalation(ctx.config.privilege, manager, ctx.is_root, sudo_available) {
                Ok(escalate) => escalate,
                Err(e) => return vec![format!("would fail: {e}")],
            };
        let mut lines = vec![format!(
            "install via {}{}: {}",
            manager.name(),
            if escalate { " (via sudo)" } else { "" },
            missing.join(", ")
        )];
        if let Some(refresh) = manager.refresh_args() {
            lines.push(manager.command(refresh, escalate).display());
        }
        lines.push(manager.command(manager.install_args(&missing), escalate).display());
        lines
    }

    fn run(&self, ctx: &mut StepContext<'_>) -> BootstrapResult<StepOutcome> {
        if ctx.config.packages.is_empty() {
            return Ok(StepOutcome::Skipped("no packages configured".into()));
        }

        let manager = self.resolve_manager(ctx)?;
        let missing = self.missing_packages(ctx, manager);
        if missing.is_empty() {
            log_info!(
                "[Packages] All {} packages already installed: {}",
                ctx.config.packages.len(),
                ctx.config.packages.join(", ").green()
            );
            return Ok(StepOutcome::Skipped(format!(
                "all {} packages already installed",
                ctx.config.packages.len()
            )));
        }

        let sudo_available = ctx.runner.locate("sudo", &ctx.session).is_some();
        let escalate = resolve_escalation(ctx.config.privilege, manager, ctx.is_root, sudo_available)?;
        log_info!(
            "[Packages] Installing {} with {}{}",
            missing.join(", ").bold(),
            manager.name().cyan(),
            if escalate { " (via sudo)" } else { "" }
        );

        if let Some(refresh) = manager.refresh_args() {
            self.execute(ctx, manager, &manager.command(refresh, escalate))?;
        }
        self.execute(ctx, manager, &manager.command(manager.install_args(&missing), escalate))?;

        log_info!("[Packages] Installed: {}", missing.join(", ").green());
        Ok(StepOutcome::Done(format!("installed {}", missing.join(", "))))
    }
}
