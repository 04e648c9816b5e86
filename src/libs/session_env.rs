// The session environment: what every external command we spawn sees, and what we
// hand back to the caller's shell at the end of a run.
//
// A child process cannot change its parent's environment, so instead of mutating
// `std::env` we keep the inherited variables plus an ordered overlay of the
// variables the pipeline set. The overlay is applied to every later command and
// can be printed as `export` statements.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;

#[derive(Debug, Clone, Default)]
pub struct SessionEnv {
    inherited: BTreeMap<String, String>,
    // Insertion-ordered; a re-set keeps the original position. `None` means unset.
    overlay: Vec<(String, Option<String>)>,
}

impl SessionEnv {
    /// Snapshot of the current process environment, used for lookups and diffing.
    ///
    /// Variables whose name or value is not valid unicode are not part of the
    /// snapshot, but child processes still inherit them (see [`SessionEnv::apply_to`]).
    pub fn from_process() -> Self {
        Self::from_vars(std::env::vars_os().filter_map(|(k, v)| {
            Some((k.into_string().ok()?, v.into_string().ok()?))
        }))
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        SessionEnv {
            inherited: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            overlay: Vec::new(),
        }
    }

    /// Current value of `name`.
    ///
    /// # Arguments
    /// * `name`: The variable to look up.
    ///
    /// # Returns
    /// * `Option<&str>`: The overlay value when the session set or unset `name`,
    ///   otherwise the inherited value. `None` when the variable is unset.
    pub fn get(&self, name: &str) -> Option<&str> {
        match self.overlay.iter().find(|(k, _)| k == name) {
            Some((_, value)) => value.as_deref(),
            None => self.inherited.get(name).map(String::as_str),
        }
    }

    /// Sets `name` for the rest of the session. The value is stored verbatim.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.record(name.into(), Some(value.into()));
    }

    /// Removes `name` from the session, hiding any inherited value.
    pub fn unset(&mut self, name: impl Into<String>) {
        self.record(name.into(), None);
    }

    fn record(&mut self, name: String, value: Option<String>) {
        match self.overlay.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.overlay.push((name, value)),
        }
    }

    /// Variables set or unset during this session, in the order they were first touched.
    pub fn overlay(&self) -> &[(String, Option<String>)] {
        &self.overlay
    }

    /// Names of every variable currently set, inherited or not, in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .inherited
            .keys()
            .map(String::as_str)
            .chain(self.overlay.iter().map(|(k, _)| k.as_str()))
            .filter(|name| self.get(name).is_some())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Applies the overlay to `cmd`.
    ///
    /// The child keeps the environment of this process as-is (including variables
    /// that are not valid unicode) and only sees the session's changes on top.
    ///
    /// # Arguments
    /// * `cmd`: The command about to be spawned.
    pub fn apply_to(&self, cmd: &mut Command) {
        for (name, value) in &self.overlay {
            match value {
                Some(value) => cmd.env(name, value),
                None => cmd.env_remove(name),
            };
        }
    }

    /// Directories of the effective `PATH`, in lookup order.
    pub fn path_dirs(&self) -> Vec<PathBuf> {
        self.get("PATH")
            .map(|p| std::env::split_paths(p).collect())
            .unwrap_or_default()
    }

    /// Shell statements that replay the overlay in a POSIX shell, one per line.
    ///
    /// # Returns
    /// * `Vec<String>`: `export NAME='value'` for every variable set and
    ///   `unset NAME` for every variable removed, in overlay order.
    pub fn export_lines(&self) -> Vec<String> {
        self.overlay
            .iter()
            .map(|(k, v)| match v {
                Some(v) => export_line(k, v),
                None => format!("unset {k}"),
            })
            .collect()
    }
}

/// `export NAME='value'`, quoted so any value survives `eval` unchanged.
///
/// # Arguments
/// * `name`: A valid shell variable name; it is not quoted.
/// * `value`: Any string, emitted byte-for-byte inside single quotes.
pub fn export_line(name: &str, value: &str) -> String {
    format!("export {}={}", name, shell_quote(value))
}

/// Single-quotes `value` for a POSIX shell.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
