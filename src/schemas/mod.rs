// Data structures for the files setup-workspace reads and writes.

/// `config.yaml`: what to install, where to fetch the installer, what to export.
pub mod bootstrap_config;
/// `state.json`: the outcome of the last run.
pub mod state_file;
