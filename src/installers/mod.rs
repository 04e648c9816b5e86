// The four pipeline steps, in the order `Pipeline::standard` runs them.

/// Step 1: system packages through the host package manager.
pub(crate) mod system_packages;

/// Step 2: fetch and run the tool installer script.
pub(crate) mod script_installer;

/// Step 3: source the environment file the installer wrote.
pub(crate) mod env_file;

/// Step 4: export the cache-directory variable.
pub(crate) mod cache_export;
