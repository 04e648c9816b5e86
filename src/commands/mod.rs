// Register application subcommands.
// Each module corresponds to a specific `setup-workspace` command-line action.

// Prints the cache export line from the configuration.
pub mod env;
// Writes the commented default configuration file.
pub mod generate;
// Runs the bootstrap pipeline.
pub mod now;
// Displays the version of setup-workspace.
pub mod version;
