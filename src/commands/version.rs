// `setup-workspace version`: prints the version this binary was built from.

use std::process::ExitCode;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() -> ExitCode {
    println!("setup-workspace {VERSION}");
    ExitCode::SUCCESS
}
