//! CLI module
//!
//! Provides the command-line interface:
//! - init: write a default configuration file
//! - serve: boot the core and serve HTTP
//! - simulate: run one seeded episode and print its chain

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{init, run_command, serve, simulate};
pub use errors::{CliError, CliResult};

/// Parse arguments and dispatch. The only entry point `main` calls.
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}
