// CLI module
// Command-line arguments and logging setup

mod args;
mod logger;

pub use args::{CliArgs, LineEndingArg};
pub use logger::init_cli_logger;

use clap::Parser;

/// Parse command-line arguments using clap
///
/// On invalid arguments or `--help`, clap prints the message and exits.
pub fn parse_args() -> CliArgs {
    CliArgs::parse()
}
