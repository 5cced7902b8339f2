//! CLI command implementations

mod train;


use crate::cli::LogLevel;
use crate::config::Cli;

/// Execute a training run from parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);
    train::run_train(cli, log_level)
}
