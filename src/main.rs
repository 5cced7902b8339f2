//! wig-ensemble CLI
//!
//! Trains (or re-evaluates) a WiG ensemble on CIFAR.
//!
//! # Usage
//!
//! ```bash
//! # CIFAR-10 with defaults, dataset under ./data/cifar-10-batches-bin
//! wig-ensemble 10
//!
//! # CIFAR-100 with a config file and overrides
//! wig-ensemble 100 --config run.yaml --epochs 20 --seed 7
//! ```

use clap::Parser;
use std::process::ExitCode;
use wig_ensemble::cli::{init_logging, run_command, Cli, LogLevel};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(LogLevel::from_flags(cli.verbose, cli.quiet));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
