//! CLI module for wig-ensemble
//!
//! Argument handling lives in [`crate::config`]; this module turns parsed
//! arguments into a training run and owns console output.

mod commands;
mod logging;

pub use commands::run_command;
pub use logging::{init_logging, log, LogLevel};

// Re-export Cli from config for convenience
pub use crate::config::Cli;
