//! Core CLI type and override handling

use crate::config::RunConfig;
use clap::Parser;
use std::path::PathBuf;

/// Train a WiG ensemble on CIFAR-10 or CIFAR-100 with mixup augmentation
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "wig-ensemble")]
#[command(version)]
#[command(about = "Train a gated-convolution ensemble on CIFAR-10/100 with mixup")]
pub struct Cli {
    /// Number of classes: 10 (CIFAR-10) or 100 (CIFAR-100)
    #[arg(value_name = "CLASSES", value_parser = parse_class_count)]
    pub classes: usize,

    /// Path to a YAML run configuration
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the dataset root directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Override the output directory for the checkpoint and log
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Override the checkpoint and log filename stem
    #[arg(short, long)]
    pub title: Option<String>,

    /// Override number of epochs
    #[arg(short, long)]
    pub epochs: Option<usize>,

    /// Override optimizer steps per epoch
    #[arg(long)]
    pub steps_per_epoch: Option<usize>,

    /// Override batch size
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Accept only the class counts of the CIFAR variants
pub fn parse_class_count(s: &str) -> Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{s}' is not a class count"))?;
    match n {
        10 | 100 => Ok(n),
        _ => Err(format!("unsupported class count {n} (expected 10 or 100)")),
    }
}

/// Parse arguments without exiting the process
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Apply command-line overrides to a RunConfig
pub fn apply_overrides(config: &mut RunConfig, cli: &Cli) {
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(output_dir) = &cli.output_dir {
        config.output_dir = output_dir.clone();
    }
    if let Some(title) = &cli.title {
        config.title = title.clone();
    }
    if let Some(epochs) = cli.epochs {
        config.epochs = epochs;
    }
    if let Some(steps) = cli.steps_per_epoch {
        config.steps_per_epoch = steps;
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }
    if let Some(seed) = cli.seed {
        config.seed = Some(seed);
    }
}
