//! # wig-ensemble
//!
//! Ensemble of weighted-sigmoid-gate (WiG) convolutional networks for
//! CIFAR-10/100, trained with mixup augmentation.
//!
//! The crate is layered bottom-up:
//!
//! - [`autograd`]: tape-based automatic differentiation over flat `f32` tensors
//! - [`optim`]: Adam with inverse-time learning-rate decay
//! - [`nn`]: gated convolutions and the deep-supervision ensemble
//! - [`data`]: CIFAR loading, augmentation and the mixup batch generator
//! - [`io`]: SafeTensors checkpoints
//! - [`train`]: loss, metrics, evaluation and the checkpointing training driver
//! - [`config`] / [`cli`]: YAML run configuration and the command line
//!
//! # Example
//!
//! ```no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use wig_ensemble::data::{load_dataset, DatasetKind};
//! use wig_ensemble::nn::{build_model, ModelConfig};
//! use wig_ensemble::train::{RunPaths, RunSettings, TrainingRun};
//!
//! # fn main() -> wig_ensemble::Result<()> {
//! let mut rng = StdRng::seed_from_u64(0);
//! let dataset = load_dataset(DatasetKind::Cifar10, "data", None)?;
//! let mut model = build_model(&ModelConfig::cifar(10), &mut rng);
//!
//! let mut run = TrainingRun::new(RunSettings::default(), RunPaths::new(".", "wig", 10));
//! let report = run.execute(&mut model, &dataset.train, &dataset.test, &mut rng, |line| {
//!     println!("{line}");
//! })?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod autograd;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod io;
pub mod nn;
pub mod optim;
pub mod train;

pub use autograd::Tensor;
pub use error::{Error, Result};
