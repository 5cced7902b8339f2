//! Training: loss, metrics, evaluation and the checkpointing driver
//!
//! - [`CategoricalCrossEntropy`] on softmax outputs
//! - [`Accuracy`] by arg-max agreement
//! - [`evaluate`] over a whole split in evaluation mode
//! - [`EpochLog`] CSV rows, one per epoch
//! - [`TrainingRun`] tying it together with mixup batches, Adam and checkpoints

mod batch;
mod evaluate;
mod log;
mod loss;
mod metrics;
mod run;

pub use batch::Batch;
pub use evaluate::{evaluate, Evaluation};
pub use log::{read_log, EpochLog, EpochRecord, LOG_HEADER};
pub use loss::{CategoricalCrossEntropy, LossFn};
pub use metrics::{argmax_rows, Accuracy, Metric};
pub use run::{RunPaths, RunPhase, RunReport, RunSettings, TrainingRun};
