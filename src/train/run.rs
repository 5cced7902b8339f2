//! Checkpointing training driver
//!
//! A run moves through [`RunPhase`]s:
//!
//! ```text
//! Init -> Skipped | Training -> LoadBest -> Report -> Done
//! ```
//!
//! An existing checkpoint short-circuits training. Otherwise every epoch
//! runs `steps_per_epoch` Adam updates on mixup batches, evaluates on both
//! splits, appends one log row, and saves the weights whenever the training
//! cross-entropy improves. The final report always comes from the weights
//! on disk.

use super::{
    evaluate, Accuracy, CategoricalCrossEntropy, EpochLog, EpochRecord, Evaluation, LossFn, Metric,
    LOG_HEADER,
};
use crate::autograd::{add, backward, Context};
use crate::data::{ColorJitter, ImageAugmenter, ImageBatch, MixupGenerator};
use crate::io::{load_checkpoint, save_checkpoint, CheckpointMeta, CHECKPOINT_EXTENSION};
use crate::nn::WigEnsemble;
use crate::optim::{Adam, Optimizer};
use crate::{Result, Tensor};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Stage of a [`TrainingRun`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    Skipped,
    Training,
    LoadBest,
    Report,
    Done,
}

/// Output files of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPaths {
    pub checkpoint: PathBuf,
    pub log: PathBuf,
}

impl RunPaths {
    /// `<dir>/<title><classes>.safetensors` and `<dir>/<title><classes>.csv`
    pub fn new(output_dir: impl AsRef<Path>, title: &str, nb_classes: usize) -> Self {
        let stem = format!("{title}{nb_classes}");
        let dir = output_dir.as_ref();
        Self {
            checkpoint: dir.join(format!("{stem}.{CHECKPOINT_EXTENSION}")),
            log: dir.join(format!("{stem}.csv")),
        }
    }
}

/// Loop hyperparameters
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub epochs: usize,
    pub steps_per_epoch: usize,
    pub batch_size: usize,
    pub eval_batch_size: usize,
    pub learning_rate: f32,
    pub mixup_alpha: f32,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            epochs: 100,
            steps_per_epoch: 100,
            batch_size: 1000,
            eval_batch_size: 250,
            learning_rate: 0.001,
            mixup_alpha: 0.2,
        }
    }
}

/// Outcome of a run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// False when an existing checkpoint was reused
    pub trained: bool,
    /// Rows appended to the log by this run
    pub epochs_logged: usize,
    pub train: Evaluation,
    pub test: Evaluation,
    pub checkpoint: PathBuf,
}

fn write_block(f: &mut fmt::Formatter<'_>, title: &str, eval: &Evaluation) -> fmt::Result {
    writeln!(f, "{title}:")?;
    writeln!(f, "{} : {}", CategoricalCrossEntropy::default().name(), eval.crossentropy)?;
    writeln!(f, "{} : {}", Accuracy.name(), eval.accuracy)
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_block(f, "train data", &self.train)?;
        write_block(f, "test data", &self.test)
    }
}

/// One training run bound to its output files
pub struct TrainingRun {
    settings: RunSettings,
    paths: RunPaths,
    phase: RunPhase,
}

impl TrainingRun {
    pub fn new(settings: RunSettings, paths: RunPaths) -> Self {
        Self { settings, paths, phase: RunPhase::Init }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn paths(&self) -> &RunPaths {
        &self.paths
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Train (unless a checkpoint exists), reload the best weights and
    /// evaluate both splits
    ///
    /// `progress` receives the console lines: a header and one line per epoch.
    pub fn execute(
        &mut self,
        model: &mut WigEnsemble,
        train: &ImageBatch,
        test: &ImageBatch,
        rng: &mut StdRng,
        mut progress: impl FnMut(&str),
    ) -> Result<RunReport> {
        self.phase = RunPhase::Init;
        let trained = !self.paths.checkpoint.exists();
        let epochs_logged = if trained {
            self.phase = RunPhase::Training;
            self.train_loop(model, train, test, rng, &mut progress)?
        } else {
            self.phase = RunPhase::Skipped;
            info!(path = %self.paths.checkpoint.display(), "checkpoint exists, skipping training");
            0
        };

        self.phase = RunPhase::LoadBest;
        load_checkpoint(model, &self.paths.checkpoint)?;

        self.phase = RunPhase::Report;
        let eval_bs = self.settings.eval_batch_size;
        let report = RunReport {
            trained,
            epochs_logged,
            train: evaluate(model, train, eval_bs)?,
            test: evaluate(model, test, eval_bs)?,
            checkpoint: self.paths.checkpoint.clone(),
        };

        self.phase = RunPhase::Done;
        Ok(report)
    }

    fn train_loop(
        &self,
        model: &mut WigEnsemble,
        train: &ImageBatch,
        test: &ImageBatch,
        rng: &mut StdRng,
        progress: &mut impl FnMut(&str),
    ) -> Result<usize> {
        let s = &self.settings;
        let mut generator = MixupGenerator::new(
            train.clone(),
            s.batch_size,
            s.mixup_alpha,
            ImageAugmenter::default(),
            ColorJitter::default(),
            StdRng::seed_from_u64(rng.random()),
        )?;
        let mut optimizer = Adam::default_params(s.learning_rate)
            .with_decay(Adam::decay_for(s.epochs * s.steps_per_epoch));
        let loss_fn = CategoricalCrossEntropy::default();
        let ctx = Context::new();

        let mut log = EpochLog::create(&self.paths.log)?;
        progress(LOG_HEADER);

        let mut best: Option<f32> = None;
        for epoch in 0..s.epochs {
            let mut running = 0.0f32;
            for _ in 0..s.steps_per_epoch {
                let batch = generator.next_batch()?.to_batch();
                running +=
                    train_step(model, &mut optimizer, &loss_fn, &ctx, &batch.inputs, &batch.targets);
            }
            debug!(
                epoch,
                mean_loss = running / s.steps_per_epoch.max(1) as f32,
                lr = optimizer.decayed_lr(),
                "epoch finished"
            );

            let train_eval = evaluate(model, train, s.eval_batch_size)?;
            let test_eval = evaluate(model, test, s.eval_batch_size)?;

            let saved = best.map_or(true, |b| train_eval.crossentropy < b);
            if saved {
                best = Some(train_eval.crossentropy);
                let meta = CheckpointMeta::new(epoch, train_eval.crossentropy, model.config.clone());
                save_checkpoint(model, &self.paths.checkpoint, &meta)?;
            }

            let record = EpochRecord {
                epoch,
                crossentropy: train_eval.crossentropy,
                accuracy: train_eval.accuracy,
                val_crossentropy: test_eval.crossentropy,
                val_accuracy: test_eval.accuracy,
                saved,
            };
            log.append(&record)?;
            progress(&format!(
                "{}, {}, {}, {}, {}, {}",
                record.epoch,
                record.crossentropy,
                record.accuracy,
                record.val_crossentropy,
                record.val_accuracy,
                if saved { "*" } else { "-" }
            ));
        }

        log.close()?;
        info!(epochs = s.epochs, path = %self.paths.log.display(), "training finished");
        Ok(s.epochs)
    }
}

/// One optimizer update, returning the scalar loss
///
/// The loss is the categorical cross-entropy of the ensemble output plus the
/// L2 penalty on the value kernels.
fn train_step(
    model: &mut WigEnsemble,
    optimizer: &mut Adam,
    loss_fn: &CategoricalCrossEntropy,
    ctx: &Context,
    inputs: &Tensor,
    targets: &Tensor,
) -> f32 {
    model.zero_grad();

    let value = {
        let probs = model.forward(inputs, ctx);
        let ce = loss_fn.forward(&probs, targets);
        let mut loss = add(&ce, &model.regularization_loss());
        let value = loss.data()[0];
        backward(&mut loss, None);
        value
    };

    // Graph dropped above, so parameter buffers are uniquely owned again
    optimizer.step_refs(&mut model.parameters_mut());
    model.zero_grad();
    value
}
