//! YAML schema for a training run
//!
//! Every field is optional in the file; missing fields take the defaults
//! below.
//!
//! ```yaml
//! epochs: 50
//! batch_size: 500
//! mixup_alpha: 0.4
//! data_dir: /datasets
//! ```

use crate::nn::ModelConfig;
use crate::train::RunSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub epochs: usize,
    pub steps_per_epoch: usize,
    pub batch_size: usize,

    /// Gated blocks, one prediction head each
    pub nb_layers: usize,
    /// Channels of every gated convolution
    pub nb_features: usize,
    /// Dropout rate on head logits
    pub dropout: f32,
    /// L2 factor on value kernels
    pub weight_decay: f32,

    pub learning_rate: f32,
    /// Beta(α, α) parameter of the mixup weights
    pub mixup_alpha: f32,
    pub eval_batch_size: usize,

    /// Training samples kept per class (default: 1000 in total)
    pub train_per_class: Option<usize>,
    /// RNG seed; OS entropy when absent
    pub seed: Option<u64>,

    /// Directory holding `cifar-10-batches-bin/` or `cifar-100-binary/`
    pub data_dir: PathBuf,
    /// Where the checkpoint and CSV log are written
    pub output_dir: PathBuf,
    /// Filename stem of the checkpoint and log
    pub title: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            steps_per_epoch: 100,
            batch_size: 1000,
            nb_layers: 5,
            nb_features: 64,
            dropout: 0.5,
            weight_decay: 1e-6,
            learning_rate: 0.001,
            mixup_alpha: 0.2,
            eval_batch_size: 250,
            train_per_class: None,
            seed: None,
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("."),
            title: "wig_ensemble_cifar".to_string(),
        }
    }
}

impl RunConfig {
    /// Architecture for `nb_classes` outputs on 32x32 RGB images
    pub fn model_config(&self, nb_classes: usize) -> ModelConfig {
        ModelConfig {
            nb_layers: self.nb_layers,
            dropout: self.dropout,
            nb_features: self.nb_features,
            weight_decay: self.weight_decay,
            ..ModelConfig::cifar(nb_classes)
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            epochs: self.epochs,
            steps_per_epoch: self.steps_per_epoch,
            batch_size: self.batch_size,
            eval_batch_size: self.eval_batch_size,
            learning_rate: self.learning_rate,
            mixup_alpha: self.mixup_alpha,
        }
    }
}
