//! Configuration validation logic

use super::error::ValidationError;
use crate::config::RunConfig;

/// Validate a run configuration for a `nb_classes`-way CIFAR problem
///
/// Checks:
/// - The class count names a CIFAR variant
/// - Counts and sizes are positive
/// - Rates are in range
/// - The images are large enough for `nb_layers` gated blocks
pub fn validate_config(config: &RunConfig, nb_classes: usize) -> Result<(), ValidationError> {
    if nb_classes != 10 && nb_classes != 100 {
        return Err(ValidationError::InvalidClassCount(nb_classes));
    }

    if config.epochs == 0 {
        return Err(ValidationError::InvalidEpochs(config.epochs));
    }
    if config.steps_per_epoch == 0 {
        return Err(ValidationError::InvalidStepsPerEpoch(config.steps_per_epoch));
    }
    if config.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize(config.batch_size));
    }
    if config.eval_batch_size == 0 {
        return Err(ValidationError::InvalidEvalBatchSize(config.eval_batch_size));
    }

    if config.nb_layers == 0 {
        return Err(ValidationError::InvalidLayerCount(config.nb_layers));
    }
    if config.nb_features == 0 {
        return Err(ValidationError::InvalidFeatureCount(config.nb_features));
    }
    let model = config.model_config(nb_classes);
    let side = model.input_shape[0].min(model.input_shape[1]);
    if side < model.min_input_side() {
        return Err(ValidationError::TooManyLayers {
            layers: config.nb_layers,
            min_side: model.min_input_side(),
            side,
        });
    }

    if !(0.0..1.0).contains(&config.dropout) {
        return Err(ValidationError::InvalidDropout(config.dropout));
    }
    if config.weight_decay.is_nan() || config.weight_decay < 0.0 {
        return Err(ValidationError::InvalidWeightDecay(config.weight_decay));
    }
    if config.learning_rate.is_nan() || config.learning_rate <= 0.0 || config.learning_rate > 1.0 {
        return Err(ValidationError::InvalidLearningRate(config.learning_rate));
    }
    if !config.mixup_alpha.is_finite() || config.mixup_alpha <= 0.0 {
        return Err(ValidationError::InvalidMixupAlpha(config.mixup_alpha));
    }

    if let Some(per_class) = config.train_per_class {
        if per_class == 0 {
            return Err(ValidationError::InvalidTrainPerClass(per_class));
        }
    }
    if config.title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }

    Ok(())
}
