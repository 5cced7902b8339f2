//! Validation error types

/// Validation error type
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid class count: {0} (must be 10 or 100)")]
    InvalidClassCount(usize),

    #[error("Invalid epochs: {0} (must be > 0)")]
    InvalidEpochs(usize),

    #[error("Invalid steps per epoch: {0} (must be > 0)")]
    InvalidStepsPerEpoch(usize),

    #[error("Invalid batch size: {0} (must be > 0)")]
    InvalidBatchSize(usize),

    #[error("Invalid evaluation batch size: {0} (must be > 0)")]
    InvalidEvalBatchSize(usize),

    #[error("Invalid layer count: {0} (must be > 0)")]
    InvalidLayerCount(usize),

    #[error("Invalid feature count: {0} (must be > 0)")]
    InvalidFeatureCount(usize),

    #[error("Too many layers: {layers} gated blocks need images of at least {min_side}x{min_side}, got {side}x{side}")]
    TooManyLayers { layers: usize, min_side: usize, side: usize },

    #[error("Invalid dropout: {0} (must be in [0.0, 1.0))")]
    InvalidDropout(f32),

    #[error("Invalid weight decay: {0} (must be >= 0.0)")]
    InvalidWeightDecay(f32),

    #[error("Invalid learning rate: {0} (must be > 0.0 and <= 1.0)")]
    InvalidLearningRate(f32),

    #[error("Invalid mixup alpha: {0} (must be > 0.0)")]
    InvalidMixupAlpha(f32),

    #[error("Invalid samples per class: {0} (must be > 0)")]
    InvalidTrainPerClass(usize),

    #[error("Title cannot be empty")]
    EmptyTitle,
}
