//! Batch data structure

use crate::Tensor;

/// A training batch containing inputs and targets
#[derive(Clone)]
pub struct Batch {
    /// Images `[N, H, W, C]`
    pub inputs: Tensor,
    /// Target distributions `[N, classes]`
    pub targets: Tensor,
}

impl Batch {
    /// Create a new batch
    pub fn new(inputs: Tensor, targets: Tensor) -> Self {
        Self { inputs, targets }
    }

    /// Number of samples (leading dimension of the inputs)
    pub fn size(&self) -> usize {
        self.inputs.shape().first().copied().unwrap_or(0)
    }
}
