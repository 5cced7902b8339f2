//! Loss functions for training
//!
//! - [`CategoricalCrossEntropy`] - cross-entropy on predicted class
//!   probabilities against (possibly mixed) target distributions

mod categorical;

pub use categorical::CategoricalCrossEntropy;

use crate::Tensor;

/// Differentiable scalar objective over a batch
pub trait LossFn {
    /// Mean loss as a one-element tensor wired into the predictions' graph
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor;

    /// Column name used in logs and reports
    fn name(&self) -> &'static str;
}
