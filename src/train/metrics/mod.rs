//! Evaluation metrics

mod classification;

pub use classification::{argmax_rows, Accuracy};

use crate::Tensor;

/// Non-differentiable score of predictions against targets
pub trait Metric {
    /// Score over all rows of `predictions` (`[N, classes]`)
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32;

    /// Column name used in logs and reports
    fn name(&self) -> &'static str;
}
