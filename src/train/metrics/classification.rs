//! Classification accuracy

use super::Metric;
use crate::Tensor;

/// Index of the largest entry in each `cols`-wide row (first one on ties)
pub fn argmax_rows(values: &[f32], cols: usize) -> Vec<usize> {
    values
        .chunks(cols.max(1))
        .map(|row| {
            row.iter()
                .enumerate()
                .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
                .0
        })
        .collect()
}

/// Fraction of rows where `argmax(prediction) == argmax(target)`
///
/// # Example
///
/// ```
/// use wig_ensemble::train::{Accuracy, Metric};
/// use wig_ensemble::Tensor;
///
/// let pred = Tensor::from_shape_vec(&[2, 2], vec![0.9, 0.1, 0.3, 0.7], false);
/// let target = Tensor::from_shape_vec(&[2, 2], vec![1.0, 0.0, 1.0, 0.0], false);
///
/// assert_eq!(Accuracy.compute(&pred, &target), 0.5);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct Accuracy;

impl Accuracy {
    /// Number of correct rows, for accumulating over chunks
    pub fn correct(predictions: &Tensor, targets: &Tensor) -> usize {
        assert_eq!(
            predictions.shape(),
            targets.shape(),
            "Predictions and targets must have same shape"
        );
        let cols = predictions.shape().last().copied().unwrap_or(1);
        let predicted = argmax_rows(predictions.data().as_slice().unwrap_or(&[]), cols);
        let expected = argmax_rows(targets.data().as_slice().unwrap_or(&[]), cols);
        predicted.iter().zip(&expected).filter(|(p, t)| p == t).count()
    }
}

impl Metric for Accuracy {
    fn compute(&self, predictions: &Tensor, targets: &Tensor) -> f32 {
        let rows = predictions.len() / predictions.shape().last().copied().unwrap_or(1).max(1);
        if rows == 0 {
            return 0.0;
        }
        Self::correct(predictions, targets) as f32 / rows as f32
    }

    fn name(&self) -> &'static str {
        "accuracy"
    }
}
