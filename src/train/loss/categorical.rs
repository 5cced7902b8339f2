//! Categorical cross-entropy on probabilities

use super::LossFn;
use crate::autograd::BackwardOp;
use crate::Tensor;
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Categorical cross-entropy for softmax outputs
///
/// `L = -1/N Σ_rows Σ_j t_j ln(clip(p_j, ε, 1 - ε))`
///
/// Predictions are probabilities, not logits. Clipped entries receive no
/// gradient.
///
/// # Example
///
/// ```
/// use wig_ensemble::train::{CategoricalCrossEntropy, LossFn};
/// use wig_ensemble::Tensor;
///
/// let loss_fn = CategoricalCrossEntropy::default();
/// let probs = Tensor::from_shape_vec(&[1, 3], vec![0.7, 0.2, 0.1], true);
/// let targets = Tensor::from_shape_vec(&[1, 3], vec![1.0, 0.0, 0.0], false);
///
/// let loss = loss_fn.forward(&probs, &targets);
/// assert!((loss.data()[0] - 0.7f32.ln().abs()).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CategoricalCrossEntropy {
    epsilon: f32,
}

impl Default for CategoricalCrossEntropy {
    fn default() -> Self {
        Self { epsilon: 1e-7 }
    }
}

impl CategoricalCrossEntropy {
    pub fn new(epsilon: f32) -> Self {
        Self { epsilon }
    }

    fn rows(predictions: &Tensor) -> usize {
        match predictions.shape() {
            [rows, _] => (*rows).max(1),
            _ => 1,
        }
    }
}

impl LossFn for CategoricalCrossEntropy {
    fn forward(&self, predictions: &Tensor, targets: &Tensor) -> Tensor {
        assert_eq!(
            predictions.shape(),
            targets.shape(),
            "Predictions and targets must have same shape"
        );
        let n = Self::rows(predictions) as f32;
        let (lo, hi) = (self.epsilon, 1.0 - self.epsilon);

        let ce: f32 = predictions
            .data()
            .iter()
            .zip(targets.data().iter())
            .map(|(&p, &t)| -t * p.clamp(lo, hi).ln())
            .sum::<f32>()
            / n;

        let requires_grad = predictions.requires_grad();
        let mut loss = Tensor::from_vec(vec![ce], requires_grad);

        if requires_grad {
            // ∂L/∂p = -t / (p N) inside the clip range
            let grad: Array1<f32> = predictions
                .data()
                .iter()
                .zip(targets.data().iter())
                .map(|(&p, &t)| if p > lo && p < hi { -t / (p * n) } else { 0.0 })
                .collect();
            let backward_op = Rc::new(CrossEntropyBackward {
                predictions: predictions.clone(),
                grad,
                result_grad: loss.grad_cell(),
            });
            loss.set_backward_op(backward_op);
        }

        loss
    }

    fn name(&self) -> &'static str {
        "categorical_crossentropy"
    }
}

struct CrossEntropyBackward {
    predictions: Tensor,
    grad: Array1<f32>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for CrossEntropyBackward {
    fn backward(&self) {
        if let Some(upstream) = self.result_grad.borrow().as_ref() {
            self.predictions.accumulate_grad(&self.grad * upstream[0]);
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.predictions.clone()]
    }
}
