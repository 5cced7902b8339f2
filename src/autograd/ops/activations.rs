//! Activation function autograd operations: sigmoid, row-wise softmax

use crate::autograd::{BackwardOp, Tensor};
use ndarray::{Array1, ArrayView2, Axis};
use std::cell::RefCell;
use std::rc::Rc;

/// Logistic sigmoid `1 / (1 + e^-x)`
pub fn sigmoid(a: &Tensor) -> Tensor {
    let data = a.data().mapv(|x| 1.0 / (1.0 + (-x).exp()));
    let requires_grad = a.requires_grad();

    let mut result = Tensor::with_shape(data, a.shape().to_vec(), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(SigmoidBackward {
            a: a.clone(),
            output: result.detach(),
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct SigmoidBackward {
    a: Tensor,
    output: Tensor,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for SigmoidBackward {
    fn backward(&self) {
        if let Some(grad_output) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // ∂σ/∂x = σ(x) * (1 - σ(x))
                let y = self.output.data();
                let grad_a = grad_output * &y.mapv(|s| s * (1.0 - s));
                self.a.accumulate_grad(grad_a);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Softmax over the last axis of a `[rows, classes]` tensor
///
/// # Panics
///
/// Panics if the tensor is not 2-D.
pub fn softmax_rows(a: &Tensor) -> Tensor {
    assert_eq!(a.shape().len(), 2, "softmax_rows expects [rows, classes]");
    let (rows, cols) = (a.shape()[0], a.shape()[1]);
    let logits = ArrayView2::from_shape((rows, cols), a.data().as_slice().expect("contiguous"))
        .expect("shape checked above");

    let mut data = Vec::with_capacity(rows * cols);
    for row in logits.axis_iter(Axis(0)) {
        let max_val = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exp_vals = row.mapv(|x| (x - max_val).exp());
        let sum_exp = exp_vals.sum();
        data.extend(exp_vals.iter().map(|e| e / sum_exp));
    }

    let requires_grad = a.requires_grad();
    let mut result = Tensor::with_shape(Array1::from(data), vec![rows, cols], requires_grad);

    if requires_grad {
        let backward_op = Rc::new(SoftmaxRowsBackward {
            a: a.clone(),
            output: result.detach(),
            cols,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct SoftmaxRowsBackward {
    a: Tensor,
    output: Tensor,
    cols: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for SoftmaxRowsBackward {
    fn backward(&self) {
        if let Some(grad_output) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // ∂L/∂x = y ⊙ (∂L/∂y - (y · ∂L/∂y)), per row
                let y = self.output.data();
                let mut grad_a = Array1::zeros(y.len());
                for start in (0..y.len()).step_by(self.cols) {
                    let end = start + self.cols;
                    let y_row = y.slice(ndarray::s![start..end]);
                    let g_row = grad_output.slice(ndarray::s![start..end]);
                    let dot = (&y_row * &g_row).sum();
                    let row_grad = &y_row * &g_row.mapv(|g| g - dot);
                    grad_a.slice_mut(ndarray::s![start..end]).assign(&row_grad);
                }
                self.a.accumulate_grad(grad_a);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}
