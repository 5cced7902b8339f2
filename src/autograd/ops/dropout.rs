//! Inverted dropout

use crate::autograd::{BackwardOp, Context, Tensor};
use ndarray::Array1;
use rand::Rng;
use std::cell::RefCell;
use std::rc::Rc;

/// Zero each element with probability `rate` and scale survivors by `1 / (1 - rate)`
///
/// Outside training mode, or with `rate == 0`, the input is returned unchanged.
///
/// # Panics
///
/// Panics if `rate` is outside `[0, 1)`.
pub fn dropout<R: Rng + ?Sized>(a: &Tensor, rate: f32, ctx: &Context, rng: &mut R) -> Tensor {
    assert!((0.0..1.0).contains(&rate), "dropout rate must be in [0, 1), got {rate}");
    if !ctx.is_training() || rate == 0.0 {
        return a.clone();
    }

    let keep = 1.0 / (1.0 - rate);
    let mask: Array1<f32> =
        (0..a.len()).map(|_| if rng.random::<f32>() < rate { 0.0 } else { keep }).collect();
    let data = a.data() * &mask;

    let requires_grad = a.requires_grad();
    let mut result = Tensor::with_shape(data, a.shape().to_vec(), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(DropoutBackward {
            a: a.clone(),
            mask,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct DropoutBackward {
    a: Tensor,
    mask: Array1<f32>,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for DropoutBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                self.a.accumulate_grad(grad * &self.mask);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}
