//! Spatial reduction: global average pooling over NHWC tensors

use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::cell::RefCell;
use std::rc::Rc;

/// Average every channel over its spatial extent: `[N, H, W, C] -> [N, C]`
///
/// # Panics
///
/// Panics if the input is not 4-D.
pub fn global_avg_pool(a: &Tensor) -> Tensor {
    assert_eq!(a.shape().len(), 4, "global_avg_pool expects [N, H, W, C]");
    let (n, h, w, c) = (a.shape()[0], a.shape()[1], a.shape()[2], a.shape()[3]);
    let area = h * w;

    let x = a.data();
    let mut data = Array1::<f32>::zeros(n * c);
    for b in 0..n {
        for p in 0..area {
            let base = (b * area + p) * c;
            for ch in 0..c {
                data[b * c + ch] += x[base + ch];
            }
        }
    }
    data /= area as f32;

    let requires_grad = a.requires_grad();
    let mut result = Tensor::with_shape(data, vec![n, c], requires_grad);

    if requires_grad {
        let backward_op = Rc::new(GlobalAvgPoolBackward {
            a: a.clone(),
            area,
            channels: c,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct GlobalAvgPoolBackward {
    a: Tensor,
    area: usize,
    channels: usize,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for GlobalAvgPoolBackward {
    fn backward(&self) {
        if let Some(grad_output) = self.result_grad.borrow().as_ref() {
            if self.a.requires_grad() {
                // Each pixel receives 1/(H*W) of its channel's gradient
                let share = 1.0 / self.area as f32;
                let c = self.channels;
                let grad_a = Array1::from_shape_fn(self.a.len(), |i| {
                    let b = i / (self.area * c);
                    grad_output[b * c + i % c] * share
                });
                self.a.accumulate_grad(grad_a);
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}
