//! Gradient checks for convolution and pooling

use super::test_utils::{finite_difference, fixture, weighted_sum};
use crate::autograd::{backward, conv2d, global_avg_pool, Tensor};
use proptest::prelude::*;

fn conv_loss(input: &[f32], kernel: &[f32], bias: &[f32], shapes: &Shapes, w: &[f32]) -> f32 {
    let x = Tensor::from_shape_vec(&shapes.input, input.to_vec(), false);
    let k = Tensor::from_shape_vec(&shapes.kernel, kernel.to_vec(), false);
    let b = Tensor::from_vec(bias.to_vec(), false);
    let y = conv2d(&x, &k, Some(&b));
    weighted_sum(y.data().as_slice().unwrap(), w)
}

struct Shapes {
    input: Vec<usize>,
    kernel: Vec<usize>,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_conv2d_backward_gradient_check(
        batch in 1usize..3,
        size in 3usize..6,
        in_ch in 1usize..3,
        out_ch in 1usize..3,
        seed in 0u32..1000
    ) {
        let shapes = Shapes {
            input: vec![batch, size, size, in_ch],
            kernel: vec![3, 3, in_ch, out_ch],
        };
        let input = fixture(shapes.input.iter().product(), seed);
        let kernel = fixture(shapes.kernel.iter().product(), seed + 1);
        let bias = fixture(out_ch, seed + 2);
        let out_len = batch * (size - 2) * (size - 2) * out_ch;
        let w = fixture(out_len, seed + 3);

        let x = Tensor::from_shape_vec(&shapes.input, input.clone(), true);
        let k = Tensor::from_shape_vec(&shapes.kernel, kernel.clone(), true);
        let b = Tensor::from_vec(bias.clone(), true);
        let mut y = conv2d(&x, &k, Some(&b));
        prop_assert_eq!(y.shape(), &[batch, size - 2, size - 2, out_ch][..]);
        backward(&mut y, Some(ndarray::Array1::from(w.clone())));

        let grad_x = x.grad().expect("input gradient");
        let num_x = finite_difference(|v| conv_loss(v, &kernel, &bias, &shapes, &w), &input, 1e-2);
        for i in 0..input.len() {
            prop_assert!((grad_x[i] - num_x[i]).abs() < 2e-2,
                "input grad {}: analytical={}, numerical={}", i, grad_x[i], num_x[i]);
        }

        let grad_k = k.grad().expect("kernel gradient");
        let num_k = finite_difference(|v| conv_loss(&input, v, &bias, &shapes, &w), &kernel, 1e-2);
        for i in 0..kernel.len() {
            prop_assert!((grad_k[i] - num_k[i]).abs() < 2e-2,
                "kernel grad {}: analytical={}, numerical={}", i, grad_k[i], num_k[i]);
        }

        let grad_b = b.grad().expect("bias gradient");
        let num_b = finite_difference(|v| conv_loss(&input, &kernel, v, &shapes, &w), &bias, 1e-2);
        for i in 0..bias.len() {
            prop_assert!((grad_b[i] - num_b[i]).abs() < 2e-2,
                "bias grad {}: analytical={}, numerical={}", i, grad_b[i], num_b[i]);
        }
    }

    #[test]
    fn prop_global_avg_pool_backward_gradient_check(
        batch in 1usize..3,
        size in 1usize..5,
        channels in 1usize..4,
        seed in 0u32..1000
    ) {
        let shape = [batch, size, size, channels];
        let input = fixture(shape.iter().product(), seed);
        let w = fixture(batch * channels, seed + 7);

        let x = Tensor::from_shape_vec(&shape, input.clone(), true);
        let mut y = global_avg_pool(&x);
        backward(&mut y, Some(ndarray::Array1::from(w.clone())));

        let analytical = x.grad().expect("gradient should be available");
        let numerical = finite_difference(
            |v| {
                let t = Tensor::from_shape_vec(&shape, v.to_vec(), false);
                weighted_sum(global_avg_pool(&t).data().as_slice().unwrap(), &w)
            },
            &input,
            1e-2,
        );
        for i in 0..input.len() {
            prop_assert!((analytical[i] - numerical[i]).abs() < 1e-2);
        }
    }
}
