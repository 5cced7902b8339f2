//! Property-based tests for row-wise softmax

use super::test_utils::{finite_difference, weighted_sum};
use crate::autograd::{backward, softmax_rows, Tensor};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_softmax_rows_backward_gradient_check(
        rows in 1usize..4,
        cols in 2usize..6,
        seed in prop::collection::vec((-5.0f32..5.0, -1.0f32..1.0), 24)
    ) {
        let len = rows * cols;
        let (x, w): (Vec<f32>, Vec<f32>) = seed.into_iter().take(len).unzip();

        let a = Tensor::from_shape_vec(&[rows, cols], x.clone(), true);
        let mut y = softmax_rows(&a);
        backward(&mut y, Some(ndarray::Array1::from(w.clone())));

        let analytical = a.grad().expect("gradient should be available");
        let numerical = finite_difference(
            |x_val| {
                let t = Tensor::from_shape_vec(&[rows, cols], x_val.to_vec(), false);
                weighted_sum(softmax_rows(&t).data().as_slice().unwrap(), &w)
            },
            &x,
            1e-3,
        );

        for i in 0..len {
            let diff = (analytical[i] - numerical[i]).abs();
            prop_assert!(diff < 0.01, "Gradient mismatch at index {}: analytical={}, numerical={}",
                        i, analytical[i], numerical[i]);
        }
    }

    #[test]
    fn prop_softmax_rows_each_sum_to_one(
        rows in 1usize..8,
        x in prop::collection::vec(-20.0f32..20.0, 80)
    ) {
        let cols = 10;
        let a = Tensor::from_shape_vec(&[rows, cols], x[..rows * cols].to_vec(), false);
        let y = softmax_rows(&a);

        for r in 0..rows {
            let sum: f32 = y.data().iter().skip(r * cols).take(cols).sum();
            prop_assert!((sum - 1.0).abs() < 1e-5);
        }
    }
}
