//! Optimizer trait

use crate::Tensor;

/// Trait for optimization algorithms
pub trait Optimizer {
    /// Perform a single optimization step
    fn step(&mut self, params: &mut [Tensor]);

    /// Perform optimization step on referenced parameters
    ///
    /// This is the entry point used with a model's `parameters_mut()`, so the
    /// update lands in the model's own tensors. Parameters without a gradient
    /// are left untouched.
    fn step_refs(&mut self, params: &mut [&mut Tensor]) {
        let lr = self.lr();
        for param in params.iter_mut() {
            if let Some(grad) = param.grad() {
                param.data_mut().scaled_add(-lr, &grad);
            }
        }
    }

    /// Zero out all gradients
    fn zero_grad(&mut self, params: &mut [Tensor]) {
        for param in params {
            param.zero_grad();
        }
    }

    /// Zero gradients on referenced parameters
    fn zero_grad_refs(&mut self, params: &mut [&mut Tensor]) {
        for param in params.iter_mut() {
            param.zero_grad();
        }
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    /// Plain gradient descent, only `step` is provided
    struct Descent {
        learning_rate: f32,
    }

    impl Optimizer for Descent {
        fn step(&mut self, params: &mut [Tensor]) {
            for param in params {
                if let Some(grad) = param.grad() {
                    param.data_mut().scaled_add(-self.learning_rate, &grad);
                }
            }
        }

        fn lr(&self) -> f32 {
            self.learning_rate
        }

        fn set_lr(&mut self, lr: f32) {
            self.learning_rate = lr;
        }
    }

    #[test]
    fn test_default_step_refs_descends() {
        let mut opt = Descent { learning_rate: 0.1 };
        let mut param1 = Tensor::from_vec(vec![1.0, 2.0], true);
        let mut param2 = Tensor::from_vec(vec![3.0, 4.0], true);
        param1.set_grad(arr1(&[0.5, 1.0]));
        param2.set_grad(arr1(&[1.5, 2.0]));

        opt.step_refs(&mut [&mut param1, &mut param2]);

        assert!((param1.data()[0] - 0.95).abs() < 1e-6);
        assert!((param1.data()[1] - 1.9).abs() < 1e-6);
        assert!((param2.data()[0] - 2.85).abs() < 1e-6);
        assert!((param2.data()[1] - 3.8).abs() < 1e-6);
    }

    #[test]
    fn test_default_step_refs_skips_missing_grad() {
        let mut opt = Descent { learning_rate: 0.1 };
        let mut param = Tensor::from_vec(vec![1.0, 2.0, 3.0], true);

        opt.step_refs(&mut [&mut param]);

        assert_eq!(param.data().to_vec(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_zero_grad_refs_clears() {
        let mut opt = Descent { learning_rate: 0.1 };
        let mut param = Tensor::from_vec(vec![1.0], true);
        param.set_grad(arr1(&[0.5]));

        opt.zero_grad_refs(&mut [&mut param]);

        assert!(param.grad().is_none());
    }

    #[test]
    fn test_zero_grad_clears_all() {
        let mut opt = Descent { learning_rate: 0.1 };
        let mut params =
            vec![Tensor::from_vec(vec![1.0, 2.0], true), Tensor::from_vec(vec![3.0, 4.0], true)];
        for p in &params {
            p.set_grad(arr1(&[0.5, 1.0]));
        }

        opt.zero_grad(&mut params);

        assert!(params.iter().all(|p| p.grad().is_none()));
    }

    #[test]
    fn test_set_lr() {
        let mut opt = Descent { learning_rate: 0.1 };
        opt.set_lr(0.01);
        assert_eq!(opt.lr(), 0.01);
    }
}
