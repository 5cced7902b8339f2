//! Adam optimizer with inverse-time learning-rate decay

use super::Optimizer;
use crate::Tensor;
use ndarray::Array1;

/// Adam optimizer
///
/// Per step `t` (1-based):
///
/// ```text
/// lr_d = lr / (1 + decay * (t - 1))
/// lr_t = lr_d * √(1 - β2^t) / (1 - β1^t)
/// m_t  = β1 * m_{t-1} + (1 - β1) * g
/// v_t  = β2 * v_{t-1} + (1 - β2) * g²
/// θ_t  = θ_{t-1} - lr_t * m_t / (√v_t + ε)
/// ```
///
/// With `decay = 0` this is plain Adam.
pub struct Adam {
    lr: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    decay: f32,
    t: u64,
    m: Vec<Option<Array1<f32>>>, // First moment
    v: Vec<Option<Array1<f32>>>, // Second moment
}

impl Adam {
    /// Create a new Adam optimizer
    pub fn new(lr: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self { lr, beta1, beta2, epsilon, decay: 0.0, t: 0, m: Vec::new(), v: Vec::new() }
    }

    /// Create Adam with default parameters (β1 = 0.9, β2 = 0.999, ε = 1e-7)
    pub fn default_params(lr: f32) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-7)
    }

    /// Enable inverse-time decay of the learning rate
    #[must_use]
    pub fn with_decay(mut self, decay: f32) -> Self {
        self.decay = decay;
        self
    }

    /// Decay that brings the learning rate to half its initial value after
    /// `total_steps` updates
    pub fn decay_for(total_steps: usize) -> f32 {
        if total_steps == 0 {
            0.0
        } else {
            1.0 / total_steps as f32
        }
    }

    /// Get optimizer step counter
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.t
    }

    /// Learning rate the next step will use, before bias correction
    pub fn decayed_lr(&self) -> f32 {
        self.lr / (1.0 + self.decay * self.t as f32)
    }

    /// Grow moment slots so index `len - 1` is valid
    fn ensure_moments(&mut self, len: usize) {
        if self.m.len() < len {
            self.m.resize(len, None);
            self.v.resize(len, None);
        }
    }

    /// Advance the step counter and return the bias-corrected step size
    fn begin_step(&mut self) -> f32 {
        let lr = self.decayed_lr();
        self.t += 1;
        let t = self.t as i32;
        lr * (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t))
    }

    fn update(&mut self, i: usize, param: &mut Tensor, lr_t: f32) {
        let Some(grad) = param.grad() else {
            return;
        };

        let m_t = match &self.m[i] {
            Some(m) => m * self.beta1 + &grad * (1.0 - self.beta1),
            None => &grad * (1.0 - self.beta1),
        };
        let grad_sq = &grad * &grad;
        let v_t = match &self.v[i] {
            Some(v) => v * self.beta2 + &grad_sq * (1.0 - self.beta2),
            None => &grad_sq * (1.0 - self.beta2),
        };

        let update = &m_t / &(v_t.mapv(f32::sqrt) + self.epsilon) * lr_t;
        *param.data_mut() -= &update;

        self.m[i] = Some(m_t);
        self.v[i] = Some(v_t);
    }
}

impl Optimizer for Adam {
    fn step(&mut self, params: &mut [Tensor]) {
        self.ensure_moments(params.len());
        let lr_t = self.begin_step();
        for (i, param) in params.iter_mut().enumerate() {
            self.update(i, param, lr_t);
        }
    }

    fn step_refs(&mut self, params: &mut [&mut Tensor]) {
        self.ensure_moments(params.len());
        let lr_t = self.begin_step();
        for (i, param) in params.iter_mut().enumerate() {
            self.update(i, param, lr_t);
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    #[test]
    fn test_adam_quadratic_convergence() {
        // f(x) = x², ∇f = 2x
        let mut params = vec![Tensor::from_vec(vec![5.0, -3.0, 2.0], true)];
        let mut optimizer = Adam::default_params(0.1);

        for _ in 0..300 {
            let grad = params[0].data().mapv(|x| 2.0 * x);
            params[0].set_grad(grad);
            optimizer.step(&mut params);
        }

        for &val in params[0].data() {
            assert!(val.abs() < 0.5, "Value {val} did not converge");
        }
    }

    #[test]
    fn test_adam_first_step_moves_by_lr() {
        // After bias correction the first step is lr * g / (|g| + ε) ≈ lr * sign(g)
        let mut param = Tensor::from_vec(vec![1.0, 1.0], true);
        param.set_grad(arr1(&[0.3, -4.0]));
        let mut optimizer = Adam::default_params(0.01);

        optimizer.step_refs(&mut [&mut param]);

        assert_abs_diff_eq!(param.data()[0], 0.99, epsilon = 1e-5);
        assert_abs_diff_eq!(param.data()[1], 1.01, epsilon = 1e-5);
        assert_eq!(optimizer.step_count(), 1);
    }

    #[test]
    fn test_adam_decay_schedule() {
        let mut optimizer = Adam::default_params(0.001).with_decay(Adam::decay_for(10));
        assert_abs_diff_eq!(optimizer.decayed_lr(), 0.001);

        let mut param = Tensor::from_vec(vec![0.0], true);
        for _ in 0..10 {
            param.set_grad(arr1(&[1.0]));
            optimizer.step_refs(&mut [&mut param]);
        }

        // lr / (1 + 0.1 * 10)
        assert_abs_diff_eq!(optimizer.decayed_lr(), 0.0005, epsilon = 1e-9);
    }

    #[test]
    fn test_adam_decay_for_zero_steps() {
        assert_eq!(Adam::decay_for(0), 0.0);
    }

    #[test]
    fn test_adam_skips_params_without_grad() {
        let mut a = Tensor::from_vec(vec![1.0], true);
        let mut b = Tensor::from_vec(vec![2.0], true);
        b.set_grad(arr1(&[1.0]));
        let mut optimizer = Adam::default_params(0.1);

        optimizer.step_refs(&mut [&mut a, &mut b]);

        assert_eq!(a.data()[0], 1.0);
        assert!(b.data()[0] < 2.0);
    }

    #[test]
    fn test_adam_step_and_step_refs_agree() {
        let grads = [arr1(&[0.5, -1.0]), arr1(&[0.25, 2.0]), arr1(&[-1.0, 0.1])];

        let mut owned = vec![Tensor::from_vec(vec![1.0, 2.0], true)];
        let mut opt_owned = Adam::default_params(0.05).with_decay(0.01);
        let mut borrowed = Tensor::from_vec(vec![1.0, 2.0], true);
        let mut opt_borrowed = Adam::default_params(0.05).with_decay(0.01);

        for g in &grads {
            owned[0].set_grad(g.clone());
            opt_owned.step(&mut owned);
            borrowed.set_grad(g.clone());
            opt_borrowed.step_refs(&mut [&mut borrowed]);
        }

        for (x, y) in owned[0].data().iter().zip(borrowed.data()) {
            assert_abs_diff_eq!(*x, *y);
        }
    }
}
