//! Weighted-sigmoid-gate units and blocks
//!
//! A WiG unit multiplies a linear "value" convolution by a sigmoid "gate"
//! convolution of the same input: `y = sigmoid(Wg * x + bg) ⊙ (Wv * x + bv)`.

use super::{Conv2d, Initializer};
use crate::autograd::{dropout, global_avg_pool, mul, sigmoid, Context};
use crate::Tensor;
use rand::Rng;

const KERNEL_SIZE: usize = 3;

/// Gated convolution unit
pub struct WigGate {
    /// Gate path, passed through a sigmoid
    pub gate: Conv2d,
    /// Value path, L2-regularized
    pub value: Conv2d,
}

impl WigGate {
    /// Create a unit; the gate kernel is always zero-initialized with a bias,
    /// so every gate starts half open
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        out_channels: usize,
        value_init: Initializer,
        value_bias: bool,
        rng: &mut R,
    ) -> Self {
        let value = Conv2d::new(KERNEL_SIZE, in_channels, out_channels, value_init, value_bias, rng);
        let gate = Conv2d::new(KERNEL_SIZE, in_channels, out_channels, Initializer::Zeros, true, rng);
        Self { gate, value }
    }

    /// `sigmoid(gate(x)) * value(x)`
    pub fn forward(&self, x: &Tensor) -> Tensor {
        let m = sigmoid(&self.gate.forward(x));
        let y = self.value.forward(x);
        mul(&m, &y)
    }

    pub fn parameters(&self) -> Vec<&Tensor> {
        let mut params = self.gate.parameters();
        params.extend(self.value.parameters());
        params
    }

    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = self.gate.parameters_mut();
        params.extend(self.value.parameters_mut());
        params
    }

    pub fn named_parameters(&self, prefix: &str) -> Vec<(String, &Tensor)> {
        let mut params = self.gate.named_parameters(&format!("{prefix}.gate"));
        params.extend(self.value.named_parameters(&format!("{prefix}.value")));
        params
    }

    pub fn named_parameters_mut(&mut self, prefix: &str) -> Vec<(String, &mut Tensor)> {
        let mut params = self.gate.named_parameters_mut(&format!("{prefix}.gate"));
        params.extend(self.value.named_parameters_mut(&format!("{prefix}.value")));
        params
    }
}

/// One stage of the ensemble: a feature unit feeding the next stage and a
/// class head pooled to one logit vector
pub struct WigBlock {
    /// Feature unit, He-normal value kernel with bias
    pub body: WigGate,
    /// Class head, zero value kernel without bias
    pub head: WigGate,
    dropout: f32,
}

impl WigBlock {
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        nb_features: usize,
        nb_classes: usize,
        dropout: f32,
        rng: &mut R,
    ) -> Self {
        Self {
            body: WigGate::new(in_channels, nb_features, Initializer::HeNormal, true, rng),
            head: WigGate::new(nb_features, nb_classes, Initializer::Zeros, false, rng),
            dropout,
        }
    }

    /// Returns `(features, pooled_logits)`: features `[N, H-2, W-2, F]` feed the
    /// next block, pooled logits are `[N, classes]`
    pub fn forward<R: Rng + ?Sized>(
        &self,
        x: &Tensor,
        ctx: &Context,
        rng: &mut R,
    ) -> (Tensor, Tensor) {
        let features = self.body.forward(x);
        let mut logits = self.head.forward(&features);
        if self.dropout > 0.0 {
            logits = dropout(&logits, self.dropout, ctx, rng);
        }
        let pooled = global_avg_pool(&logits);
        (features, pooled)
    }

    /// Kernels carrying the L2 penalty
    pub fn regularized(&self) -> [&Tensor; 2] {
        [&self.body.value.kernel, &self.head.value.kernel]
    }

    pub fn dropout_rate(&self) -> f32 {
        self.dropout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_gate_halves_value() {
        let mut rng = StdRng::seed_from_u64(0);
        let unit = WigGate::new(1, 1, Initializer::HeNormal, true, &mut rng);
        let x = Tensor::from_shape_vec(&[1, 3, 3, 1], (0..9).map(|v| v as f32).collect(), false);

        let value = unit.value.forward(&x).data()[0];
        let gated = unit.forward(&x).data()[0];
        assert!((gated - 0.5 * value).abs() < 1e-6);
    }

    #[test]
    fn test_unit_parameter_names() {
        let mut rng = StdRng::seed_from_u64(0);
        let unit = WigGate::new(2, 3, Initializer::Zeros, false, &mut rng);
        let names: Vec<String> = unit.named_parameters("h").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["h.gate.kernel", "h.gate.bias", "h.value.kernel"]);
        assert_eq!(unit.parameters().len(), 3);
    }

    #[test]
    fn test_block_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let block = WigBlock::new(3, 4, 10, 0.5, &mut rng);
        let x = Tensor::zeros_shaped(&[2, 9, 9, 3], false);

        let (features, pooled) = block.forward(&x, &Context::evaluation(), &mut rng);
        assert_eq!(features.shape(), &[2, 7, 7, 4]);
        assert_eq!(pooled.shape(), &[2, 10]);
    }

    #[test]
    fn test_fresh_head_emits_zero_logits() {
        let mut rng = StdRng::seed_from_u64(5);
        let block = WigBlock::new(3, 4, 2, 0.0, &mut rng);
        let x = Tensor::from_shape_vec(&[1, 6, 6, 3], vec![0.3; 108], false);

        let (_, pooled) = block.forward(&x, &Context::new(), &mut rng);
        assert!(pooled.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_zero_dropout_training_forward_ignores_rng() {
        let mut init_rng = StdRng::seed_from_u64(3);
        let mut block = WigBlock::new(3, 4, 2, 0.0, &mut init_rng);
        block
            .head
            .value
            .kernel
            .data_mut()
            .iter_mut()
            .enumerate()
            .for_each(|(i, w)| *w = ((i % 7) as f32 - 3.0) * 0.05);
        let x = Tensor::from_shape_vec(
            &[2, 6, 6, 3],
            (0..216).map(|v| (v % 13) as f32 / 13.0).collect(),
            false,
        );

        let ctx = Context::new();
        let (_, first) = block.forward(&x, &ctx, &mut StdRng::seed_from_u64(10));
        let (_, second) = block.forward(&x, &ctx, &mut StdRng::seed_from_u64(20));
        assert!(first.data().iter().any(|&v| v != 0.0));
        assert_eq!(first.data(), second.data());
    }
}
