//! Multi-head gated-convolution ensemble

use super::{ModelConfig, WigBlock};
use crate::autograd::{add, average, scale, softmax_rows, sum_squares, Context};
use crate::Tensor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;

/// Stack of WiG blocks whose per-block heads are averaged into one
/// class distribution
pub struct WigEnsemble {
    /// Configuration
    pub config: ModelConfig,
    /// Blocks, each with its own head
    pub blocks: Vec<WigBlock>,
    /// Dropout mask source
    rng: RefCell<StdRng>,
}

/// Build the ensemble described by `config`
///
/// Block `i` consumes the features of block `i - 1` (the image for `i = 0`)
/// and emits `nb_features` maps plus a `nb_classes` head.
pub fn build_model<R: Rng + ?Sized>(config: &ModelConfig, rng: &mut R) -> WigEnsemble {
    let mut in_channels = config.input_shape[2];
    let blocks = (0..config.nb_layers)
        .map(|_| {
            let block = WigBlock::new(
                in_channels,
                config.nb_features,
                config.nb_classes,
                config.dropout,
                rng,
            );
            in_channels = config.nb_features;
            block
        })
        .collect();

    WigEnsemble {
        config: config.clone(),
        blocks,
        rng: RefCell::new(StdRng::seed_from_u64(rng.random())),
    }
}

impl WigEnsemble {
    /// Pooled logits of every head, `[N, classes]` each
    pub fn forward_heads(&self, x: &Tensor, ctx: &Context) -> Vec<Tensor> {
        let mut rng = self.rng.borrow_mut();
        let mut features = x.clone();
        let mut heads = Vec::with_capacity(self.blocks.len());
        for block in &self.blocks {
            let (next, pooled) = block.forward(&features, ctx, &mut *rng);
            heads.push(pooled);
            features = next;
        }
        heads
    }

    /// Class probabilities `[N, classes]`: softmax of the mean head output
    pub fn forward(&self, x: &Tensor, ctx: &Context) -> Tensor {
        let heads = self.forward_heads(x, ctx);
        softmax_rows(&average(&heads))
    }

    /// `weight_decay * Σ w²` over every value kernel
    pub fn regularization_loss(&self) -> Tensor {
        let mut penalties = self.blocks.iter().flat_map(WigBlock::regularized).map(sum_squares);
        let first = penalties.next().unwrap_or_else(|| Tensor::zeros(1, false));
        let total = penalties.fold(first, |acc, p| add(&acc, &p));
        scale(&total, self.config.weight_decay)
    }

    /// Number of prediction heads, equal to the number of blocks
    pub fn num_heads(&self) -> usize {
        self.blocks.len()
    }

    /// Output shape for a batch of `batch` images
    pub fn output_shape(&self, batch: usize) -> [usize; 2] {
        [batch, self.config.nb_classes]
    }

    /// Reseed the dropout mask source
    pub fn reseed(&self, seed: u64) {
        *self.rng.borrow_mut() = StdRng::seed_from_u64(seed);
    }

    /// Get all parameters as a vector
    pub fn parameters(&self) -> Vec<&Tensor> {
        self.blocks
            .iter()
            .flat_map(|b| {
                let mut params = b.body.parameters();
                params.extend(b.head.parameters());
                params
            })
            .collect()
    }

    /// Get all parameters as mutable references for optimizer
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = Vec::new();
        for block in &mut self.blocks {
            params.extend(block.body.parameters_mut());
            params.extend(block.head.parameters_mut());
        }
        params
    }

    /// Parameters keyed `block{i}.{gate|value}.{kernel|bias}` and
    /// `head{i}.{gate|value}.{kernel|bias}`
    pub fn named_parameters(&self) -> Vec<(String, &Tensor)> {
        let mut params = Vec::new();
        for (i, block) in self.blocks.iter().enumerate() {
            params.extend(block.body.named_parameters(&format!("block{i}")));
            params.extend(block.head.named_parameters(&format!("head{i}")));
        }
        params
    }

    /// Mutable parameters keyed like [`WigEnsemble::named_parameters`]
    pub fn named_parameters_mut(&mut self) -> Vec<(String, &mut Tensor)> {
        let mut params = Vec::new();
        for (i, block) in self.blocks.iter_mut().enumerate() {
            params.extend(block.body.named_parameters_mut(&format!("block{i}")));
            params.extend(block.head.named_parameters_mut(&format!("head{i}")));
        }
        params
    }

    /// Total number of trainable scalars
    pub fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.len()).sum()
    }

    /// Clear every parameter gradient
    pub fn zero_grad(&self) {
        for param in self.parameters() {
            param.zero_grad();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::{backward, mul, sum};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn tiny_config(nb_layers: usize, dropout: f32) -> ModelConfig {
        ModelConfig {
            nb_layers,
            dropout,
            nb_features: 3,
            weight_decay: 1e-3,
            nb_classes: 4,
            input_shape: [2 * nb_layers + 5, 2 * nb_layers + 4, 3],
        }
    }

    fn images(config: &ModelConfig, batch: usize) -> Tensor {
        let [h, w, c] = config.input_shape;
        let len = batch * h * w * c;
        let data = (0..len).map(|i| ((i * 37 % 101) as f32) / 101.0).collect();
        Tensor::from_shape_vec(&[batch, h, w, c], data, false)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_one_head_per_block(nb_layers in 1usize..5) {
            let config = tiny_config(nb_layers, 0.0);
            let model = build_model(&config, &mut StdRng::seed_from_u64(0));
            prop_assert_eq!(model.num_heads(), nb_layers);

            let heads = model.forward_heads(&images(&config, 2), &Context::evaluation());
            prop_assert_eq!(heads.len(), nb_layers);
            for head in &heads {
                prop_assert_eq!(head.shape(), &[2, 4][..]);
            }
        }
    }

    #[test]
    fn test_fresh_model_predicts_uniform() {
        let config = tiny_config(2, 0.5);
        let model = build_model(&config, &mut StdRng::seed_from_u64(1));
        let probs = model.forward(&images(&config, 3), &Context::new());

        assert_eq!(probs.shape(), &model.output_shape(3)[..]);
        for &p in probs.data() {
            assert_abs_diff_eq!(p, 0.25, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rows_sum_to_one_after_perturbation() {
        let config = tiny_config(2, 0.0);
        let mut model = build_model(&config, &mut StdRng::seed_from_u64(2));
        for (i, param) in model.parameters_mut().into_iter().enumerate() {
            param.data_mut().mapv_inplace(|_| 0.05 * (i as f32 + 1.0));
        }

        let probs = model.forward(&images(&config, 2), &Context::evaluation());
        let rows = probs.to_array2().expect("2-D output");
        for row in rows.rows() {
            assert_abs_diff_eq!(row.sum(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_eval_forward_is_deterministic() {
        let config = tiny_config(2, 0.5);
        let mut model = build_model(&config, &mut StdRng::seed_from_u64(3));
        for param in model.parameters_mut() {
            param.data_mut().mapv_inplace(|w| w + 0.1);
        }
        let x = images(&config, 2);
        let a = model.forward(&x, &Context::evaluation());
        let b = model.forward(&x, &Context::evaluation());
        assert_eq!(a.data(), b.data());
    }

    #[test]
    fn test_parameter_layout() {
        let config = tiny_config(3, 0.0);
        let model = build_model(&config, &mut StdRng::seed_from_u64(4));

        // Per block: body gate (k, b), body value (k, b), head gate (k, b), head value (k)
        assert_eq!(model.parameters().len(), 3 * 7);
        let named = model.named_parameters();
        assert_eq!(named[0].0, "block0.gate.kernel");
        assert_eq!(named[6].0, "head0.value.kernel");
        assert_eq!(named[7].1.shape(), &[3, 3, 3, 3]);

        let expected = (27 * 3 + 3) * 2 + (27 * 4 + 4) + 27 * 4;
        let first_block: usize = named[..7].iter().map(|(_, t)| t.len()).sum();
        assert_eq!(first_block, expected);
    }

    #[test]
    fn test_regularization_loss_matches_value_kernels() {
        let config = tiny_config(2, 0.0);
        let model = build_model(&config, &mut StdRng::seed_from_u64(5));
        let expected: f32 = model
            .blocks
            .iter()
            .map(|b| b.body.value.kernel.data().iter().map(|w| w * w).sum::<f32>())
            .sum::<f32>()
            * config.weight_decay;

        let penalty = model.regularization_loss();
        assert_abs_diff_eq!(penalty.data()[0], expected, epsilon = 1e-6);
    }

    #[test]
    fn test_gradients_reach_head_value_kernels() {
        let config = tiny_config(2, 0.0);
        let model = build_model(&config, &mut StdRng::seed_from_u64(6));
        let probs = model.forward(&images(&config, 2), &Context::new());
        let weights = Tensor::from_shape_vec(&[2, 4], vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0], false);
        let mut objective = sum(&mul(&probs, &weights));

        backward(&mut objective, None);

        for block in &model.blocks {
            let grad = block.head.value.kernel.grad().expect("head value gradient");
            assert!(grad.iter().any(|g| g.abs() > 0.0));
        }
        model.zero_grad();
        assert!(model.parameters().iter().all(|p| p.grad().is_none()));
    }
}
