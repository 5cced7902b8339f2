//! Evaluation of the ensemble on a fixed dataset

use super::{Accuracy, CategoricalCrossEntropy, LossFn};
use crate::autograd::Context;
use crate::data::ImageBatch;
use crate::nn::WigEnsemble;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Metrics of one evaluation pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Cross-entropy plus the L2 penalty
    pub loss: f32,
    /// Mean categorical cross-entropy
    pub crossentropy: f32,
    /// Fraction of rows classified correctly
    pub accuracy: f32,
}

/// Evaluate `model` on `data` in chunks of `batch_size` rows
///
/// Runs in evaluation mode (no dropout) without augmentation. Chunk results
/// are weighted by their row counts, so the result does not depend on
/// `batch_size`.
pub fn evaluate(model: &WigEnsemble, data: &ImageBatch, batch_size: usize) -> Result<Evaluation> {
    if data.is_empty() {
        return Err(Error::Dataset("cannot evaluate on an empty dataset".into()));
    }
    let ctx = Context::evaluation();
    let loss_fn = CategoricalCrossEntropy::default();

    let mut ce_sum = 0.0f64;
    let mut correct = 0usize;
    for chunk in data.chunks(batch_size) {
        let batch = chunk.to_batch();
        let probs = model.forward(&batch.inputs, &ctx);
        let ce = loss_fn.forward(&probs, &batch.targets).data()[0];
        ce_sum += f64::from(ce) * batch.size() as f64;
        correct += Accuracy::correct(&probs, &batch.targets);
    }

    let rows = data.len();
    let crossentropy = (ce_sum / rows as f64) as f32;
    let penalty = model.regularization_loss().data()[0];
    Ok(Evaluation {
        loss: crossentropy + penalty,
        crossentropy,
        accuracy: correct as f32 / rows as f32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nn::{build_model, ModelConfig};
    use approx::assert_abs_diff_eq;
    use ndarray::{Array2, Array4};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config() -> ModelConfig {
        ModelConfig {
            nb_layers: 2,
            dropout: 0.5,
            nb_features: 3,
            weight_decay: 1e-4,
            nb_classes: 3,
            input_shape: [8, 8, 3],
        }
    }

    fn data(n: usize) -> ImageBatch {
        let images = Array4::from_shape_fn((n, 8, 8, 3), |(i, r, c, ch)| {
            ((i * 7 + r * 3 + c + ch) % 13) as f32 / 13.0
        });
        let labels = Array2::from_shape_fn((n, 3), |(i, j)| if i % 3 == j { 1.0 } else { 0.0 });
        ImageBatch::new(images, labels).expect("rows")
    }

    #[test]
    fn test_fresh_model_scores_uniform_crossentropy() {
        let model = build_model(&config(), &mut StdRng::seed_from_u64(0));
        let eval = evaluate(&model, &data(5), 2).expect("evaluate");
        assert_abs_diff_eq!(eval.crossentropy, 3.0f32.ln(), epsilon = 1e-5);
        assert!(eval.loss > eval.crossentropy);
        assert!((0.0..=1.0).contains(&eval.accuracy));
    }

    #[test]
    fn test_result_independent_of_chunk_size() {
        let mut model = build_model(&config(), &mut StdRng::seed_from_u64(1));
        for (i, p) in model.parameters_mut().into_iter().enumerate() {
            p.data_mut().mapv_inplace(|w| w + 0.02 * ((i % 5) as f32 - 2.0));
        }
        let d = data(7);
        let a = evaluate(&model, &d, 7).expect("evaluate");
        let b = evaluate(&model, &d, 3).expect("evaluate");
        assert_abs_diff_eq!(a.crossentropy, b.crossentropy, epsilon = 1e-5);
        assert_abs_diff_eq!(a.accuracy, b.accuracy);
    }

    #[test]
    fn test_empty_dataset_is_error() {
        let model = build_model(&config(), &mut StdRng::seed_from_u64(0));
        let empty = ImageBatch::empty([8, 8, 3], 3);
        assert!(evaluate(&model, &empty, 4).is_err());
    }
}
