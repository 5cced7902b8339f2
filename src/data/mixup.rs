//! Mixup: convex blends of sample pairs

use super::{BatchGenerator, ColorJitter, ImageAugmenter, ImageBatch};
use crate::{Error, Result};
use ndarray::{s, Axis, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution};
use tracing::error;

/// Blend the first half of `double` with the second half
///
/// Row `i` of the result is `w_i * first[i] + (1 - w_i) * second[i]`, applied
/// to every pixel and to the label row.
pub fn mix(double: &ImageBatch, weights: &[f32]) -> Result<ImageBatch> {
    let half = weights.len();
    if double.len() != 2 * half {
        return Err(Error::ShapeMismatch { expected: vec![2 * half], actual: vec![double.len()] });
    }

    let mut images = double.images.slice(s![..half, .., .., ..]).to_owned();
    let second_images = double.images.slice(s![half.., .., .., ..]);
    let mut labels = double.labels.slice(s![..half, ..]).to_owned();
    let second_labels = double.labels.slice(s![half.., ..]);

    for (i, &w) in weights.iter().enumerate() {
        Zip::from(images.index_axis_mut(Axis(0), i))
            .and(second_images.index_axis(Axis(0), i))
            .for_each(|a, &b| *a = w * *a + (1.0 - w) * b);
        Zip::from(labels.index_axis_mut(Axis(0), i))
            .and(second_labels.index_axis(Axis(0), i))
            .for_each(|a, &b| *a = w * *a + (1.0 - w) * b);
    }

    Ok(ImageBatch { images, labels })
}

/// Endless generator of mixup batches
///
/// Every call pulls one `2 * batch_size` batch from an inner
/// [`BatchGenerator`] and blends its halves with one `Beta(α, α)` weight per
/// row.
pub struct MixupGenerator {
    base: BatchGenerator,
    beta: Beta<f64>,
    batch_size: usize,
    rng: StdRng,
}

impl MixupGenerator {
    pub fn new(
        data: ImageBatch,
        batch_size: usize,
        alpha: f32,
        augmenter: ImageAugmenter,
        jitter: ColorJitter,
        mut rng: StdRng,
    ) -> Result<Self> {
        let beta = Beta::new(f64::from(alpha), f64::from(alpha)).map_err(|e| {
            Error::InvalidConfig(format!("mixup alpha {alpha} is not a valid Beta parameter: {e}"))
        })?;
        let base_rng = StdRng::seed_from_u64(rng.random());
        let base = BatchGenerator::new(data, 2 * batch_size, augmenter, jitter, base_rng)?;
        Ok(Self { base, beta, batch_size, rng })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Rows waiting in the inner double-batch generator
    pub fn base_queued(&self) -> usize {
        self.base.queued()
    }

    /// Draw `n` mixing weights
    pub fn sample_weights(&mut self, n: usize) -> Vec<f32> {
        (0..n).map(|_| self.beta.sample(&mut self.rng) as f32).collect()
    }

    /// Next blended batch of exactly `batch_size` rows
    pub fn next_batch(&mut self) -> Result<ImageBatch> {
        let double = self.base.next_batch()?;
        let weights = self.sample_weights(self.batch_size);
        mix(&double, &weights)
    }
}

impl Iterator for MixupGenerator {
    type Item = ImageBatch;

    fn next(&mut self) -> Option<ImageBatch> {
        match self.next_batch() {
            Ok(batch) => Some(batch),
            Err(e) => {
                error!(error = %e, "mixup generator stopped");
                None
            }
        }
    }
}
