//! Per-image brightness/contrast jitter

use super::ImageBatch;
use ndarray::{ArrayViewMut3, Axis};
use rand::Rng;

/// Factors applied to one image
///
/// Pixels become `((x * s0) * s1) * a + b - (a - 1) / 2`: two plain
/// multiplicative jitters followed by a contrast change about mid-grey plus a
/// small brightness offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorParams {
    pub scales: [f32; 2],
    pub a: f32,
    pub b: f32,
}

impl ColorParams {
    pub fn identity() -> Self {
        Self { scales: [1.0, 1.0], a: 1.0, b: 0.0 }
    }

    /// Transform one pixel value
    pub fn apply_value(&self, x: f32) -> f32 {
        let x = x * self.scales[0] * self.scales[1];
        x * self.a + self.b - (self.a - 1.0) / 2.0
    }

    pub fn apply(&self, mut image: ArrayViewMut3<f32>) {
        image.mapv_inplace(|x| self.apply_value(x));
    }
}

/// Random color jitter, one draw per image
#[derive(Debug, Clone, PartialEq)]
pub struct ColorJitter {
    /// Range of every multiplicative factor
    pub scale_range: (f32, f32),
    /// Range of the brightness offset
    pub bias_range: (f32, f32),
}

impl Default for ColorJitter {
    fn default() -> Self {
        Self { scale_range: (0.95, 1.05), bias_range: (-0.005, 0.005) }
    }
}

impl ColorJitter {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ColorParams {
        let (lo, hi) = self.scale_range;
        let s0 = rng.random_range(lo..hi);
        let s1 = rng.random_range(lo..hi);
        let a = rng.random_range(lo..hi);
        let (blo, bhi) = self.bias_range;
        let b = rng.random_range(blo..bhi);
        ColorParams { scales: [s0, s1], a, b }
    }

    /// Jitter every image of `batch` in place
    pub fn apply<R: Rng + ?Sized>(&self, batch: &mut ImageBatch, rng: &mut R) {
        for image in batch.images.axis_iter_mut(Axis(0)) {
            self.sample(rng).apply(image);
        }
    }
}
