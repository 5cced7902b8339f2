//! Kernel initializers

use rand::Rng;
use rand_distr::StandardNormal;

/// Weight initialization scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Initializer {
    /// All zeros
    Zeros,
    /// He normal: `N(0, 2 / fan_in)` truncated at two standard deviations
    HeNormal,
}

impl Initializer {
    /// Draw `len` values for a tensor whose receptive field has `fan_in` inputs
    pub fn sample<R: Rng + ?Sized>(self, len: usize, fan_in: usize, rng: &mut R) -> Vec<f32> {
        match self {
            Self::Zeros => vec![0.0; len],
            Self::HeNormal => {
                let std = (2.0 / fan_in.max(1) as f32).sqrt();
                (0..len).map(|_| truncated_standard_normal(rng) * std).collect()
            }
        }
    }
}

/// Standard normal resampled until it falls within `[-2, 2]`
fn truncated_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    loop {
        let z: f32 = rng.sample(StandardNormal);
        if z.abs() <= 2.0 {
            return z;
        }
    }
}
