//! Random affine image augmentation
//!
//! One transform per image: rotation, shift, shear and zoom composed into a
//! single 3x3 matrix about the image centre, sampled bilinearly with
//! nearest-edge fill, then an optional horizontal flip.

use ndarray::{Array3, ArrayView3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Ranges for the random transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AugmentConfig {
    /// Horizontal shift as a fraction of the width, `±`
    pub width_shift: f32,
    /// Vertical shift as a fraction of the height, `±`
    pub height_shift: f32,
    /// Mirror left-right with probability 0.5
    pub horizontal_flip: bool,
    /// Rotation range in degrees, `±`
    pub rotation_degrees: f32,
    /// Independent x/y zoom factors are drawn from `[lo, hi]`
    pub zoom_range: (f32, f32),
    /// Shear angle range in radians, `±`
    pub shear: f32,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            width_shift: 0.25,
            height_shift: 0.25,
            horizontal_flip: true,
            rotation_degrees: 5.0,
            zoom_range: (0.99, 1.05),
            shear: 3.14 / 180.0,
        }
    }
}

impl AugmentConfig {
    /// No-op transform
    pub fn none() -> Self {
        Self {
            width_shift: 0.0,
            height_shift: 0.0,
            horizontal_flip: false,
            rotation_degrees: 0.0,
            zoom_range: (1.0, 1.0),
            shear: 0.0,
        }
    }
}

/// One concrete transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineParams {
    /// Rotation in radians
    pub theta: f32,
    /// Row (vertical) shift in pixels
    pub tx: f32,
    /// Column (horizontal) shift in pixels
    pub ty: f32,
    /// Shear in radians
    pub shear: f32,
    /// Row zoom
    pub zx: f32,
    /// Column zoom
    pub zy: f32,
    pub flip: bool,
}

impl AffineParams {
    pub fn identity() -> Self {
        Self { theta: 0.0, tx: 0.0, ty: 0.0, shear: 0.0, zx: 1.0, zy: 1.0, flip: false }
    }

    /// Matrix mapping output `(row, col, 1)` to input coordinates, centred on
    /// an image of `height x width`
    fn matrix(&self, height: usize, width: usize) -> [[f32; 3]; 3] {
        let (sin_t, cos_t) = self.theta.sin_cos();
        let rotation = [[cos_t, -sin_t, 0.0], [sin_t, cos_t, 0.0], [0.0, 0.0, 1.0]];
        let shift = [[1.0, 0.0, self.tx], [0.0, 1.0, self.ty], [0.0, 0.0, 1.0]];
        let shear = [[1.0, -self.shear.sin(), 0.0], [0.0, self.shear.cos(), 0.0], [0.0, 0.0, 1.0]];
        let zoom = [[self.zx, 0.0, 0.0], [0.0, self.zy, 0.0], [0.0, 0.0, 1.0]];

        let m = matmul3(&matmul3(&matmul3(&rotation, &shift), &shear), &zoom);

        let ox = height as f32 / 2.0 - 0.5;
        let oy = width as f32 / 2.0 - 0.5;
        let offset = [[1.0, 0.0, ox], [0.0, 1.0, oy], [0.0, 0.0, 1.0]];
        let reset = [[1.0, 0.0, -ox], [0.0, 1.0, -oy], [0.0, 0.0, 1.0]];
        matmul3(&matmul3(&offset, &m), &reset)
    }
}

fn matmul3(a: &[[f32; 3]; 3], b: &[[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, cell) in row.iter_mut().enumerate() {
            *cell = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

/// Random affine augmenter
#[derive(Debug, Clone, Default)]
pub struct ImageAugmenter {
    config: AugmentConfig,
}

impl ImageAugmenter {
    pub fn new(config: AugmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AugmentConfig {
        &self.config
    }

    /// Draw transform parameters for a `height x width` image
    pub fn random_params<R: Rng + ?Sized>(&self, height: usize, width: usize, rng: &mut R) -> AffineParams {
        let c = &self.config;
        let theta = symmetric(rng, c.rotation_degrees).to_radians();
        let tx = symmetric(rng, c.height_shift) * height as f32;
        let ty = symmetric(rng, c.width_shift) * width as f32;
        let shear = symmetric(rng, c.shear);
        let (lo, hi) = c.zoom_range;
        let (zx, zy) = if lo == hi {
            (lo, hi)
        } else {
            (rng.random_range(lo..hi), rng.random_range(lo..hi))
        };
        let flip = c.horizontal_flip && rng.random::<f32>() < 0.5;
        AffineParams { theta, tx, ty, shear, zx, zy, flip }
    }

    /// Apply a fresh random transform to one `[H, W, C]` image
    pub fn random_transform<R: Rng + ?Sized>(&self, image: ArrayView3<f32>, rng: &mut R) -> Array3<f32> {
        let (h, w, _) = image.dim();
        let params = self.random_params(h, w, rng);
        apply_transform(image, &params)
    }
}

/// `U[-range, range]`, or 0 for an empty range
fn symmetric<R: Rng + ?Sized>(rng: &mut R, range: f32) -> f32 {
    if range > 0.0 {
        rng.random_range(-range..range)
    } else {
        0.0
    }
}

/// Resample `image` under `params`
pub fn apply_transform(image: ArrayView3<f32>, params: &AffineParams) -> Array3<f32> {
    let (h, w, channels) = image.dim();
    let m = params.matrix(h, w);
    let max_r = (h - 1) as f32;
    let max_c = (w - 1) as f32;

    let mut out = Array3::<f32>::zeros((h, w, channels));
    for r in 0..h {
        for c in 0..w {
            let (rf, cf) = (r as f32, c as f32);
            // nearest fill: clamp the source coordinate onto the edge
            let sr = (m[0][0] * rf + m[0][1] * cf + m[0][2]).clamp(0.0, max_r);
            let sc = (m[1][0] * rf + m[1][1] * cf + m[1][2]).clamp(0.0, max_c);

            let (r0, c0) = (sr.floor() as usize, sc.floor() as usize);
            let (r1, c1) = ((r0 + 1).min(h - 1), (c0 + 1).min(w - 1));
            let (fr, fc) = (sr - r0 as f32, sc - c0 as f32);

            let dst_c = if params.flip { w - 1 - c } else { c };
            for ch in 0..channels {
                let top = image[[r0, c0, ch]] * (1.0 - fc) + image[[r0, c1, ch]] * fc;
                let bottom = image[[r1, c0, ch]] * (1.0 - fc) + image[[r1, c1, ch]] * fc;
                out[[r, dst_c, ch]] = top * (1.0 - fr) + bottom * fr;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gradient_image(h: usize, w: usize) -> Array3<f32> {
        Array3::from_shape_fn((h, w, 2), |(r, c, ch)| (r * w + c) as f32 + 100.0 * ch as f32)
    }

    #[test]
    fn test_identity_transform() {
        let image = gradient_image(5, 4);
        let out = apply_transform(image.view(), &AffineParams::identity());
        for (a, b) in out.iter().zip(image.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_flip_mirrors_columns() {
        let image = gradient_image(3, 4);
        let params = AffineParams { flip: true, ..AffineParams::identity() };
        let out = apply_transform(image.view(), &params);
        assert_abs_diff_eq!(out[[1, 0, 0]], image[[1, 3, 0]], epsilon = 1e-4);
        assert_abs_diff_eq!(out[[2, 3, 1]], image[[2, 0, 1]], epsilon = 1e-4);
    }

    #[test]
    fn test_integer_shift_moves_rows() {
        let image = gradient_image(6, 6);
        let params = AffineParams { tx: 2.0, ..AffineParams::identity() };
        let out = apply_transform(image.view(), &params);
        // output row r reads input row r + 2, clamped at the bottom edge
        assert_abs_diff_eq!(out[[0, 3, 0]], image[[2, 3, 0]], epsilon = 1e-4);
        assert_abs_diff_eq!(out[[5, 3, 0]], image[[5, 3, 0]], epsilon = 1e-4);
    }

    #[test]
    fn test_half_turn_rotation() {
        let image = gradient_image(4, 4);
        let params = AffineParams { theta: std::f32::consts::PI, ..AffineParams::identity() };
        let out = apply_transform(image.view(), &params);
        assert_abs_diff_eq!(out[[0, 0, 0]], image[[3, 3, 0]], epsilon = 1e-3);
        assert_abs_diff_eq!(out[[1, 2, 0]], image[[2, 1, 0]], epsilon = 1e-3);
    }

    #[test]
    fn test_constant_image_is_invariant() {
        let image = Array3::from_elem((8, 8, 3), 0.4f32);
        let augmenter = ImageAugmenter::default();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..10 {
            let out = augmenter.random_transform(image.view(), &mut rng);
            assert!(out.iter().all(|&v| (v - 0.4).abs() < 1e-5));
        }
    }

    #[test]
    fn test_random_params_within_ranges() {
        let augmenter = ImageAugmenter::default();
        let mut rng = StdRng::seed_from_u64(12);
        let mut flips = 0;
        for _ in 0..500 {
            let p = augmenter.random_params(32, 32, &mut rng);
            assert!(p.theta.abs() <= 5f32.to_radians() + 1e-6);
            assert!(p.tx.abs() <= 8.0 && p.ty.abs() <= 8.0);
            assert!(p.shear.abs() <= 3.14 / 180.0);
            assert!((0.99..=1.05).contains(&p.zx) && (0.99..=1.05).contains(&p.zy));
            flips += usize::from(p.flip);
        }
        assert!(flips > 150 && flips < 350, "flips {flips}");
    }

    #[test]
    fn test_none_config_is_identity() {
        let image = gradient_image(4, 5);
        let augmenter = ImageAugmenter::new(AugmentConfig::none());
        let out = augmenter.random_transform(image.view(), &mut StdRng::seed_from_u64(0));
        for (a, b) in out.iter().zip(image.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
        }
    }
}
