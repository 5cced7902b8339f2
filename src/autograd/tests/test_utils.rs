//! Test utilities for gradient checking

/// Finite difference gradient checker
///
/// Computes numerical gradient using central difference:
/// f'(x) ≈ (f(x + h) - f(x - h)) / (2h)
pub fn finite_difference<F>(f: F, x: &[f32], epsilon: f32) -> Vec<f32>
where
    F: Fn(&[f32]) -> f32,
{
    let mut grad = vec![0.0; x.len()];
    let mut x_plus = x.to_vec();
    let mut x_minus = x.to_vec();

    for i in 0..x.len() {
        x_plus[i] = x[i] + epsilon;
        x_minus[i] = x[i] - epsilon;

        grad[i] = (f(&x_plus) - f(&x_minus)) / (2.0 * epsilon);

        x_plus[i] = x[i];
        x_minus[i] = x[i];
    }

    grad
}

/// Weighted sum `Σ wᵢ yᵢ`, the scalar whose gradient w.r.t. `y` is `w`
pub fn weighted_sum(y: &[f32], w: &[f32]) -> f32 {
    y.iter().zip(w).map(|(a, b)| a * b).sum()
}

/// Deterministic pseudo-random values in `[-1, 1)` for fixtures
pub fn fixture(len: usize, seed: u32) -> Vec<f32> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state % 2000) as f32 / 1000.0 - 1.0
        })
        .collect()
}
