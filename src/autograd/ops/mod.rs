//! Autograd operations with backward passes
//!
//! This module provides differentiable operations for automatic differentiation.

mod activations;
mod basic;
mod conv;
mod dropout;
mod pool;

// Re-export all public operations
pub use activations::{sigmoid, softmax_rows};
pub use basic::{add, average, mul, scale, sum, sum_squares};
pub use conv::{conv2d, ConvGeometry};
pub use dropout::dropout;
pub use pool::global_avg_pool;
