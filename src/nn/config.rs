//! Model configuration

use serde::{Deserialize, Serialize};

/// Configuration for the gated-convolution ensemble
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Number of gated blocks, one prediction head each
    pub nb_layers: usize,
    /// Dropout rate applied to each head before pooling (0 disables it)
    pub dropout: f32,
    /// Feature maps produced by every block
    pub nb_features: usize,
    /// L2 penalty coefficient on value-path kernels
    pub weight_decay: f32,
    /// Number of output classes
    pub nb_classes: usize,
    /// Input image shape `[height, width, channels]`
    pub input_shape: [usize; 3],
}

impl ModelConfig {
    /// CIFAR configuration: 5 blocks of 64 features on 32x32 RGB images
    pub fn cifar(nb_classes: usize) -> Self {
        Self {
            nb_layers: 5,
            dropout: 0.5,
            nb_features: 64,
            weight_decay: 1e-6,
            nb_classes,
            input_shape: [32, 32, 3],
        }
    }

    /// Spatial size lost to each 3x3 valid convolution
    pub const SHRINK_PER_CONV: usize = 2;

    /// Smallest input side that keeps every head's feature map non-empty
    pub fn min_input_side(&self) -> usize {
        Self::SHRINK_PER_CONV * (self.nb_layers + 1) + 1
    }

    /// Spatial size of the head output of block `index`
    pub fn head_side(&self, index: usize) -> (usize, usize) {
        let shrink = Self::SHRINK_PER_CONV * (index + 2);
        (
            self.input_shape[0].saturating_sub(shrink),
            self.input_shape[1].saturating_sub(shrink),
        )
    }
}
