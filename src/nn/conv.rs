//! 2-D convolution layer

use super::Initializer;
use crate::autograd::conv2d;
use crate::Tensor;
use rand::Rng;

/// Valid, stride-1 convolution with a `[k, k, in, out]` kernel and optional bias
pub struct Conv2d {
    /// Kernel `[k, k, in_channels, out_channels]`
    pub kernel: Tensor,
    /// Bias `[out_channels]`
    pub bias: Option<Tensor>,
}

impl Conv2d {
    /// Create a square-kernel layer; the bias starts at zero
    pub fn new<R: Rng + ?Sized>(
        kernel_size: usize,
        in_channels: usize,
        out_channels: usize,
        init: Initializer,
        use_bias: bool,
        rng: &mut R,
    ) -> Self {
        let shape = [kernel_size, kernel_size, in_channels, out_channels];
        let fan_in = kernel_size * kernel_size * in_channels;
        let weights = init.sample(shape.iter().product(), fan_in, rng);
        Self {
            kernel: Tensor::from_shape_vec(&shape, weights, true),
            bias: use_bias.then(|| Tensor::zeros(out_channels, true)),
        }
    }

    /// Apply the convolution to an NHWC batch
    pub fn forward(&self, x: &Tensor) -> Tensor {
        conv2d(x, &self.kernel, self.bias.as_ref())
    }

    /// Output channel count
    pub fn out_channels(&self) -> usize {
        self.kernel.shape()[3]
    }

    /// Get all parameters as a vector
    pub fn parameters(&self) -> Vec<&Tensor> {
        let mut params = vec![&self.kernel];
        params.extend(self.bias.as_ref());
        params
    }

    /// Get all parameters as mutable references for optimizer
    pub fn parameters_mut(&mut self) -> Vec<&mut Tensor> {
        let mut params = vec![&mut self.kernel];
        params.extend(self.bias.as_mut());
        params
    }

    /// Parameters keyed `{prefix}.kernel` / `{prefix}.bias`
    pub fn named_parameters(&self, prefix: &str) -> Vec<(String, &Tensor)> {
        let mut params = vec![(format!("{prefix}.kernel"), &self.kernel)];
        if let Some(bias) = &self.bias {
            params.push((format!("{prefix}.bias"), bias));
        }
        params
    }

    /// Mutable parameters keyed like [`Conv2d::named_parameters`]
    pub fn named_parameters_mut(&mut self, prefix: &str) -> Vec<(String, &mut Tensor)> {
        let mut params = vec![(format!("{prefix}.kernel"), &mut self.kernel)];
        if let Some(bias) = &mut self.bias {
            params.push((format!("{prefix}.bias"), bias));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_conv_layer_shapes() {
        let mut rng = StdRng::seed_from_u64(0);
        let conv = Conv2d::new(3, 3, 8, Initializer::HeNormal, true, &mut rng);
        assert_eq!(conv.kernel.shape(), &[3, 3, 3, 8]);
        assert_eq!(conv.bias.as_ref().map(Tensor::len), Some(8));
        assert_eq!(conv.out_channels(), 8);

        let x = Tensor::zeros_shaped(&[2, 10, 10, 3], false);
        assert_eq!(conv.forward(&x).shape(), &[2, 8, 8, 8]);
    }

    #[test]
    fn test_conv_layer_without_bias() {
        let mut rng = StdRng::seed_from_u64(0);
        let conv = Conv2d::new(3, 4, 2, Initializer::Zeros, false, &mut rng);
        assert!(conv.bias.is_none());
        assert_eq!(conv.parameters().len(), 1);
        let names: Vec<String> = conv.named_parameters("head").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["head.kernel".to_string()]);
    }

    #[test]
    fn test_conv_layer_named_parameters() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut conv = Conv2d::new(3, 1, 1, Initializer::Zeros, true, &mut rng);
        let names: Vec<String> =
            conv.named_parameters_mut("gate").into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["gate.kernel".to_string(), "gate.bias".to_string()]);
        assert_eq!(conv.parameters_mut().len(), 2);
    }
}
