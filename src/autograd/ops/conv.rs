//! 2-D convolution (stride 1, valid padding) over NHWC tensors
//!
//! Each image is unrolled into a patch matrix (`im2col`) so the convolution
//! becomes one matrix product against the kernel reshaped to
//! `[kh * kw * in_channels, out_channels]`.

use crate::autograd::{BackwardOp, Tensor};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use std::cell::RefCell;
use std::rc::Rc;

/// Dimensions of one convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvGeometry {
    pub batch: usize,
    pub height: usize,
    pub width: usize,
    pub in_channels: usize,
    pub kernel_h: usize,
    pub kernel_w: usize,
    pub out_channels: usize,
}

impl ConvGeometry {
    /// Derive the geometry from an NHWC input shape and a `[kh, kw, in, out]` kernel shape
    ///
    /// # Panics
    ///
    /// Panics on rank or channel mismatches, or a kernel larger than the input.
    pub fn infer(input_shape: &[usize], kernel_shape: &[usize]) -> Self {
        assert_eq!(input_shape.len(), 4, "conv2d input must be [N, H, W, C]");
        assert_eq!(kernel_shape.len(), 4, "conv2d kernel must be [KH, KW, C, F]");
        assert_eq!(
            input_shape[3], kernel_shape[2],
            "conv2d input channels do not match kernel"
        );
        assert!(
            input_shape[1] >= kernel_shape[0] && input_shape[2] >= kernel_shape[1],
            "conv2d kernel {}x{} larger than input {}x{}",
            kernel_shape[0],
            kernel_shape[1],
            input_shape[1],
            input_shape[2]
        );
        Self {
            batch: input_shape[0],
            height: input_shape[1],
            width: input_shape[2],
            in_channels: input_shape[3],
            kernel_h: kernel_shape[0],
            kernel_w: kernel_shape[1],
            out_channels: kernel_shape[3],
        }
    }

    pub fn out_height(&self) -> usize {
        self.height - self.kernel_h + 1
    }

    pub fn out_width(&self) -> usize {
        self.width - self.kernel_w + 1
    }

    /// Rows of the patch matrix (output pixels per image)
    fn patches(&self) -> usize {
        self.out_height() * self.out_width()
    }

    /// Columns of the patch matrix
    fn patch_len(&self) -> usize {
        self.kernel_h * self.kernel_w * self.in_channels
    }

    fn image_len(&self) -> usize {
        self.height * self.width * self.in_channels
    }

    pub fn output_shape(&self) -> Vec<usize> {
        vec![self.batch, self.out_height(), self.out_width(), self.out_channels]
    }
}

/// Unroll one NHWC image into `[out_h * out_w, kh * kw * c]`
fn im2col(image: &[f32], geom: &ConvGeometry) -> Array2<f32> {
    let (ow, c) = (geom.out_width(), geom.in_channels);
    let mut cols = Array2::zeros((geom.patches(), geom.patch_len()));
    for (row, mut patch) in cols.axis_iter_mut(Axis(0)).enumerate() {
        let (oy, ox) = (row / ow, row % ow);
        let patch = patch.as_slice_mut().expect("row of standard layout array");
        for ky in 0..geom.kernel_h {
            for kx in 0..geom.kernel_w {
                let src = ((oy + ky) * geom.width + (ox + kx)) * c;
                let dst = (ky * geom.kernel_w + kx) * c;
                patch[dst..dst + c].copy_from_slice(&image[src..src + c]);
            }
        }
    }
    cols
}

/// Scatter-add a patch-matrix gradient back onto one image
fn col2im_accumulate(cols: &Array2<f32>, geom: &ConvGeometry, image_grad: &mut [f32]) {
    let (ow, c) = (geom.out_width(), geom.in_channels);
    for (row, patch) in cols.axis_iter(Axis(0)).enumerate() {
        let (oy, ox) = (row / ow, row % ow);
        for ky in 0..geom.kernel_h {
            for kx in 0..geom.kernel_w {
                let dst = ((oy + ky) * geom.width + (ox + kx)) * c;
                let src = (ky * geom.kernel_w + kx) * c;
                for ch in 0..c {
                    image_grad[dst + ch] += patch[src + ch];
                }
            }
        }
    }
}

fn kernel_matrix<'a>(kernel: &'a Tensor, geom: &ConvGeometry) -> ArrayView2<'a, f32> {
    ArrayView2::from_shape(
        (geom.patch_len(), geom.out_channels),
        kernel.data().as_slice().expect("contiguous kernel"),
    )
    .expect("kernel shape checked by ConvGeometry")
}

/// Valid 2-D convolution with stride 1
///
/// * `input` - `[N, H, W, C]`
/// * `kernel` - `[KH, KW, C, F]`
/// * `bias` - optional `[F]`
///
/// Returns `[N, H - KH + 1, W - KW + 1, F]`.
pub fn conv2d(input: &Tensor, kernel: &Tensor, bias: Option<&Tensor>) -> Tensor {
    let geom = ConvGeometry::infer(input.shape(), kernel.shape());
    if let Some(b) = bias {
        assert_eq!(b.len(), geom.out_channels, "conv2d bias length must equal out channels");
    }

    let weights = kernel_matrix(kernel, &geom);
    let x = input.data().as_slice().expect("contiguous input");
    let out_image = geom.patches() * geom.out_channels;
    let mut out = Vec::with_capacity(geom.batch * out_image);

    for n in 0..geom.batch {
        let image = &x[n * geom.image_len()..(n + 1) * geom.image_len()];
        let mut y = im2col(image, &geom).dot(&weights);
        if let Some(b) = bias {
            y += b.data();
        }
        out.extend(y.iter());
    }

    let requires_grad =
        input.requires_grad() || kernel.requires_grad() || bias.is_some_and(Tensor::requires_grad);
    let mut result = Tensor::with_shape(Array1::from(out), geom.output_shape(), requires_grad);

    if requires_grad {
        let backward_op = Rc::new(Conv2dBackward {
            input: input.clone(),
            kernel: kernel.clone(),
            bias: bias.cloned(),
            geom,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(backward_op);
    }

    result
}

struct Conv2dBackward {
    input: Tensor,
    kernel: Tensor,
    bias: Option<Tensor>,
    geom: ConvGeometry,
    result_grad: Rc<RefCell<Option<Array1<f32>>>>,
}

impl BackwardOp for Conv2dBackward {
    fn backward(&self) {
        let Some(grad_output) = self.result_grad.borrow().clone() else {
            return;
        };
        let geom = &self.geom;
        let weights = kernel_matrix(&self.kernel, geom);
        let x = self.input.data().as_slice().expect("contiguous input");
        let g = grad_output.as_slice().expect("contiguous gradient");
        let out_image = geom.patches() * geom.out_channels;

        let want_input = self.input.requires_grad();
        let want_kernel = self.kernel.requires_grad();
        let want_bias = self.bias.as_ref().is_some_and(Tensor::requires_grad);

        let mut grad_input = want_input.then(|| vec![0.0f32; x.len()]);
        let mut grad_kernel = Array2::<f32>::zeros((geom.patch_len(), geom.out_channels));
        let mut grad_bias = Array1::<f32>::zeros(geom.out_channels);

        for n in 0..geom.batch {
            let g_n = ArrayView2::from_shape(
                (geom.patches(), geom.out_channels),
                &g[n * out_image..(n + 1) * out_image],
            )
            .expect("gradient matches output shape");

            if want_kernel {
                let image = &x[n * geom.image_len()..(n + 1) * geom.image_len()];
                // ∂L/∂W += colsᵀ · ∂L/∂Y
                grad_kernel += &im2col(image, geom).t().dot(&g_n);
            }
            if want_bias {
                grad_bias += &g_n.sum_axis(Axis(0));
            }
            if let Some(gi) = grad_input.as_mut() {
                // ∂L/∂cols = ∂L/∂Y · Wᵀ, folded back onto the image
                let cols_grad = g_n.dot(&weights.t());
                let start = n * geom.image_len();
                col2im_accumulate(&cols_grad, geom, &mut gi[start..start + geom.image_len()]);
            }
        }

        if let Some(gi) = grad_input {
            self.input.accumulate_grad(Array1::from(gi));
        }
        if want_kernel {
            self.kernel.accumulate_grad(Array1::from_iter(grad_kernel.iter().copied()));
        }
        if let (true, Some(b)) = (want_bias, self.bias.as_ref()) {
            b.accumulate_grad(grad_bias);
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        let mut inputs = vec![self.input.clone(), self.kernel.clone()];
        inputs.extend(self.bias.clone());
        inputs
    }
}
