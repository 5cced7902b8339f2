//! Tensor with gradient tracking

use super::BackwardOp;
use crate::{Error, Result};
use ndarray::{Array1, Array2, Array4};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

type GradCell = Rc<RefCell<Option<Array1<f32>>>>;

/// Flat `f32` buffer with a logical shape, a shared gradient cell and the op
/// that produced it.
///
/// Images are stored NHWC. Cloning is cheap: the data buffer and gradient cell
/// are reference counted, so a clone captured by a backward op sees the same
/// gradient as the tensor it was cloned from.
#[derive(Clone)]
pub struct Tensor {
    data: Rc<Array1<f32>>,
    shape: Vec<usize>,
    grad: GradCell,
    backward_op: Option<Rc<dyn BackwardOp>>,
    requires_grad: bool,
}

impl Tensor {
    /// Create a 1-D tensor from an array
    pub fn new(data: Array1<f32>, requires_grad: bool) -> Self {
        let shape = vec![data.len()];
        Self::with_shape(data, shape, requires_grad)
    }

    /// Create a tensor with an explicit shape
    ///
    /// # Panics
    ///
    /// Panics if the shape does not cover exactly `data.len()` elements.
    pub fn with_shape(data: Array1<f32>, shape: Vec<usize>, requires_grad: bool) -> Self {
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {shape:?} does not match {} elements",
            data.len()
        );
        Self {
            data: Rc::new(data),
            shape,
            grad: Rc::new(RefCell::new(None)),
            backward_op: None,
            requires_grad,
        }
    }

    /// Create a 1-D tensor from a vector
    pub fn from_vec(data: Vec<f32>, requires_grad: bool) -> Self {
        Self::new(Array1::from(data), requires_grad)
    }

    /// Create a tensor from a vector with an explicit shape
    pub fn from_shape_vec(shape: &[usize], data: Vec<f32>, requires_grad: bool) -> Self {
        Self::with_shape(Array1::from(data), shape.to_vec(), requires_grad)
    }

    /// Create a 1-D tensor of zeros
    pub fn zeros(len: usize, requires_grad: bool) -> Self {
        Self::new(Array1::zeros(len), requires_grad)
    }

    /// Create a zero tensor with the given shape
    pub fn zeros_shaped(shape: &[usize], requires_grad: bool) -> Self {
        let len: usize = shape.iter().product();
        Self::with_shape(Array1::zeros(len), shape.to_vec(), requires_grad)
    }

    /// Create a constant (no gradient) tensor from an NHWC image array
    pub fn from_array4(images: &Array4<f32>) -> Self {
        let shape = images.shape().to_vec();
        let data: Vec<f32> = images.iter().copied().collect();
        Self::with_shape(Array1::from(data), shape, false)
    }

    /// Create a constant (no gradient) tensor from a 2-D array
    pub fn from_array2(rows: &Array2<f32>) -> Self {
        let shape = rows.shape().to_vec();
        let data: Vec<f32> = rows.iter().copied().collect();
        Self::with_shape(Array1::from(data), shape, false)
    }

    /// View the data as a `[rows, cols]` array
    pub fn to_array2(&self) -> Result<Array2<f32>> {
        if self.shape.len() != 2 {
            return Err(Error::ShapeMismatch {
                expected: vec![0, 0],
                actual: self.shape.clone(),
            });
        }
        Array2::from_shape_vec((self.shape[0], self.shape[1]), self.data.to_vec()).map_err(|_| {
            Error::ShapeMismatch {
                expected: self.shape.clone(),
                actual: vec![self.data.len()],
            }
        })
    }

    /// Get tensor data
    pub fn data(&self) -> &Array1<f32> {
        &self.data
    }

    /// Get mutable tensor data (copies the buffer if a graph still shares it)
    pub fn data_mut(&mut self) -> &mut Array1<f32> {
        Rc::make_mut(&mut self.data)
    }

    /// Logical shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the tensor holds no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether gradients flow into this tensor
    pub fn requires_grad(&self) -> bool {
        self.requires_grad
    }

    /// Current gradient, if any
    pub fn grad(&self) -> Option<Array1<f32>> {
        self.grad.borrow().clone()
    }

    /// Replace the gradient
    pub fn set_grad(&self, grad: Array1<f32>) {
        *self.grad.borrow_mut() = Some(grad);
    }

    /// Add to the gradient
    pub fn accumulate_grad(&self, grad: Array1<f32>) {
        let mut cell = self.grad.borrow_mut();
        match cell.as_mut() {
            Some(existing) => *existing += &grad,
            None => *cell = Some(grad),
        }
    }

    /// Clear the gradient
    pub fn zero_grad(&self) {
        *self.grad.borrow_mut() = None;
    }

    /// Shared gradient cell, captured by backward ops
    pub fn grad_cell(&self) -> GradCell {
        Rc::clone(&self.grad)
    }

    /// Op that produced this tensor
    pub fn backward_op(&self) -> Option<Rc<dyn BackwardOp>> {
        self.backward_op.clone()
    }

    /// Attach the op that produced this tensor
    pub fn set_backward_op(&mut self, op: Rc<dyn BackwardOp>) {
        self.backward_op = Some(op);
    }

    /// Same data, cut from the graph
    pub fn detach(&self) -> Self {
        Self {
            data: Rc::clone(&self.data),
            shape: self.shape.clone(),
            grad: Rc::new(RefCell::new(None)),
            backward_op: None,
            requires_grad: false,
        }
    }

    /// Identity of this node in the graph (its gradient cell)
    pub(crate) fn node_id(&self) -> usize {
        Rc::as_ptr(&self.grad) as *const () as usize
    }
}

impl fmt::Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.borrow().is_some())
            .finish()
    }
}
