//! Image/label batches

use crate::train::Batch;
use crate::{Error, Result, Tensor};
use ndarray::{concatenate, s, Array2, Array4, Axis};

/// NHWC images with one-hot (or mixed) label rows
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch {
    /// Images `[N, H, W, C]`
    pub images: Array4<f32>,
    /// Labels `[N, classes]`
    pub labels: Array2<f32>,
}

impl ImageBatch {
    /// Pair images with labels; row counts must agree
    pub fn new(images: Array4<f32>, labels: Array2<f32>) -> Result<Self> {
        if images.len_of(Axis(0)) != labels.len_of(Axis(0)) {
            return Err(Error::ShapeMismatch {
                expected: vec![images.len_of(Axis(0))],
                actual: vec![labels.len_of(Axis(0))],
            });
        }
        Ok(Self { images, labels })
    }

    /// Zero-row batch with the given image and label geometry
    pub fn empty(image_shape: [usize; 3], classes: usize) -> Self {
        let [h, w, c] = image_shape;
        Self { images: Array4::zeros((0, h, w, c)), labels: Array2::zeros((0, classes)) }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.images.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `[H, W, C]` of one image
    pub fn image_shape(&self) -> [usize; 3] {
        let (_, h, w, c) = self.images.dim();
        [h, w, c]
    }

    pub fn num_classes(&self) -> usize {
        self.labels.ncols()
    }

    /// Rows of `self` followed by rows of `other`
    pub fn concat(&self, other: &ImageBatch) -> Result<Self> {
        let images = concatenate(Axis(0), &[self.images.view(), other.images.view()]).map_err(
            |_| Error::ShapeMismatch {
                expected: self.images.shape().to_vec(),
                actual: other.images.shape().to_vec(),
            },
        )?;
        let labels = concatenate(Axis(0), &[self.labels.view(), other.labels.view()]).map_err(
            |_| Error::ShapeMismatch {
                expected: self.labels.shape().to_vec(),
                actual: other.labels.shape().to_vec(),
            },
        )?;
        Ok(Self { images, labels })
    }

    /// Split into the first `n` rows and the rest (`n` is clamped to the length)
    pub fn split_at(&self, n: usize) -> (Self, Self) {
        let n = n.min(self.len());
        let head = Self {
            images: self.images.slice(s![..n, .., .., ..]).to_owned(),
            labels: self.labels.slice(s![..n, ..]).to_owned(),
        };
        let tail = Self {
            images: self.images.slice(s![n.., .., .., ..]).to_owned(),
            labels: self.labels.slice(s![n.., ..]).to_owned(),
        };
        (head, tail)
    }

    /// Rows at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            images: self.images.select(Axis(0), indices),
            labels: self.labels.select(Axis(0), indices),
        }
    }

    /// Consecutive chunks of at most `size` rows
    pub fn chunks(&self, size: usize) -> impl Iterator<Item = ImageBatch> + '_ {
        let size = size.max(1);
        (0..self.len()).step_by(size).map(move |start| {
            let end = (start + size).min(self.len());
            Self {
                images: self.images.slice(s![start..end, .., .., ..]).to_owned(),
                labels: self.labels.slice(s![start..end, ..]).to_owned(),
            }
        })
    }

    /// Constant tensors for a forward pass
    pub fn to_batch(&self) -> Batch {
        Batch::new(Tensor::from_array4(&self.images), Tensor::from_array2(&self.labels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> ImageBatch {
        let images = Array4::from_shape_fn((n, 2, 2, 1), |(i, _, _, _)| i as f32);
        let labels = Array2::from_shape_fn((n, 2), |(i, j)| if i % 2 == j { 1.0 } else { 0.0 });
        ImageBatch::new(images, labels).expect("matching rows")
    }

    #[test]
    fn test_new_rejects_row_mismatch() {
        let result = ImageBatch::new(Array4::zeros((3, 2, 2, 1)), Array2::zeros((2, 10)));
        assert!(matches!(result, Err(Error::ShapeMismatch { .. })));
    }

    #[test]
    fn test_concat_and_split() {
        let joined = numbered(3).concat(&numbered(2)).expect("same geometry");
        assert_eq!(joined.len(), 5);
        assert_eq!(joined.images[[3, 0, 0, 0]], 0.0);

        let (head, tail) = joined.split_at(4);
        assert_eq!(head.len(), 4);
        assert_eq!(tail.len(), 1);
        assert_eq!(tail.images[[0, 1, 1, 0]], 1.0);
    }

    #[test]
    fn test_concat_rejects_other_geometry() {
        let other = ImageBatch::empty([3, 3, 1], 2);
        assert!(numbered(1).concat(&other).is_err());
    }

    #[test]
    fn test_split_past_end() {
        let (head, tail) = numbered(2).split_at(10);
        assert_eq!(head.len(), 2);
        assert!(tail.is_empty());
    }

    #[test]
    fn test_select_reorders() {
        let picked = numbered(4).select(&[3, 0]);
        assert_eq!(picked.images[[0, 0, 0, 0]], 3.0);
        assert_eq!(picked.images[[1, 0, 0, 0]], 0.0);
    }

    #[test]
    fn test_chunks_cover_all_rows() {
        let sizes: Vec<usize> = numbered(7).chunks(3).map(|c| c.len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_to_batch_shapes() {
        let batch = numbered(3).to_batch();
        assert_eq!(batch.inputs.shape(), &[3, 2, 2, 1]);
        assert_eq!(batch.targets.shape(), &[3, 2]);
        assert_eq!(batch.size(), 3);
    }
}
