//! Shuffled, augmented passes over a dataset

use super::{ImageAugmenter, ImageBatch};
use crate::{Error, Result};
use ndarray::{s, Array4, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Endless stream of augmented chunks
///
/// Each pass over the data visits every row once in a fresh random order and
/// yields chunks of `min(batch_size, N)` rows; the final chunk of a pass holds
/// whatever is left, so chunk sizes vary.
pub struct AugmentedFlow {
    data: ImageBatch,
    augmenter: ImageAugmenter,
    chunk_size: usize,
    order: Vec<usize>,
    cursor: usize,
    rng: StdRng,
}

impl AugmentedFlow {
    pub fn new(
        data: ImageBatch,
        augmenter: ImageAugmenter,
        batch_size: usize,
        rng: StdRng,
    ) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::InvalidConfig("cannot flow over an empty dataset".into()));
        }
        if batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be positive".into()));
        }
        let chunk_size = batch_size.min(data.len());
        let order = (0..data.len()).collect();
        let cursor = data.len();
        Ok(Self { data, augmenter, chunk_size, order, cursor, rng })
    }

    /// Rows per full chunk
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Next augmented chunk
    pub fn next_chunk(&mut self) -> ImageBatch {
        if self.cursor >= self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.cursor = 0;
        }
        let end = (self.cursor + self.chunk_size).min(self.order.len());
        let picked = self.data.select(&self.order[self.cursor..end]);
        self.cursor = end;

        let mut images = Array4::<f32>::zeros(picked.images.raw_dim());
        for (i, image) in picked.images.axis_iter(Axis(0)).enumerate() {
            let out = self.augmenter.random_transform(image, &mut self.rng);
            images.slice_mut(s![i, .., .., ..]).assign(&out);
        }
        ImageBatch { images, labels: picked.labels }
    }
}

impl Iterator for AugmentedFlow {
    type Item = ImageBatch;

    fn next(&mut self) -> Option<ImageBatch> {
        Some(self.next_chunk())
    }
}
