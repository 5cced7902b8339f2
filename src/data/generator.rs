//! Exact-size batches from a variable-size flow

use super::{AugmentedFlow, ColorJitter, ImageAugmenter, ImageBatch};
use crate::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, trace};

/// Endless generator of exactly `batch_size` augmented, color-jittered rows
///
/// Chunks pulled from the flow are jittered, appended to a row queue, and the
/// front `batch_size` rows are handed out; leftover rows wait for the next
/// call.
pub struct BatchGenerator {
    flow: AugmentedFlow,
    jitter: ColorJitter,
    queue: ImageBatch,
    batch_size: usize,
    rng: StdRng,
}

impl BatchGenerator {
    pub fn new(
        data: ImageBatch,
        batch_size: usize,
        augmenter: ImageAugmenter,
        jitter: ColorJitter,
        mut rng: StdRng,
    ) -> Result<Self> {
        let flow_rng = StdRng::seed_from_u64(rng.random());
        let mut flow = AugmentedFlow::new(data, augmenter, batch_size, flow_rng)?;
        let mut queue = flow.next_chunk();
        jitter.apply(&mut queue, &mut rng);
        Ok(Self { flow, jitter, queue, batch_size, rng })
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Rows currently waiting in the queue
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Next batch of exactly `batch_size` rows
    pub fn next_batch(&mut self) -> Result<ImageBatch> {
        while self.queue.len() < self.batch_size {
            let mut chunk = self.flow.next_chunk();
            self.jitter.apply(&mut chunk, &mut self.rng);
            self.queue = self.queue.concat(&chunk)?;
        }
        let (batch, rest) = self.queue.split_at(self.batch_size);
        self.queue = rest;
        trace!(rows = batch.len(), queued = self.queue.len(), "generated batch");
        Ok(batch)
    }
}

impl Iterator for BatchGenerator {
    type Item = ImageBatch;

    /// Rows of one flow share a geometry, so `None` only follows a logged
    /// concatenation failure
    fn next(&mut self) -> Option<ImageBatch> {
        match self.next_batch() {
            Ok(batch) => Some(batch),
            Err(e) => {
                error!(error = %e, "batch generator stopped");
                None
            }
        }
    }
}
