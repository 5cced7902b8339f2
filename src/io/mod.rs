//! Checkpoint persistence
//!
//! Checkpoints are SafeTensors files: one F32 entry per named model
//! parameter plus string metadata describing the epoch and model shape.

mod load;
mod model;
mod save;

pub use load::{load_checkpoint, read_checkpoint_meta};
pub use model::CheckpointMeta;
pub use save::save_checkpoint;

/// File extension of checkpoints
pub const CHECKPOINT_EXTENSION: &str = "safetensors";
