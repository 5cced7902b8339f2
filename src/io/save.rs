//! Checkpoint saving

use super::CheckpointMeta;
use crate::nn::WigEnsemble;
use crate::{Error, Result};
use safetensors::tensor::{Dtype, TensorView};
use std::path::Path;
use tracing::debug;

/// Write every named parameter of `model` as an F32 SafeTensors entry
///
/// The file is written to a sibling temporary path first and renamed into
/// place, so an interrupted save never leaves a truncated checkpoint.
pub fn save_checkpoint(
    model: &WigEnsemble,
    path: impl AsRef<Path>,
    meta: &CheckpointMeta,
) -> Result<()> {
    let path = path.as_ref();

    let tensor_data: Vec<(String, Vec<u8>, Vec<usize>)> = model
        .named_parameters()
        .into_iter()
        .map(|(name, tensor)| {
            let values = tensor.data().to_vec();
            let bytes: Vec<u8> = bytemuck::cast_slice(&values).to_vec();
            (name, bytes, tensor.shape().to_vec())
        })
        .collect();

    let views = tensor_data
        .iter()
        .map(|(name, bytes, shape)| {
            TensorView::new(Dtype::F32, shape.clone(), bytes)
                .map(|view| (name.as_str(), view))
                .map_err(|e| Error::Checkpoint(format!("tensor '{name}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let bytes = safetensors::serialize(views, &Some(meta.to_metadata()?))
        .map_err(|e| Error::Serialization(format!("SafeTensors serialization failed: {e}")))?;

    let tmp = path.with_extension("safetensors.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)?;

    debug!(path = %path.display(), epoch = meta.epoch, "saved checkpoint");
    Ok(())
}
