//! Checkpoint loading

use super::CheckpointMeta;
use crate::nn::WigEnsemble;
use crate::{Error, Result};
use safetensors::tensor::Dtype;
use safetensors::SafeTensors;
use std::path::Path;
use tracing::debug;

fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path)
        .map_err(|e| Error::Checkpoint(format!("cannot read {}: {e}", path.display())))
}

/// Read only the metadata header of a checkpoint
pub fn read_checkpoint_meta(path: impl AsRef<Path>) -> Result<CheckpointMeta> {
    let data = read_bytes(path.as_ref())?;
    let (_, header) = SafeTensors::read_metadata(&data)
        .map_err(|e| Error::Checkpoint(format!("SafeTensors parsing failed: {e}")))?;
    let map = header
        .metadata()
        .as_ref()
        .ok_or_else(|| Error::Checkpoint("checkpoint has no metadata".into()))?;
    CheckpointMeta::from_metadata(map)
}

/// Copy stored weights into the parameters of `model`
///
/// Every parameter must be present with the same shape; extra entries in the
/// file are ignored.
pub fn load_checkpoint(model: &mut WigEnsemble, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let data = read_bytes(path)?;
    let stored = SafeTensors::deserialize(&data)
        .map_err(|e| Error::Checkpoint(format!("SafeTensors parsing failed: {e}")))?;

    for (name, param) in model.named_parameters_mut() {
        let view = stored
            .tensor(&name)
            .map_err(|_| Error::Checkpoint(format!("tensor '{name}' missing from {}", path.display())))?;
        if view.dtype() != Dtype::F32 {
            return Err(Error::Checkpoint(format!("tensor '{name}' is {:?}, expected F32", view.dtype())));
        }
        if view.shape() != param.shape() {
            return Err(Error::Checkpoint(format!(
                "tensor '{name}' has shape {:?}, model expects {:?}",
                view.shape(),
                param.shape()
            )));
        }

        let values = view
            .data()
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]));
        for (dst, src) in param.data_mut().iter_mut().zip(values) {
            *dst = src;
        }
        param.zero_grad();
    }

    debug!(path = %path.display(), "loaded checkpoint");
    Ok(())
}
