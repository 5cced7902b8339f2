//! Checkpoint metadata

use crate::nn::ModelConfig;
use crate::{Error, Result};
use std::collections::HashMap;

/// Training state stored alongside the weights
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointMeta {
    /// Epoch (0-based) the weights were taken from
    pub epoch: usize,
    /// Training categorical cross-entropy at that epoch
    pub crossentropy: f32,
    /// Architecture the weights belong to
    pub model: ModelConfig,
}

impl CheckpointMeta {
    pub fn new(epoch: usize, crossentropy: f32, model: ModelConfig) -> Self {
        Self { epoch, crossentropy, model }
    }

    /// String map for the SafeTensors header
    pub fn to_metadata(&self) -> Result<HashMap<String, String>> {
        let model = serde_json::to_string(&self.model)
            .map_err(|e| Error::Serialization(format!("JSON serialization failed: {e}")))?;
        Ok(HashMap::from([
            ("format".to_string(), "wig-ensemble".to_string()),
            ("epoch".to_string(), self.epoch.to_string()),
            ("crossentropy".to_string(), self.crossentropy.to_string()),
            ("nb_layers".to_string(), self.model.nb_layers.to_string()),
            ("nb_classes".to_string(), self.model.nb_classes.to_string()),
            ("model_config".to_string(), model),
        ]))
    }

    /// Parse the SafeTensors header written by [`CheckpointMeta::to_metadata`]
    pub fn from_metadata(map: &HashMap<String, String>) -> Result<Self> {
        let field = |key: &str| {
            map.get(key)
                .ok_or_else(|| Error::Checkpoint(format!("metadata key '{key}' missing")))
        };
        let epoch = field("epoch")?
            .parse()
            .map_err(|e| Error::Checkpoint(format!("bad epoch: {e}")))?;
        let crossentropy = field("crossentropy")?
            .parse()
            .map_err(|e| Error::Checkpoint(format!("bad crossentropy: {e}")))?;
        let model = serde_json::from_str(field("model_config")?)
            .map_err(|e| Error::Checkpoint(format!("bad model_config: {e}")))?;
        Ok(Self { epoch, crossentropy, model })
    }
}
