//! Configuration file loading

use super::RunConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Load a run configuration from a YAML file
///
/// Validation happens after CLI overrides are applied, see
/// [`validate_config`](super::validate_config).
pub fn load_config<P: AsRef<Path>>(config_path: P) -> Result<RunConfig> {
    let yaml_content = fs::read_to_string(config_path.as_ref()).map_err(|e| {
        Error::ConfigError(format!(
            "Failed to read config file {}: {}",
            config_path.as_ref().display(),
            e
        ))
    })?;

    serde_yaml::from_str(&yaml_content)
        .map_err(|e| Error::ConfigError(format!("Failed to parse YAML config: {e}")))
}
