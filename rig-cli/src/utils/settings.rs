//! Settings file loading

use anyhow::{Context, Result};
use log::debug;
use rig_collada::PipelineConfig;
use std::fs;
use std::path::Path;

/// Read pipeline settings from a JSON file, or use defaults when none is given
pub fn load_settings(path: Option<&Path>) -> Result<PipelineConfig> {
    let Some(path) = path else {
        return Ok(PipelineConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    let settings: PipelineConfig = serde_json::from_str(&text)
        .with_context(|| format!("Invalid settings file {}", path.display()))?;
    debug!("Loaded settings: {:?}", settings);
    Ok(settings)
}
