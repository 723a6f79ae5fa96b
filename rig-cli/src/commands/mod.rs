//! Command implementations

pub mod info;
pub mod pose;
pub mod tree;
pub mod validate;

use anyhow::{Context, Result};
use log::info;
use rig_collada::document::DocumentParser;
use rig_collada::{Animation, LoadConfig, ModelSpecification, PipelineConfig, load_animation};
use std::path::Path;

/// A model and, when the document has one, its animation
pub struct LoadedDocument {
    pub model: ModelSpecification,
    pub animation: Option<Animation>,
    pub config: LoadConfig,
}

/// Parse `path` once and build both the model and its animation
pub fn load_document(path: &Path, settings: &PipelineConfig) -> Result<LoadedDocument> {
    let config = settings.load_config().context("Invalid load settings")?;
    info!("Loading scene document: {}", path.display());

    let raw = DocumentParser::new(&config)
        .parse(path)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let animation = if raw.channels.is_empty() {
        None
    } else {
        Some(
            load_animation(&raw, &config)
                .with_context(|| format!("Failed to load animation from {}", path.display()))?,
        )
    };

    let model = rig_collada::builder::build(raw, &config)
        .with_context(|| format!("Failed to build model from {}", path.display()))?;

    Ok(LoadedDocument {
        model,
        animation,
        config,
    })
}
