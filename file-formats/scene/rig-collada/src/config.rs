//! Configuration objects passed explicitly to the loader and the animator

use crate::error::{ColladaError, Result};

#[cfg(feature = "serde-support")]
use serde::{Deserialize, Serialize};

/// Default number of joint influences kept per vertex
pub const DEFAULT_MAX_INFLUENCES: usize = 3;

/// Default name of the node that holds the skeleton
pub const DEFAULT_SKELETON_ROOT: &str = "Armature";

/// What to do with documents that are not Y-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "snake_case"))]
pub enum UpAxisPolicy {
    /// Keep coordinates as authored
    #[default]
    Preserve,
    /// Rotate Z-up documents into a Y-up frame
    ConvertToYUp,
}

/// Behavior once elapsed time passes the end of an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-support", serde(rename_all = "snake_case"))]
pub enum EndPolicy {
    /// Loop: elapsed time is taken modulo the animation length
    Wrap,
    /// Hold the final pose
    Clamp,
}

/// Options for turning a document into a model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    /// Width of every vertex's influence list after normalization
    pub max_influences: usize,
    /// Node id or name under which the skeleton lives
    pub skeleton_root: String,
    pub up_axis: UpAxisPolicy,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_influences: DEFAULT_MAX_INFLUENCES,
            skeleton_root: DEFAULT_SKELETON_ROOT.to_string(),
            up_axis: UpAxisPolicy::Preserve,
        }
    }
}

impl LoadConfig {
    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.max_influences == 0 {
            return Err(ColladaError::ConfigError(
                "max_influences must be at least 1".to_string(),
            ));
        }
        if self.skeleton_root.trim().is_empty() {
            return Err(ColladaError::ConfigError(
                "skeleton_root must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-entity animator options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimatorConfig {
    pub end_policy: EndPolicy,
}

impl AnimatorConfig {
    pub fn new(end_policy: EndPolicy) -> Self {
        Self { end_policy }
    }
}

/// Partially specified settings, as read from a settings file
///
/// Every field may be omitted. Load options fall back to their defaults;
/// the end-of-animation policy has no default and must be configured
/// before an animator can be built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde-support", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-support", serde(default))]
pub struct PipelineConfig {
    pub max_influences: Option<usize>,
    pub skeleton_root: Option<String>,
    pub up_axis: Option<UpAxisPolicy>,
    pub end_policy: Option<EndPolicy>,
}

impl PipelineConfig {
    /// Resolve the load options, applying defaults for omitted fields
    pub fn load_config(&self) -> Result<LoadConfig> {
        let defaults = LoadConfig::default();
        let config = LoadConfig {
            max_influences: self.max_influences.unwrap_or(defaults.max_influences),
            skeleton_root: self
                .skeleton_root
                .clone()
                .unwrap_or(defaults.skeleton_root),
            up_axis: self.up_axis.unwrap_or(defaults.up_axis),
        };
        config.validate()?;
        Ok(config)
    }

    /// Resolve the animator options
    pub fn animator_config(&self) -> Result<AnimatorConfig> {
        self.end_policy.map(AnimatorConfig::new).ok_or_else(|| {
            ColladaError::ConfigError("no end-of-animation policy configured".to_string())
        })
    }
}
