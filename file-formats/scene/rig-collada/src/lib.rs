//! Skinned model loading and skeletal animation for COLLADA scene documents
//!
//! This crate turns a COLLADA-style XML document into a model ready for GPU
//! upload and evolves a time-varying pose over its skeleton. It stops at
//! vertex buffers and per-joint skinning matrices; rendering is left to the
//! caller.
//!
//! ## Features
//!
//! - Parse geometry, skin controller, skeleton and matrix animation sections
//! - Fixed-width skin influences (heaviest joints kept and renormalized)
//! - Joint hierarchy with inverse bind transforms computed at load
//! - Keyframe animations with position lerp and rotation slerp
//! - Per-entity animators sharing one model and one animation
//! - Optional Z-up to Y-up conversion
//! - CPU skinning for tooling and verification
//!
//! ## Example
//!
//! ```no_run
//! use rig_collada::{Animator, AnimatorConfig, EndPolicy, LoadConfig};
//! use rig_collada::document::DocumentParser;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LoadConfig::default();
//! let raw = DocumentParser::new(&config).parse("character.dae")?;
//! let animation = Arc::new(rig_collada::load_animation(&raw, &config)?);
//! let model = Arc::new(rig_collada::builder::build(raw, &config)?);
//!
//! let mut animator = Animator::new(model, AnimatorConfig::new(EndPolicy::Wrap));
//! animator.play_animation(animation);
//! animator.tick(16.0);
//! println!("{} skinning matrices", animator.joint_transforms().len());
//! # Ok(())
//! # }
//! ```
//!
//! ## References
//!
//! - <https://www.khronos.org/collada/>

pub mod animation;
pub mod animator;
pub mod builder;
pub mod config;
pub mod document;
pub mod error;
pub mod math;
pub mod skeleton;
pub mod skin;
pub mod skinning;

pub use animation::{Animation, JointTransform, KeyFrame, load_animation};
pub use animator::Animator;
pub use builder::{ModelSpecification, VERTEX_STRIDE, load_model};
pub use config::{AnimatorConfig, EndPolicy, LoadConfig, PipelineConfig, UpAxisPolicy};
pub use error::{ColladaError, Result};
pub use skeleton::Joint;
pub use skin::{VertexInfluences, normalize};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
