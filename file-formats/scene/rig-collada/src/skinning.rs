//! CPU vertex skinning
//!
//! Applies an animator's skinning matrices to a model's bind-pose positions
//! and normals. Rendering does this on the GPU; the CPU path exists for
//! tooling and for checking poses in tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use rig_collada::skinning::{Skinner, SkinningOptions};
//! use rig_collada::{Animator, AnimatorConfig, EndPolicy, LoadConfig, load_model};
//! use std::sync::Arc;
//!
//! let model = Arc::new(load_model("character.dae", &LoadConfig::default())?);
//! let animator = Animator::new(Arc::clone(&model), AnimatorConfig::new(EndPolicy::Wrap));
//!
//! let skinner = Skinner::new(animator.joint_transforms(), SkinningOptions::default());
//! let mesh = skinner.skin_model(&model);
//! println!("{} skinned positions", mesh.positions.len());
//! # Ok::<(), rig_collada::ColladaError>(())
//! ```

use crate::builder::ModelSpecification;
use crate::skin::VertexInfluences;
use glam::{Mat4, Vec3};
use log::trace;

/// Options for controlling the skinning behavior
#[derive(Debug, Clone)]
pub struct SkinningOptions {
    /// Influences lighter than this are ignored
    pub weight_threshold: f32,
    /// Divide by the total applied weight, so weights need not sum to 1
    pub normalize_weights: bool,
}

impl Default for SkinningOptions {
    fn default() -> Self {
        Self {
            weight_threshold: 0.0001,
            normalize_weights: true,
        }
    }
}

/// Skinned geometry
#[derive(Debug, Clone, Default)]
pub struct SkinnedMesh {
    /// One per model position
    pub positions: Vec<Vec3>,
    /// One per triangle corner
    pub normals: Vec<Vec3>,
}

/// Vertex skinner over a set of skinning matrices indexed by joint id
pub struct Skinner<'a> {
    joint_transforms: &'a [Mat4],
    options: SkinningOptions,
}

impl<'a> Skinner<'a> {
    pub fn new(joint_transforms: &'a [Mat4], options: SkinningOptions) -> Self {
        Self {
            joint_transforms,
            options,
        }
    }

    /// Blend `point` through every influencing joint
    ///
    /// Vertices without any usable influence keep their bind position.
    pub fn skin_position(&self, point: Vec3, influences: &VertexInfluences) -> Vec3 {
        self.blend(influences, point, |matrix, p| matrix.transform_point3(p))
    }

    /// Blend a normal; the result is renormalized
    pub fn skin_normal(&self, normal: Vec3, influences: &VertexInfluences) -> Vec3 {
        self.blend(influences, normal, |matrix, n| matrix.transform_vector3(n))
            .normalize_or(normal)
    }

    fn blend(
        &self,
        influences: &VertexInfluences,
        value: Vec3,
        apply: impl Fn(&Mat4, Vec3) -> Vec3,
    ) -> Vec3 {
        let mut result = Vec3::ZERO;
        let mut total_weight = 0.0f32;

        for (joint, weight) in influences.iter() {
            if weight < self.options.weight_threshold {
                continue;
            }
            let Some(matrix) = self.joint_transforms.get(joint as usize) else {
                trace!("Skipping influence of unknown joint {}", joint);
                continue;
            };
            result += apply(matrix, value) * weight;
            total_weight += weight;
        }

        if total_weight < self.options.weight_threshold {
            return value;
        }
        if self.options.normalize_weights {
            result /= total_weight;
        }
        result
    }

    /// Skin every position and corner normal of `model`
    pub fn skin_model(&self, model: &ModelSpecification) -> SkinnedMesh {
        let positions = model
            .positions
            .iter()
            .zip(&model.influences)
            .map(|(&position, influences)| self.skin_position(position, influences))
            .collect();
        let normals = model
            .corners
            .iter()
            .map(|corner| {
                self.skin_normal(
                    model.normals[corner.normal],
                    &model.influences[corner.position],
                )
            })
            .collect();

        SkinnedMesh { positions, normals }
    }
}
