//! Joint hierarchy and bind-pose computation
//!
//! A skeleton is an owned tree of [`Joint`]s. Each joint carries its bind
//! transform relative to its parent; the inverse of the composed model-space
//! bind transform is computed once at load and never changes afterwards.
//!
//! Traversals and dropping use an explicit stack, so deep hierarchies are not
//! bounded by the call-stack depth.

use crate::error::{ColladaError, Result};
use crate::math::is_invertible;
use glam::Mat4;
use std::collections::HashSet;

/// A joint of the skeleton
#[derive(Debug, Clone)]
pub struct Joint {
    /// Index into the model's joint name table
    pub id: u32,
    pub name: String,
    /// Bind transform relative to the parent joint
    pub local_bind_transform: Mat4,
    pub children: Vec<Joint>,

    inverse_bind_transform: Mat4,
}

impl Joint {
    pub fn new(id: u32, name: impl Into<String>, local_bind_transform: Mat4) -> Self {
        Self {
            id,
            name: name.into(),
            local_bind_transform,
            children: Vec::new(),
            inverse_bind_transform: Mat4::IDENTITY,
        }
    }

    pub fn add_child(&mut self, joint: Joint) {
        self.children.push(joint);
    }

    /// Inverse of the model-space bind transform
    pub fn inverse_bind_transform(&self) -> Mat4 {
        self.inverse_bind_transform
    }

    /// Compute inverse bind transforms for this joint and its subtree
    ///
    /// Call on the root with `Mat4::IDENTITY`. For every joint
    /// `bind = parent_bind * local_bind` and the stored inverse is
    /// `bind⁻¹`. A non-invertible `bind` fails with
    /// [`ColladaError::SingularBindTransform`]; the tree is then only partly
    /// updated and should be discarded.
    pub fn calculate_inverse_bind_transforms(&mut self, parent_bind_transform: Mat4) -> Result<()> {
        let mut stack: Vec<(&mut Joint, Mat4)> = vec![(self, parent_bind_transform)];

        while let Some((joint, parent)) = stack.pop() {
            let bind = parent * joint.local_bind_transform;
            if !is_invertible(&bind) {
                return Err(ColladaError::SingularBindTransform {
                    joint: joint.name.clone(),
                });
            }
            joint.inverse_bind_transform = bind.inverse();
            for child in joint.children.iter_mut() {
                stack.push((child, bind));
            }
        }
        Ok(())
    }

    /// Model-space bind transform of every joint, as `(id, transform)` pairs
    /// in depth-first order
    pub fn bind_transforms(&self) -> Vec<(u32, Mat4)> {
        let mut result = Vec::new();
        let mut stack = vec![(self, Mat4::IDENTITY)];
        while let Some((joint, parent)) = stack.pop() {
            let bind = parent * joint.local_bind_transform;
            result.push((joint.id, bind));
            for child in joint.children.iter().rev() {
                stack.push((child, bind));
            }
        }
        result
    }

    /// Depth-first iterator over this joint and its descendants
    pub fn iter(&self) -> Joints<'_> {
        Joints { stack: vec![self] }
    }

    /// Number of joints in this subtree
    pub fn joint_count(&self) -> usize {
        self.iter().count()
    }

    /// Find a joint of this subtree by name
    pub fn find(&self, name: &str) -> Option<&Joint> {
        self.iter().find(|joint| joint.name == name)
    }

    /// Largest joint id in this subtree
    pub fn max_id(&self) -> u32 {
        self.iter().map(|joint| joint.id).max().unwrap_or(self.id)
    }

    /// Check that no two joints share an id
    pub fn validate_ids(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for joint in self.iter() {
            if !seen.insert(joint.id) {
                return Err(ColladaError::DuplicateJoint {
                    name: joint.name.clone(),
                    id: joint.id,
                });
            }
        }
        Ok(())
    }
}

impl Drop for Joint {
    fn drop(&mut self) {
        // Flatten the subtree so each joint is dropped with no children left
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut joint) = pending.pop() {
            pending.append(&mut joint.children);
        }
    }
}

/// Depth-first joint iterator, parents before children
pub struct Joints<'a> {
    stack: Vec<&'a Joint>,
}

impl<'a> Iterator for Joints<'a> {
    type Item = &'a Joint;

    fn next(&mut self) -> Option<Self::Item> {
        let joint = self.stack.pop()?;
        self.stack.extend(joint.children.iter().rev());
        Some(joint)
    }
}

impl<'a> IntoIterator for &'a Joint {
    type Item = &'a Joint;
    type IntoIter = Joints<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
