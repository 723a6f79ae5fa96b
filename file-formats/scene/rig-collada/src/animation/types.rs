use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;

/// Local transform of one joint in a keyframe
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct JointTransform {
    /// Translation relative to the parent joint
    pub position: Vec3,
    /// Rotation relative to the parent joint
    pub rotation: Quat,
}

impl Default for JointTransform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl JointTransform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Blend towards `other`: linear on position, spherical on rotation
    pub fn interpolate(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            rotation: self.rotation.slerp(other.rotation, t),
        }
    }

    /// Local matrix: rotation first, then translation
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }
}

/// Joint pose at one point of an animation
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyFrame {
    /// Start time in milliseconds
    pub start_ms: f64,
    /// Joint name to local transform
    pub pose: HashMap<String, JointTransform>,
}

impl KeyFrame {
    pub fn new(start_ms: f64, pose: HashMap<String, JointTransform>) -> Self {
        Self { start_ms, pose }
    }

    /// Add or replace the transform of one joint
    pub fn with_joint(mut self, name: impl Into<String>, transform: JointTransform) -> Self {
        self.pose.insert(name.into(), transform);
        self
    }
}
