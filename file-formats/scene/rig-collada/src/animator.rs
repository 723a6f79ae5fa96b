//! Per-entity animation playback
//!
//! The [`Animator`] is the only mutable part of the runtime. It shares the
//! model and the animation with every other animator and owns just the
//! elapsed time and the skinning matrix buffer.

use crate::animation::Animation;
use crate::builder::ModelSpecification;
use crate::config::{AnimatorConfig, EndPolicy};
use crate::skeleton::Joint;
use glam::Mat4;
use log::{trace, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Playback state of one animated entity
#[derive(Debug, Clone)]
pub struct Animator {
    model: Arc<ModelSpecification>,
    config: AnimatorConfig,
    animation: Option<Arc<Animation>>,
    elapsed_ms: f64,
    joint_transforms: Vec<Mat4>,
}

impl Animator {
    /// Create an idle animator; every skinning matrix starts at identity
    pub fn new(model: Arc<ModelSpecification>, config: AnimatorConfig) -> Self {
        let joint_count = model.joint_count().max(model.root_joint.max_id() as usize + 1);
        Self {
            model,
            config,
            animation: None,
            elapsed_ms: 0.0,
            joint_transforms: vec![Mat4::IDENTITY; joint_count],
        }
    }

    /// Start `animation` from the beginning
    pub fn play_animation(&mut self, animation: Arc<Animation>) {
        self.animation = Some(animation);
        self.elapsed_ms = 0.0;
    }

    /// Stop playback and return to the bind pose
    pub fn stop(&mut self) {
        self.animation = None;
        self.elapsed_ms = 0.0;
        self.joint_transforms.fill(Mat4::IDENTITY);
    }

    /// Advance the clock by `delta_ms`
    ///
    /// Past the end of the animation the configured [`EndPolicy`] applies:
    /// `Wrap` keeps the elapsed time in `[0, length)`, `Clamp` holds it at
    /// the length. Does nothing while idle.
    pub fn update(&mut self, delta_ms: f64) {
        let Some(animation) = &self.animation else {
            return;
        };
        if !delta_ms.is_finite() {
            warn!("Ignoring non-finite animation delta {}", delta_ms);
            return;
        }

        let length = animation.length_ms();
        let elapsed = (self.elapsed_ms + delta_ms).max(0.0);
        self.elapsed_ms = match self.config.end_policy {
            EndPolicy::Wrap if elapsed >= length => {
                if length > 0.0 {
                    elapsed % length
                } else {
                    0.0
                }
            }
            EndPolicy::Wrap => elapsed,
            EndPolicy::Clamp => elapsed.min(length),
        };
        trace!("Animator elapsed: {} ms of {}", self.elapsed_ms, length);
    }

    /// Local joint matrices at the current time, keyed by joint name
    ///
    /// Empty while idle.
    pub fn compute_current_pose(&self) -> HashMap<String, Mat4> {
        self.animation
            .as_ref()
            .map(|animation| animation.sample(self.elapsed_ms))
            .unwrap_or_default()
    }

    /// Write skinning matrices for `joint` and its subtree
    ///
    /// For each joint `world = parent_world * local`, where `local` comes from
    /// `pose` (identity when the pose does not mention the joint), and the
    /// stored matrix is `world * inverse_bind`.
    pub fn apply_pose_to_joints(
        &mut self,
        joint: &Joint,
        parent_world: Mat4,
        pose: &HashMap<String, Mat4>,
    ) {
        let mut stack = vec![(joint, parent_world)];
        while let Some((joint, parent)) = stack.pop() {
            let local = pose.get(&joint.name).copied().unwrap_or(Mat4::IDENTITY);
            let world = parent * local;

            match self.joint_transforms.get_mut(joint.id as usize) {
                Some(slot) => *slot = world * joint.inverse_bind_transform(),
                None => warn!("Joint '{}' id {} has no output slot", joint.name, joint.id),
            }
            for child in &joint.children {
                stack.push((child, world));
            }
        }
    }

    /// Advance by `delta_ms` and refresh the skinning matrices
    pub fn tick(&mut self, delta_ms: f64) {
        if self.animation.is_none() {
            return;
        }
        self.update(delta_ms);
        let pose = self.compute_current_pose();
        let model = Arc::clone(&self.model);
        self.apply_pose_to_joints(&model.root_joint, Mat4::IDENTITY, &pose);
    }

    /// Skinning matrices indexed by joint id
    pub fn joint_transforms(&self) -> &[Mat4] {
        &self.joint_transforms
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    pub fn is_playing(&self) -> bool {
        self.animation.is_some()
    }

    pub fn animation(&self) -> Option<&Arc<Animation>> {
        self.animation.as_ref()
    }

    pub fn model(&self) -> &Arc<ModelSpecification> {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{JointTransform, KeyFrame};
    use glam::{Quat, Vec3};

    /// Root at the origin with a child one unit up
    fn model() -> Arc<ModelSpecification> {
        let mut root = Joint::new(0, "root", Mat4::IDENTITY);
        root.add_child(Joint::new(1, "child", Mat4::from_translation(Vec3::Y)));
        root.calculate_inverse_bind_transforms(Mat4::IDENTITY).unwrap();

        Arc::new(ModelSpecification {
            corners: Vec::new(),
            positions: Vec::new(),
            normals: Vec::new(),
            texcoords: Vec::new(),
            colors: None,
            joint_names: vec!["root".to_string(), "child".to_string()],
            vertex_joint_ids: Vec::new(),
            vertex_weight_indices: Vec::new(),
            weights: Vec::new(),
            influences: Vec::new(),
            root_joint: root,
            max_influences: 3,
        })
    }

    fn child_at(y: f32) -> JointTransform {
        JointTransform::new(Vec3::new(0.0, y, 0.0), Quat::IDENTITY)
    }

    /// Keyframes at 0 ms (child at y=1) and 1000 ms (child at y=3)
    fn animation(length_ms: f64) -> Arc<Animation> {
        let keyframes = vec![
            KeyFrame::default()
                .with_joint("root", JointTransform::default())
                .with_joint("child", child_at(1.0)),
            KeyFrame::new(1000.0, HashMap::new())
                .with_joint("root", JointTransform::default())
                .with_joint("child", child_at(3.0)),
        ];
        Arc::new(Animation::new(keyframes, length_ms).unwrap())
    }

    fn offset(animator: &Animator, id: usize) -> Vec3 {
        animator.joint_transforms()[id].transform_point3(Vec3::ZERO)
    }

    #[test]
    fn test_idle_animator_outputs_identity() {
        let mut animator = Animator::new(model(), AnimatorConfig::new(EndPolicy::Wrap));
        assert!(!animator.is_playing());
        animator.tick(100.0);
        assert_eq!(animator.elapsed_ms(), 0.0);
        assert!(animator.compute_current_pose().is_empty());
        assert!(animator.joint_transforms().iter().all(|m| *m == Mat4::IDENTITY));
    }

    #[test]
    fn test_bind_pose_at_start() {
        let mut animator = Animator::new(model(), AnimatorConfig::new(EndPolicy::Wrap));
        animator.play_animation(animation(1500.0));
        animator.tick(0.0);

        for matrix in animator.joint_transforms() {
            assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-6));
        }
    }

    #[test]
    fn test_halfway_blend() {
        let mut animator = Animator::new(model(), AnimatorConfig::new(EndPolicy::Wrap));
        animator.play_animation(animation(1500.0));
        animator.tick(500.0);

        // Child sits at y=2, one unit above its bind position
        assert!((offset(&animator, 1) - Vec3::Y).length() < 1e-5);
        assert!(offset(&animator, 0).length() < 1e-6);
    }

    #[test]
    fn test_wrap_at_length_returns_to_first_pose() {
        let mut animator = Animator::new(model(), AnimatorConfig::new(EndPolicy::Wrap));
        animator.play_animation(animation(1500.0));
        animator.tick(1000.0);
        assert!((offset(&animator, 1) - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);

        animator.tick(500.0);
        assert_eq!(animator.elapsed_ms(), 0.0);
        assert!(offset(&animator, 1).length() < 1e-5);

        animator.tick(1750.0);
        assert!((animator.elapsed_ms() - 250.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_holds_last_pose() {
        let mut animator = Animator::new(model(), AnimatorConfig::new(EndPolicy::Clamp));
        animator.play_animation(animation(1500.0));
        animator.tick(4000.0);

        assert_eq!(animator.elapsed_ms(), 1500.0);
        assert!((offset(&animator, 1) - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_pose_miss_uses_identity() {
        let mut animator = Animator::new(model(), AnimatorConfig::new(EndPolicy::Wrap));
        let keyframes = vec![KeyFrame::default().with_joint("root", JointTransform::default())];
        animator.play_animation(Arc::new(Animation::new(keyframes, 100.0).unwrap()));
        animator.tick(10.0);

        // Unposed child collapses onto its parent: world = identity
        let expected = Mat4::from_translation(-Vec3::Y);
        assert!(animator.joint_transforms()[1].abs_diff_eq(expected, 1e-6));
    }

    #[test]
    fn test_play_resets_elapsed() {
        let mut animator = Animator::new(model(), AnimatorConfig::new(EndPolicy::Wrap));
        animator.play_animation(animation(1500.0));
        animator.update(300.0);
        assert_eq!(animator.elapsed_ms(), 300.0);

        animator.play_animation(animation(1500.0));
        assert_eq!(animator.elapsed_ms(), 0.0);

        animator.stop();
        assert!(!animator.is_playing());
    }

    #[test]
    fn test_animators_share_model() {
        let model = model();
        let clip = animation(1500.0);
        let mut first = Animator::new(Arc::clone(&model), AnimatorConfig::new(EndPolicy::Wrap));
        let mut second = Animator::new(Arc::clone(&model), AnimatorConfig::new(EndPolicy::Wrap));
        first.play_animation(Arc::clone(&clip));
        second.play_animation(clip);

        first.tick(500.0);
        second.tick(0.0);
        assert!((offset(&first, 1) - Vec3::Y).length() < 1e-5);
        assert!(offset(&second, 1).length() < 1e-5);
    }
}
