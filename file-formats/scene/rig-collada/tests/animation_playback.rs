//! Integration tests for animation loading, playback and skinning

mod common;

use common::{fixture, near};
use glam::{Mat4, Vec3};
use pretty_assertions::assert_eq;
use rig_collada::document::{DocumentParser, RawDocument};
use rig_collada::skinning::{Skinner, SkinningOptions};
use rig_collada::{
    Animation, Animator, AnimatorConfig, EndPolicy, LoadConfig, ModelSpecification,
    load_animation,
};
use std::sync::Arc;

fn parse() -> RawDocument {
    DocumentParser::new(&LoadConfig::default())
        .parse(fixture("two_bone.dae"))
        .unwrap()
}

fn setup() -> (Arc<ModelSpecification>, Arc<Animation>) {
    let config = LoadConfig::default();
    let raw = parse();
    let animation = load_animation(&raw, &config).unwrap();
    let model = rig_collada::builder::build(raw, &config).unwrap();
    (Arc::new(model), Arc::new(animation))
}

fn skinned_positions(model: &ModelSpecification, animator: &Animator) -> Vec<Vec3> {
    Skinner::new(animator.joint_transforms(), SkinningOptions::default())
        .skin_model(model)
        .positions
}

#[test]
fn test_animation_from_document() {
    let (_, animation) = setup();

    assert_eq!(animation.keyframes().len(), 2);
    assert_eq!(animation.length_ms(), 1000.0);
    assert_eq!(animation.joint_names(), vec!["Arm", "Root"]);

    let last = &animation.keyframes()[1];
    assert!(near(last.pose["Arm"].position, Vec3::Y));
}

#[test]
fn test_rest_pose_at_start() {
    let (model, animation) = setup();
    let mut animator = Animator::new(Arc::clone(&model), AnimatorConfig::new(EndPolicy::Wrap));
    animator.play_animation(animation);
    animator.tick(0.0);

    for matrix in animator.joint_transforms() {
        assert!(matrix.abs_diff_eq(Mat4::IDENTITY, 1e-5));
    }
    let positions = skinned_positions(&model, &animator);
    for (skinned, bind) in positions.iter().zip(&model.positions) {
        assert!(near(*skinned, *bind));
    }
}

#[test]
fn test_halfway_rotation() {
    let (model, animation) = setup();
    let mut animator = Animator::new(Arc::clone(&model), AnimatorConfig::new(EndPolicy::Wrap));
    animator.play_animation(animation);
    animator.tick(500.0);

    // Vertex 2 hangs one unit right of the arm joint and swings 45 degrees
    let positions = skinned_positions(&model, &animator);
    assert!(near(positions[2], Vec3::new(0.0, 1.0 + 2.0_f32.sqrt(), 0.0)));
    // Root-only vertices stay put
    assert!(near(positions[0], Vec3::ZERO));
    assert!(near(positions[1], Vec3::X));
}

#[test]
fn test_clamp_holds_final_pose() {
    let (model, animation) = setup();
    let mut animator = Animator::new(Arc::clone(&model), AnimatorConfig::new(EndPolicy::Clamp));
    animator.play_animation(animation);
    animator.tick(5000.0);

    assert_eq!(animator.elapsed_ms(), 1000.0);
    let positions = skinned_positions(&model, &animator);
    assert!(near(positions[2], Vec3::new(-1.0, 2.0, 0.0)));
    // Half root, half arm
    assert!(near(positions[3], Vec3::new(-0.5, 1.5, 0.0)));
}

#[test]
fn test_wrap_returns_to_first_keyframe() {
    let (model, animation) = setup();
    let mut animator = Animator::new(Arc::clone(&model), AnimatorConfig::new(EndPolicy::Wrap));
    animator.play_animation(animation);
    animator.tick(600.0);
    animator.tick(400.0);

    assert_eq!(animator.elapsed_ms(), 0.0);
    let positions = skinned_positions(&model, &animator);
    assert!(near(positions[2], model.positions[2]));
}

#[test]
fn test_many_entities_share_assets() {
    let (model, animation) = setup();
    let mut animators: Vec<Animator> = (0..4)
        .map(|_| Animator::new(Arc::clone(&model), AnimatorConfig::new(EndPolicy::Wrap)))
        .collect();

    for (index, animator) in animators.iter_mut().enumerate() {
        animator.play_animation(Arc::clone(&animation));
        animator.tick(index as f64 * 250.0);
    }

    let elapsed: Vec<f64> = animators.iter().map(Animator::elapsed_ms).collect();
    assert_eq!(elapsed, vec![0.0, 250.0, 500.0, 750.0]);
    assert!(!animators[0].joint_transforms()[1].abs_diff_eq(animators[2].joint_transforms()[1], 1e-3));
    assert_eq!(Arc::strong_count(&model), 5);
}
