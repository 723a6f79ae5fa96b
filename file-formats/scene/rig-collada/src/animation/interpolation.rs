//! Keyframe lookup and pose blending

use super::types::KeyFrame;
use glam::Mat4;
use std::collections::HashMap;

/// Find the keyframe whose interval contains `time`
///
/// Returns the largest index whose start is `<= time`. Times before the
/// first keyframe map to index 0; times at or past the last keyframe map to
/// the last index.
pub fn find_keyframe_index(keyframes: &[KeyFrame], time: f64) -> Option<usize> {
    if keyframes.is_empty() {
        return None;
    }

    let last_index = keyframes.len() - 1;
    if time >= keyframes[last_index].start_ms {
        return Some(last_index);
    }

    let mut low = 0;
    let mut high = last_index;

    while low < high {
        let mid = (low + high).div_ceil(2);
        if keyframes[mid].start_ms <= time {
            low = mid;
        } else {
            high = mid - 1;
        }
    }

    Some(low)
}

/// Fraction of the way from `start` to `end` at `time`, clamped to `[0, 1]`
pub fn progression(start: f64, end: f64, time: f64) -> f32 {
    let span = end - start;
    if span <= 0.0 {
        return 0.0;
    }
    ((time - start) / span).clamp(0.0, 1.0) as f32
}

/// Blend two keyframe poses into local joint matrices
///
/// A joint present in only one of the keyframes keeps that keyframe's
/// transform.
pub fn blend_poses(previous: &KeyFrame, next: &KeyFrame, t: f32) -> HashMap<String, Mat4> {
    let mut pose: HashMap<String, Mat4> = HashMap::with_capacity(previous.pose.len());

    for (name, from) in &previous.pose {
        let transform = match next.pose.get(name) {
            Some(to) => from.interpolate(to, t),
            None => *from,
        };
        pose.insert(name.clone(), transform.to_matrix());
    }
    for (name, to) in &next.pose {
        pose.entry(name.clone()).or_insert_with(|| to.to_matrix());
    }

    pose
}
