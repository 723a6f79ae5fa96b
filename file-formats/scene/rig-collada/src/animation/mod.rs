//! Keyframe animations
//!
//! An [`Animation`] is an immutable, shareable list of keyframes sorted by
//! start time. Playback state lives in [`crate::Animator`], never here.

mod interpolation;
mod loader;
mod types;

pub use interpolation::{blend_poses, find_keyframe_index, progression};
pub use loader::load_animation;
pub use types::{JointTransform, KeyFrame};

use crate::error::{ColladaError, Result};
use glam::Mat4;
use std::collections::HashMap;

/// A validated keyframe animation
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize))]
pub struct Animation {
    keyframes: Vec<KeyFrame>,
    length_ms: f64,
}

impl Animation {
    /// Build an animation, checking keyframe order and length
    ///
    /// Fails with [`ColladaError::InvalidAnimation`] when there are no
    /// keyframes, a start time is not finite or not after the previous one,
    /// or `length_ms` is shorter than the last start time.
    pub fn new(keyframes: Vec<KeyFrame>, length_ms: f64) -> Result<Self> {
        let Some(last) = keyframes.last() else {
            return Err(ColladaError::InvalidAnimation(
                "animation has no keyframes".to_string(),
            ));
        };

        if let Some((index, frame)) = keyframes
            .iter()
            .enumerate()
            .find(|(_, frame)| !frame.start_ms.is_finite())
        {
            return Err(ColladaError::InvalidAnimation(format!(
                "keyframe {index} has a non-finite start time {}",
                frame.start_ms
            )));
        }

        if !length_ms.is_finite() || length_ms < last.start_ms {
            return Err(ColladaError::InvalidAnimation(format!(
                "length {length_ms} ms is shorter than the last keyframe start {} ms",
                last.start_ms
            )));
        }

        for (index, pair) in keyframes.windows(2).enumerate() {
            if pair[1].start_ms <= pair[0].start_ms {
                return Err(ColladaError::InvalidAnimation(format!(
                    "keyframe {} starts at {} ms, not after {} ms",
                    index + 1,
                    pair[1].start_ms,
                    pair[0].start_ms
                )));
            }
        }

        Ok(Self {
            keyframes,
            length_ms,
        })
    }

    pub fn keyframes(&self) -> &[KeyFrame] {
        &self.keyframes
    }

    /// Total length in milliseconds
    pub fn length_ms(&self) -> f64 {
        self.length_ms
    }

    /// Keyframes around `time` and the blend factor between them
    ///
    /// Before the first or after the last keyframe both sides are the
    /// boundary keyframe and the factor is 0.
    pub fn bracket(&self, time: f64) -> (&KeyFrame, &KeyFrame, f32) {
        let last = self.keyframes.len() - 1;
        let index = find_keyframe_index(&self.keyframes, time).unwrap_or(0);
        let previous = &self.keyframes[index];

        if index == last || time < previous.start_ms {
            return (previous, previous, 0.0);
        }

        let next = &self.keyframes[index + 1];
        (previous, next, progression(previous.start_ms, next.start_ms, time))
    }

    /// Local joint matrices at `time`
    pub fn sample(&self, time: f64) -> HashMap<String, Mat4> {
        let (previous, next, t) = self.bracket(time);
        blend_poses(previous, next, t)
    }

    /// Names of every joint animated by at least one keyframe
    pub fn joint_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .keyframes
            .iter()
            .flat_map(|frame| frame.pose.keys().map(String::as_str))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}
