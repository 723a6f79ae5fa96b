//! Building an [`Animation`] from the document's matrix channels

use super::types::{JointTransform, KeyFrame};
use super::Animation;
use crate::config::{LoadConfig, UpAxisPolicy};
use crate::document::{RawDocument, UpAxis};
use crate::error::{ColladaError, Result};
use crate::math::{decompose, z_up_correction};
use log::debug;
use std::collections::HashMap;

/// Samples closer together than this (in ms) share a keyframe
const TIME_EPSILON_MS: f64 = 1.0e-3;

/// Load the document's animation
///
/// Channel samples are grouped by time into keyframes. Each sampled matrix is
/// split into position and rotation, times are converted from seconds to
/// milliseconds and the length is the start of the last keyframe. Channels
/// targeting nodes outside the skeleton are skipped.
pub fn load_animation(raw: &RawDocument, config: &LoadConfig) -> Result<Animation> {
    config.validate()?;
    if raw.channels.is_empty() {
        return Err(ColladaError::MissingSection(
            "<library_animations> with matrix channels".to_string(),
        ));
    }

    let joint_table = &raw.skin.joint_names;
    let node_names: HashMap<&str, String> = raw
        .skeleton
        .walk()
        .into_iter()
        .filter_map(|node| {
            node.id
                .as_deref()
                .map(|id| (id, node.joint_name(joint_table)))
        })
        .collect();
    let root_name = raw.skeleton.joint_name(joint_table);
    let correct_root =
        config.up_axis == UpAxisPolicy::ConvertToYUp && raw.up_axis == UpAxis::Z;

    let mut samples: Vec<(f64, &str, JointTransform)> = Vec::new();
    for channel in &raw.channels {
        let Some(joint) = node_names.get(channel.target.as_str()) else {
            debug!("Skipping channel for non-skeleton node '{}'", channel.target);
            continue;
        };

        for (&seconds, matrix) in channel.times.iter().zip(&channel.transforms) {
            let matrix = if correct_root && *joint == root_name {
                z_up_correction() * *matrix
            } else {
                *matrix
            };
            let (position, rotation) = decompose(&matrix);
            samples.push((
                f64::from(seconds) * 1000.0,
                joint.as_str(),
                JointTransform::new(position, rotation),
            ));
        }
    }

    if samples.is_empty() {
        return Err(ColladaError::MissingSection(
            "animation channels targeting skeleton joints".to_string(),
        ));
    }

    // sort_by is stable: a channel listed later overrides an earlier one at the same time
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut keyframes: Vec<KeyFrame> = Vec::new();
    for (time, joint, transform) in samples {
        match keyframes.last_mut() {
            Some(frame) if time - frame.start_ms < TIME_EPSILON_MS => {
                frame.pose.insert(joint.to_string(), transform);
            }
            _ => keyframes.push(KeyFrame::new(time, HashMap::new()).with_joint(joint, transform)),
        }
    }

    let length_ms = keyframes.last().map_or(0.0, |frame| frame.start_ms);
    debug!(
        "Loaded animation: {} keyframes over {} ms",
        keyframes.len(),
        length_ms
    );
    Animation::new(keyframes, length_ms)
}
