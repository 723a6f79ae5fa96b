//! Skin weight normalization
//!
//! Every vertex ends up with exactly `max_influences` (joint id, weight)
//! pairs so that the joint id and weight buffers have a fixed width.

use crate::error::{ColladaError, Result};

/// Fixed-width joint influences of one vertex
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexInfluences {
    pub joint_ids: Vec<u32>,
    pub weights: Vec<f32>,
}

impl VertexInfluences {
    /// Number of slots, padding included
    pub fn len(&self) -> usize {
        self.joint_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joint_ids.is_empty()
    }

    pub fn weight_sum(&self) -> f32 {
        self.weights.iter().sum()
    }

    /// (joint id, weight) pairs, padding included
    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.joint_ids.iter().copied().zip(self.weights.iter().copied())
    }
}

/// Fix one vertex's influence list to `max_influences` entries
///
/// `joint_ids[i]` pairs with `weight_values[weight_indices[i]]`.
/// - More than `max_influences`: the heaviest are kept (earlier entries win
///   ties) and rescaled to sum to 1. A kept set of all zero weights stays
///   zero.
/// - Fewer: every influence is kept as is and the rest is padded with
///   `(0, 0.0)`.
/// - Exactly `max_influences`: passed through unchanged.
pub fn normalize(
    joint_ids: &[u32],
    weight_indices: &[usize],
    weight_values: &[f32],
    max_influences: usize,
) -> Result<VertexInfluences> {
    if joint_ids.len() != weight_indices.len() {
        return Err(ColladaError::ParseError(format!(
            "{} joint ids paired with {} weight indices",
            joint_ids.len(),
            weight_indices.len()
        )));
    }

    let mut influences = joint_ids
        .iter()
        .zip(weight_indices)
        .map(|(&joint, &index)| {
            weight_values
                .get(index)
                .map(|&weight| (joint, weight))
                .ok_or_else(|| {
                    ColladaError::InvalidReference(format!(
                        "weight index {index} out of range ({} weights)",
                        weight_values.len()
                    ))
                })
        })
        .collect::<Result<Vec<(u32, f32)>>>()?;

    if influences.len() > max_influences {
        // sort_by is stable, so equal weights keep document order
        influences.sort_by(|a, b| b.1.total_cmp(&a.1));
        influences.truncate(max_influences);

        let total: f32 = influences.iter().map(|(_, weight)| weight).sum();
        if total > 0.0 {
            for (_, weight) in &mut influences {
                *weight /= total;
            }
        }
    }

    influences.resize(max_influences, (0, 0.0));
    let (joint_ids, weights) = influences.into_iter().unzip();
    Ok(VertexInfluences { joint_ids, weights })
}
