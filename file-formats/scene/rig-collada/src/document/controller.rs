//! `<library_controllers>` skin decoding

use super::element::{Element, strip_ref};
use super::geometry::RawInput;
use super::{RawSource, parse_source};
use crate::error::{ColladaError, Result};
use crate::math::{mat4_from_row_major, mat4s_from_row_major, parse_floats, parse_indices};
use glam::Mat4;
use log::{debug, warn};
use std::collections::HashMap;

/// One raw joint influence: indices into the joint table and weight array
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawInfluence {
    pub joint: usize,
    pub weight: usize,
}

/// Raw skin controller data
#[derive(Debug, Clone, Default)]
pub struct RawSkin {
    pub id: String,
    /// Id of the geometry this skin deforms
    pub geometry: String,
    pub bind_shape_matrix: Mat4,
    /// Joint table: the index of a name is the joint id
    pub joint_names: Vec<String>,
    /// Inverse bind matrices as authored (informational)
    pub inverse_bind_matrices: Vec<Mat4>,
    /// Weight value array referenced by [`RawInfluence::weight`]
    pub weights: Vec<f32>,
    /// Influences per position vertex, in document order
    pub vertex_influences: Vec<Vec<RawInfluence>>,
}

/// Decode the first skin controller of the library
pub(crate) fn parse_skin(library: &Element) -> Result<RawSkin> {
    let (controller, skin) = library
        .children_named("controller")
        .find_map(|c| c.child("skin").map(|s| (c, s)))
        .ok_or_else(|| ColladaError::MissingSection("<controller> with <skin>".to_string()))?;

    let id = controller.attr("id").unwrap_or_default().to_string();
    let geometry = strip_ref(
        skin.attr("source")
            .ok_or_else(|| ColladaError::MissingSection("source of <skin>".to_string()))?,
    )
    .to_string();

    let bind_shape_matrix = match skin.child("bind_shape_matrix") {
        Some(element) => {
            mat4_from_row_major(&parse_floats(&element.text, "bind_shape_matrix")?, "bind_shape_matrix")?
        }
        None => Mat4::IDENTITY,
    };

    let mut sources: HashMap<String, RawSource> = HashMap::new();
    for element in skin.children_named("source") {
        let source = parse_source(element)?;
        sources.insert(source.id.clone(), source);
    }
    let lookup = |input: &RawInput| {
        sources.get(&input.source).ok_or_else(|| {
            ColladaError::InvalidReference(format!(
                "{} input references unknown source '{}'",
                input.semantic, input.source
            ))
        })
    };

    let inverse_bind_matrices = match skin.child("joints") {
        Some(joints) => {
            let inputs = parse_inputs(joints)?;
            match inputs.iter().find(|i| i.semantic == "INV_BIND_MATRIX") {
                Some(input) => mat4s_from_row_major(&lookup(input)?.floats, "INV_BIND_MATRIX")?,
                None => Vec::new(),
            }
        }
        None => Vec::new(),
    };

    let vertex_weights = skin.require_child("vertex_weights")?;
    let inputs = parse_inputs(vertex_weights)?;
    let joint_input = inputs
        .iter()
        .find(|i| i.semantic == "JOINT")
        .ok_or_else(|| ColladaError::MissingSection("JOINT input in <vertex_weights>".to_string()))?;
    let weight_input = inputs
        .iter()
        .find(|i| i.semantic == "WEIGHT")
        .ok_or_else(|| {
            ColladaError::MissingSection("WEIGHT input in <vertex_weights>".to_string())
        })?;

    let joint_names = lookup(joint_input)?.names.clone();
    if joint_names.is_empty() {
        return Err(ColladaError::MissingSection(format!(
            "joint names in source '{}'",
            joint_input.source
        )));
    }
    let weights = lookup(weight_input)?.floats.clone();

    let vcount = parse_indices(&vertex_weights.require_child("vcount")?.text, "vcount")?;
    let v = parse_indices(&vertex_weights.require_child("v")?.text, "v")?;
    let stride = inputs.iter().map(|i| i.offset).max().map_or(2, |m| m + 1);
    let vertex_influences = decode_influences(
        &vcount,
        &v,
        joint_input.offset,
        weight_input.offset,
        stride,
    )?;

    debug!(
        "Skin '{}': {} weights, {} inverse bind matrices",
        id,
        weights.len(),
        inverse_bind_matrices.len()
    );

    Ok(RawSkin {
        id,
        geometry,
        bind_shape_matrix,
        joint_names,
        inverse_bind_matrices,
        weights,
        vertex_influences,
    })
}

fn parse_inputs(element: &Element) -> Result<Vec<RawInput>> {
    element.children_named("input").map(RawInput::parse).collect()
}

/// Expand the `vcount`/`v` run-length encoding
///
/// Vertex `i` owns `vcount[i]` influences; each influence takes `stride`
/// consecutive entries of `v`, read at a running cursor.
pub fn decode_influences(
    vcount: &[usize],
    v: &[usize],
    joint_offset: usize,
    weight_offset: usize,
    stride: usize,
) -> Result<Vec<Vec<RawInfluence>>> {
    let mut cursor: usize = 0;
    let mut influences = Vec::with_capacity(vcount.len());

    for (vertex, &count) in vcount.iter().enumerate() {
        let end = count
            .checked_mul(stride)
            .and_then(|needed| cursor.checked_add(needed))
            .ok_or_else(|| {
                ColladaError::ParseError(format!(
                    "vcount {count} of vertex {vertex} overflows the <v> index range"
                ))
            })?;
        let Some(entries) = v.get(cursor..end) else {
            return Err(ColladaError::ParseError(format!(
                "<v> ends inside the influences of vertex {vertex} (needs {end} entries, has {})",
                v.len()
            )));
        };
        influences.push(
            entries
                .chunks_exact(stride)
                .map(|pair| RawInfluence {
                    joint: pair[joint_offset],
                    weight: pair[weight_offset],
                })
                .collect(),
        );
        cursor = end;
    }

    if cursor != v.len() {
        warn!(
            "<v> has {} trailing entries after {} vertices",
            v.len() - cursor,
            vcount.len()
        );
    }

    Ok(influences)
}
