//! `<library_geometries>` decoding

use super::element::{Element, strip_ref};
use super::{RawSource, parse_source};
use crate::error::{ColladaError, Result};
use crate::math::parse_indices;
use log::{debug, warn};
use std::collections::HashMap;

/// A shared `<input>` reference: semantic, source id and index offset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInput {
    pub semantic: String,
    pub source: String,
    pub offset: usize,
    pub set: Option<usize>,
}

impl RawInput {
    pub(crate) fn parse(element: &Element) -> Result<Self> {
        let semantic = element
            .attr("semantic")
            .ok_or_else(|| ColladaError::ParseError("<input> without semantic".to_string()))?
            .to_string();
        let source = strip_ref(element.attr("source").unwrap_or_default()).to_string();
        let offset = match element.attr("offset") {
            Some(text) => first_index(text, "input offset")?,
            None => 0,
        };
        let set = match element.attr("set") {
            Some(text) => Some(first_index(text, "input set")?),
            None => None,
        };
        Ok(Self {
            semantic,
            source,
            offset,
            set,
        })
    }
}

fn first_index(text: &str, context: &str) -> Result<usize> {
    parse_indices(text, context)?
        .first()
        .copied()
        .ok_or_else(|| ColladaError::ParseError(format!("empty {context}")))
}

/// Attribute indices of one triangle corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerIndices {
    pub position: usize,
    pub normal: usize,
    pub texcoord: usize,
    pub color: Option<usize>,
}

/// Raw mesh data of the skinned geometry
#[derive(Debug, Clone, Default)]
pub struct RawGeometry {
    pub id: String,
    /// Every `<source>` of the mesh, by id
    pub sources: HashMap<String, RawSource>,
    /// Id of the `<vertices>` block
    pub vertices_id: String,
    /// Inputs of the `<vertices>` block (POSITION lives here)
    pub vertex_inputs: Vec<RawInput>,
    /// Inputs shared by all triangle blocks
    pub face_inputs: Vec<RawInput>,
    /// Decoded corners, three per triangle, in document order
    pub corners: Vec<CornerIndices>,
}

impl RawGeometry {
    /// Source id behind the first face input with `semantic`
    pub fn face_source(&self, semantic: &str) -> Option<&str> {
        self.face_inputs
            .iter()
            .find(|input| input.semantic == semantic)
            .map(|input| input.source.as_str())
    }

    /// Source id behind the first `<vertices>` input with `semantic`
    pub fn vertex_source(&self, semantic: &str) -> Option<&str> {
        self.vertex_inputs
            .iter()
            .find(|input| input.semantic == semantic)
            .map(|input| input.source.as_str())
    }
}

/// Locate the geometry the skin deforms and decode its mesh
pub(crate) fn parse_geometry(library: &Element, geometry_id: &str) -> Result<RawGeometry> {
    let geometry = library
        .children_named("geometry")
        .find(|g| g.attr("id") == Some(geometry_id))
        .ok_or_else(|| {
            ColladaError::MissingSection(format!("<geometry id=\"{geometry_id}\">"))
        })?;
    let mesh = geometry.require_child("mesh")?;

    let mut sources = HashMap::new();
    for element in mesh.children_named("source") {
        let source = parse_source(element)?;
        sources.insert(source.id.clone(), source);
    }

    let vertices = mesh.require_child("vertices")?;
    let vertex_inputs = vertices
        .children_named("input")
        .map(RawInput::parse)
        .collect::<Result<Vec<_>>>()?;
    if !vertex_inputs.iter().any(|i| i.semantic == "POSITION") {
        return Err(ColladaError::MissingSection(
            "POSITION input in <vertices>".to_string(),
        ));
    }

    let mut face_inputs: Option<Vec<RawInput>> = None;
    let mut corners = Vec::new();
    for block in mesh
        .children
        .iter()
        .filter(|c| c.name == "triangles" || c.name == "polylist")
    {
        let (inputs, block_corners) = decode_faces(block)?;
        match &face_inputs {
            None => face_inputs = Some(inputs),
            Some(existing) if *existing != inputs => {
                return Err(ColladaError::ParseError(format!(
                    "geometry '{geometry_id}' mixes triangle blocks with different inputs"
                )));
            }
            Some(_) => {}
        }
        corners.extend(block_corners);
    }

    let face_inputs = face_inputs.ok_or_else(|| {
        ColladaError::MissingSection(format!("<triangles> in geometry '{geometry_id}'"))
    })?;

    Ok(RawGeometry {
        id: geometry_id.to_string(),
        sources,
        vertices_id: vertices.attr("id").unwrap_or_default().to_string(),
        vertex_inputs,
        face_inputs,
        corners,
    })
}

/// Decode one `<triangles>`/`<polylist>` block into corner tuples
///
/// The `<p>` list interleaves one index per input for every corner; the
/// stride is one past the largest declared offset.
fn decode_faces(block: &Element) -> Result<(Vec<RawInput>, Vec<CornerIndices>)> {
    let inputs = block
        .children_named("input")
        .map(RawInput::parse)
        .collect::<Result<Vec<_>>>()?;
    let stride = inputs.iter().map(|i| i.offset).max().map_or(0, |m| m + 1);

    let offset_of = |semantic: &str| {
        inputs
            .iter()
            .find(|i| i.semantic == semantic)
            .map(|i| i.offset)
    };
    let required = |semantic: &str| {
        offset_of(semantic).ok_or_else(|| {
            ColladaError::MissingSection(format!("{semantic} input in <{}>", block.name))
        })
    };
    let position = required("VERTEX")?;
    let normal = required("NORMAL")?;
    let texcoord = required("TEXCOORD")?;
    let color = offset_of("COLOR");

    if block.name == "polylist"
        && let Some(vcount) = block.child("vcount")
        && parse_indices(&vcount.text, "polylist vcount")?
            .iter()
            .any(|&n| n != 3)
    {
        return Err(ColladaError::ParseError(
            "polylist contains non-triangle polygons".to_string(),
        ));
    }

    let indices = parse_indices(&block.require_child("p")?.text, "<p> face indices")?;
    if indices.len() % stride != 0 {
        return Err(ColladaError::ParseError(format!(
            "{} face indices is not a multiple of stride {stride}",
            indices.len()
        )));
    }

    let corners: Vec<CornerIndices> = indices
        .chunks_exact(stride)
        .map(|corner| CornerIndices {
            position: corner[position],
            normal: corner[normal],
            texcoord: corner[texcoord],
            color: color.map(|offset| corner[offset]),
        })
        .collect();

    if corners.len() % 3 != 0 {
        return Err(ColladaError::ParseError(format!(
            "{} corners do not form whole triangles",
            corners.len()
        )));
    }
    if let Some(count) = block.attr("count") {
        let declared = first_index(count, "triangle count")?;
        if declared * 3 != corners.len() {
            warn!(
                "<{}> declares {} triangles but holds {}",
                block.name,
                declared,
                corners.len() / 3
            );
        }
    }
    debug!("Decoded {} triangles (stride {})", corners.len() / 3, stride);

    Ok((inputs, corners))
}
