//! Model building: turns a [`RawDocument`] into a [`ModelSpecification`]
//!
//! The builder resolves the geometry's source references, normalizes every
//! vertex's skin influences, assembles the joint tree and computes its
//! inverse bind transforms. The result is immutable and meant to be shared
//! between animators behind an `Arc`.

use crate::config::{LoadConfig, UpAxisPolicy};
use crate::document::{CornerIndices, DocumentParser, RawDocument, RawGeometry, RawNode, RawSource, UpAxis};
use crate::error::{ColladaError, Result};
use crate::math::z_up_correction;
use crate::skeleton::Joint;
use crate::skin::{VertexInfluences, normalize};
use glam::{Mat4, Vec2, Vec3};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Floats per vertex in [`ModelSpecification::vertex_buffer`]:
/// position (3), normal (3), texcoord (2), color (3)
pub const VERTEX_STRIDE: usize = 11;

/// Color used for corners without a color attribute
pub const DEFAULT_COLOR: Vec3 = Vec3::ONE;

/// A skinned model ready for upload
#[derive(Debug, Clone)]
pub struct ModelSpecification {
    /// Triangle corners, three per triangle, each indexing the attribute arrays
    pub corners: Vec<CornerIndices>,
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub texcoords: Vec<Vec2>,
    pub colors: Option<Vec<Vec3>>,
    /// Joint name table; the index of a name is its joint id
    pub joint_names: Vec<String>,
    /// Joint ids influencing each position, as authored
    pub vertex_joint_ids: Vec<Vec<u32>>,
    /// Indices into `weights`, in lockstep with `vertex_joint_ids`
    pub vertex_weight_indices: Vec<Vec<usize>>,
    /// Weight values shared by all vertices
    pub weights: Vec<f32>,
    /// Fixed-width influences of each position
    pub influences: Vec<VertexInfluences>,
    pub root_joint: Joint,
    pub max_influences: usize,
}

impl ModelSpecification {
    pub fn triangle_count(&self) -> usize {
        self.corners.len() / 3
    }

    pub fn joint_count(&self) -> usize {
        self.joint_names.len()
    }

    /// Interleaved vertex data, one entry per triangle corner
    pub fn vertex_buffer(&self) -> Vec<f32> {
        let mut buffer = Vec::with_capacity(self.corners.len() * VERTEX_STRIDE);
        for corner in &self.corners {
            let color = match (&self.colors, corner.color) {
                (Some(colors), Some(index)) => colors[index],
                _ => DEFAULT_COLOR,
            };
            buffer.extend_from_slice(&self.positions[corner.position].to_array());
            buffer.extend_from_slice(&self.normals[corner.normal].to_array());
            buffer.extend_from_slice(&self.texcoords[corner.texcoord].to_array());
            buffer.extend_from_slice(&color.to_array());
        }
        buffer
    }

    /// Joint ids per triangle corner, `max_influences` wide
    pub fn joint_id_buffer(&self) -> Vec<u32> {
        self.corners
            .iter()
            .flat_map(|corner| self.influences[corner.position].joint_ids.iter().copied())
            .collect()
    }

    /// Joint weights per triangle corner, in lockstep with
    /// [`Self::joint_id_buffer`]
    pub fn joint_weight_buffer(&self) -> Vec<f32> {
        self.corners
            .iter()
            .flat_map(|corner| self.influences[corner.position].weights.iter().copied())
            .collect()
    }
}

/// Parse the document at `path` and build its model
pub fn load_model<P: AsRef<Path>>(path: P, config: &LoadConfig) -> Result<ModelSpecification> {
    config.validate()?;
    let raw = DocumentParser::new(config).parse(path)?;
    build(raw, config)
}

/// Build a model from a parsed document
pub fn build(raw: RawDocument, config: &LoadConfig) -> Result<ModelSpecification> {
    config.validate()?;

    let correction = match (config.up_axis, raw.up_axis) {
        (UpAxisPolicy::ConvertToYUp, UpAxis::Z) => {
            debug!("Converting Z-up document to Y-up");
            Some(z_up_correction())
        }
        (UpAxisPolicy::ConvertToYUp, UpAxis::X) => {
            warn!("X-up documents are not converted");
            None
        }
        _ => None,
    };

    let geometry = &raw.geometry;
    let position_id = geometry.vertex_source("POSITION").ok_or_else(|| {
        ColladaError::MissingSection("POSITION input in <vertices>".to_string())
    })?;
    let mut positions = vec3s(source(geometry, position_id, "POSITION")?)?;
    let mut normals = vec3s(source(geometry, face_source(geometry, "NORMAL")?, "NORMAL")?)?;
    let texcoords = vec2s(source(geometry, face_source(geometry, "TEXCOORD")?, "TEXCOORD")?)?;
    let colors = match geometry.face_source("COLOR") {
        Some(id) => Some(vec3s(source(geometry, id, "COLOR")?)?),
        None => None,
    };

    if let Some(correction) = correction {
        for position in &mut positions {
            *position = correction.transform_point3(*position);
        }
        for normal in &mut normals {
            *normal = correction.transform_vector3(*normal);
        }
    }

    check_corners(
        &geometry.corners,
        positions.len(),
        normals.len(),
        texcoords.len(),
        colors.as_ref().map(Vec::len),
    )?;

    let skin = &raw.skin;
    if skin.bind_shape_matrix != Mat4::IDENTITY {
        debug!("Skin '{}' has a non-identity bind shape matrix; it is not applied", skin.id);
    }
    if skin.vertex_influences.len() < positions.len() {
        return Err(ColladaError::InvalidReference(format!(
            "skin '{}' has influences for {} vertices, geometry has {}",
            skin.id,
            skin.vertex_influences.len(),
            positions.len()
        )));
    }
    if skin.vertex_influences.len() > positions.len() {
        warn!(
            "Skin '{}' has influences for {} vertices, geometry has {}",
            skin.id,
            skin.vertex_influences.len(),
            positions.len()
        );
    }

    let mut vertex_joint_ids = Vec::with_capacity(positions.len());
    let mut vertex_weight_indices = Vec::with_capacity(positions.len());
    let mut influences = Vec::with_capacity(positions.len());
    for (vertex, raw_influences) in skin.vertex_influences.iter().take(positions.len()).enumerate() {
        let mut joint_ids = Vec::with_capacity(raw_influences.len());
        for influence in raw_influences {
            if influence.joint >= skin.joint_names.len() {
                return Err(ColladaError::InvalidReference(format!(
                    "vertex {vertex} references joint {} of {}",
                    influence.joint,
                    skin.joint_names.len()
                )));
            }
            joint_ids.push(influence.joint as u32);
        }
        let weight_indices: Vec<usize> = raw_influences.iter().map(|i| i.weight).collect();

        influences.push(normalize(
            &joint_ids,
            &weight_indices,
            &skin.weights,
            config.max_influences,
        )?);
        vertex_joint_ids.push(joint_ids);
        vertex_weight_indices.push(weight_indices);
    }

    let mut joint_names = skin.joint_names.clone();
    let mut root_joint = build_skeleton(&raw.skeleton, &mut joint_names)?;
    if let Some(correction) = correction {
        root_joint.local_bind_transform = correction * root_joint.local_bind_transform;
    }
    root_joint.calculate_inverse_bind_transforms(Mat4::IDENTITY)?;

    debug!(
        "Built model: {} positions, {} triangles, {} joints ({} in hierarchy)",
        positions.len(),
        geometry.corners.len() / 3,
        joint_names.len(),
        root_joint.joint_count()
    );

    Ok(ModelSpecification {
        corners: raw.geometry.corners,
        positions,
        normals,
        texcoords,
        colors,
        joint_names,
        vertex_joint_ids,
        vertex_weight_indices,
        weights: raw.skin.weights,
        influences,
        root_joint,
        max_influences: config.max_influences,
    })
}

/// Source behind a per-corner input; corners index it with their own offset
fn face_source<'a>(geometry: &'a RawGeometry, semantic: &str) -> Result<&'a str> {
    geometry
        .face_source(semantic)
        .ok_or_else(|| ColladaError::MissingSection(format!("{semantic} input in <triangles>")))
}

fn source<'a>(geometry: &'a RawGeometry, id: &str, semantic: &str) -> Result<&'a RawSource> {
    geometry.sources.get(id).ok_or_else(|| {
        ColladaError::InvalidReference(format!(
            "{semantic} input references unknown source '{id}'"
        ))
    })
}

/// Components of each element of `source`, honoring a wider accessor stride
fn elements(source: &RawSource, width: usize) -> Result<std::slice::ChunksExact<'_, f32>> {
    let stride = source.stride.max(width);
    if source.floats.len() % stride != 0 {
        return Err(ColladaError::ParseError(format!(
            "source '{}': {} values is not a multiple of stride {stride}",
            source.id,
            source.floats.len()
        )));
    }
    Ok(source.floats.chunks_exact(stride))
}

fn vec3s(source: &RawSource) -> Result<Vec<Vec3>> {
    Ok(elements(source, 3)?
        .map(|c| Vec3::new(c[0], c[1], c[2]))
        .collect())
}

fn vec2s(source: &RawSource) -> Result<Vec<Vec2>> {
    Ok(elements(source, 2)?.map(|c| Vec2::new(c[0], c[1])).collect())
}

fn check_corners(
    corners: &[CornerIndices],
    positions: usize,
    normals: usize,
    texcoords: usize,
    colors: Option<usize>,
) -> Result<()> {
    let out_of_range = |what: &str, index: usize, len: usize| {
        ColladaError::InvalidReference(format!("{what} index {index} out of range ({len} entries)"))
    };

    for corner in corners {
        if corner.position >= positions {
            return Err(out_of_range("position", corner.position, positions));
        }
        if corner.normal >= normals {
            return Err(out_of_range("normal", corner.normal, normals));
        }
        if corner.texcoord >= texcoords {
            return Err(out_of_range("texcoord", corner.texcoord, texcoords));
        }
        if let (Some(index), Some(len)) = (corner.color, colors)
            && index >= len
        {
            return Err(out_of_range("color", index, len));
        }
    }
    Ok(())
}

/// Assign joint ids and convert the scene node tree into joints
///
/// Names found in `joint_names` take their table index as id; other joint
/// nodes are appended to the table.
fn build_skeleton(root: &RawNode, joint_names: &mut Vec<String>) -> Result<Joint> {
    let mut ids: HashMap<String, u32> = joint_names
        .iter()
        .enumerate()
        .map(|(id, name)| (name.clone(), id as u32))
        .collect();
    let mut assigned = HashSet::new();
    convert_node(root, joint_names, &mut ids, &mut assigned)
}

fn convert_node(
    node: &RawNode,
    joint_names: &mut Vec<String>,
    ids: &mut HashMap<String, u32>,
    assigned: &mut HashSet<u32>,
) -> Result<Joint> {
    let name = node.joint_name(joint_names);
    let id = match ids.get(&name) {
        Some(&id) => id,
        None => {
            let id = joint_names.len() as u32;
            debug!("Joint '{}' is not in the skin's joint table, using id {}", name, id);
            joint_names.push(name.clone());
            ids.insert(name.clone(), id);
            id
        }
    };
    if !assigned.insert(id) {
        return Err(ColladaError::DuplicateJoint { name, id });
    }

    let mut joint = Joint::new(id, name, node.transform);
    for child in &node.children {
        if !child.is_joint && !ids.contains_key(&child.joint_name(joint_names)) {
            debug!("Skipping non-joint node {:?}", child.id);
            continue;
        }
        joint.add_child(convert_node(child, joint_names, ids, assigned)?);
    }
    Ok(joint)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = r##"<COLLADA>
      <asset><up_axis>Z_UP</up_axis></asset>
      <library_geometries>
        <geometry id="mesh"><mesh>
          <source id="p"><float_array>0 0 0 1 0 0 0 1 0</float_array></source>
          <source id="n"><float_array>0 0 1</float_array></source>
          <source id="uv"><float_array>0 0 1 0 0 1</float_array></source>
          <source id="c"><float_array>1 0 0 0 1 0</float_array></source>
          <vertices id="v"><input semantic="POSITION" source="#p"/></vertices>
          <triangles count="1">
            <input semantic="VERTEX" source="#v" offset="0"/>
            <input semantic="NORMAL" source="#n" offset="1"/>
            <input semantic="TEXCOORD" source="#uv" offset="2"/>
            <input semantic="COLOR" source="#c" offset="3"/>
            <p>0 0 0 0 1 0 1 1 2 0 2 0</p>
          </triangles>
        </mesh></geometry>
      </library_geometries>
      <library_controllers>
        <controller id="skin"><skin source="#mesh">
          <source id="j"><Name_array>Root Arm Hand</Name_array></source>
          <source id="w"><float_array>1 0.1 0.4 0.2 0.3</float_array></source>
          <vertex_weights count="3">
            <input semantic="JOINT" source="#j" offset="0"/>
            <input semantic="WEIGHT" source="#w" offset="1"/>
            <vcount>1 4 2</vcount>
            <v>0 0 0 1 1 2 2 3 0 4 1 2 2 2</v>
          </vertex_weights>
        </skin></controller>
      </library_controllers>
      <library_visual_scenes><visual_scene id="s">
        <node id="Armature">
          <node id="Armature_Root" sid="Root" name="Root" type="JOINT">
            <matrix>1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1</matrix>
            <node id="Armature_Arm" sid="Arm" name="Arm" type="JOINT">
              <matrix>1 0 0 0 0 1 0 1 0 0 1 0 0 0 0 1</matrix>
              <node id="Armature_Hand" sid="Hand" name="Hand" type="JOINT">
                <matrix>1 0 0 0 0 1 0 1 0 0 1 0 0 0 0 1</matrix>
              </node>
              <node id="Armature_Prop" name="Prop" type="JOINT">
                <matrix>1 0 0 0.5 0 1 0 0 0 0 1 0 0 0 0 1</matrix>
              </node>
            </node>
            <node id="Light" name="Light"/>
          </node>
        </node>
      </visual_scene></library_visual_scenes>
    </COLLADA>"##;

    fn raw(text: &str) -> RawDocument {
        DocumentParser::new(&LoadConfig::default())
            .parse_str(text)
            .unwrap()
    }

    #[test]
    fn test_build_triangle_model() {
        let model = build(raw(TRIANGLE), &LoadConfig::default()).unwrap();

        assert_eq!(model.triangle_count(), 1);
        assert_eq!(model.positions.len(), 3);
        assert_eq!(model.corners[1].normal, 0);
        assert_eq!(model.corners[1].color, Some(1));
        assert_eq!(model.vertex_joint_ids[1], vec![0, 1, 2, 0]);
        assert_eq!(model.vertex_weight_indices[1], vec![1, 2, 3, 4]);
        assert_eq!(model.weights.len(), 5);

        // Prop was not in the joint table
        assert_eq!(model.joint_names, vec!["Root", "Arm", "Hand", "Prop"]);
        assert_eq!(model.root_joint.joint_count(), 4);
        assert_eq!(model.root_joint.find("Prop").map(|j| j.id), Some(3));
        assert!(model.root_joint.find("Light").is_none());
    }

    #[test]
    fn test_influences_are_fixed_width() {
        let model = build(raw(TRIANGLE), &LoadConfig::default()).unwrap();

        assert_eq!(model.influences[0].joint_ids, vec![0, 0, 0]);
        assert_eq!(model.influences[0].weights, vec![1.0, 0.0, 0.0]);

        // 0.1/0.4/0.2/0.3 keeps joints 1, 0, 2
        let heavy = &model.influences[1];
        assert_eq!(heavy.joint_ids, vec![1, 0, 2]);
        assert!((heavy.weight_sum() - 1.0).abs() < 1e-6);
        assert!((heavy.weights[0] - 0.4 / 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_output_buffers() {
        let model = build(raw(TRIANGLE), &LoadConfig::default()).unwrap();

        let vertices = model.vertex_buffer();
        assert_eq!(vertices.len(), 3 * VERTEX_STRIDE);
        // Second corner: position 1, normal 0, texcoord 1, color 1
        assert_eq!(
            &vertices[VERTEX_STRIDE..2 * VERTEX_STRIDE],
            &[1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0]
        );

        let ids = model.joint_id_buffer();
        let weights = model.joint_weight_buffer();
        assert_eq!(ids.len(), 3 * model.max_influences);
        assert_eq!(weights.len(), ids.len());
        assert_eq!(&ids[0..3], &[0, 0, 0]);
    }

    #[test]
    fn test_default_color_is_white() {
        let text = TRIANGLE
            .replace(r##"<input semantic="COLOR" source="#c" offset="3"/>"##, "")
            .replace("<p>0 0 0 0 1 0 1 1 2 0 2 0</p>", "<p>0 0 0 1 0 1 2 0 2</p>");
        let model = build(raw(&text), &LoadConfig::default()).unwrap();
        assert!(model.colors.is_none());
        let vertices = model.vertex_buffer();
        assert_eq!(&vertices[8..11], &[1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_inverse_binds_follow_hierarchy() {
        let model = build(raw(TRIANGLE), &LoadConfig::default()).unwrap();
        let hand = model.root_joint.find("Hand").unwrap();
        let origin = hand.inverse_bind_transform().transform_point3(Vec3::new(0.0, 2.0, 0.0));
        assert!(origin.length() < 1e-6);
    }

    #[test]
    fn test_up_axis_conversion() {
        let config = LoadConfig {
            up_axis: UpAxisPolicy::ConvertToYUp,
            ..LoadConfig::default()
        };
        let model = build(raw(TRIANGLE), &config).unwrap();

        // +Z normal becomes +Y, +Y position becomes -Z
        assert!((model.normals[0] - Vec3::Y).length() < 1e-6);
        assert!((model.positions[2] - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);

        let arm = model.root_joint.find("Arm").unwrap();
        let origin = arm.inverse_bind_transform().transform_point3(Vec3::new(0.0, 0.0, -1.0));
        assert!(origin.length() < 1e-5);

        let preserved = build(raw(TRIANGLE), &LoadConfig::default()).unwrap();
        assert_eq!(preserved.normals[0], Vec3::Z);
    }

    #[test]
    fn test_joint_index_out_of_range() {
        let text = TRIANGLE.replace("<v>0 0 0 1", "<v>7 0 0 1");
        let err = build(raw(&text), &LoadConfig::default()).unwrap_err();
        assert!(matches!(err, ColladaError::InvalidReference(_)));
    }

    #[test]
    fn test_unknown_normal_source() {
        let text = TRIANGLE.replace(r##"source="#n" offset="1""##, r##"source="#missing" offset="1""##);
        let err = build(raw(&text), &LoadConfig::default()).unwrap_err();
        assert!(matches!(err, ColladaError::InvalidReference(_)));
    }

    #[test]
    fn test_normal_must_be_a_corner_input() {
        // A NORMAL listed only under <vertices> has no per-corner index
        let mut document = raw(TRIANGLE);
        document.geometry.face_inputs.retain(|input| input.semantic != "NORMAL");
        document.geometry.vertex_inputs.push(crate::document::RawInput {
            semantic: "NORMAL".to_string(),
            source: "n".to_string(),
            offset: 0,
            set: None,
        });

        let err = build(document, &LoadConfig::default()).unwrap_err();
        assert!(matches!(err, ColladaError::MissingSection(_)));
    }

    #[test]
    fn test_duplicate_joint_names() {
        let text = TRIANGLE.replace(r#"sid="Hand" name="Hand""#, r#"sid="Arm" name="Arm""#);
        let err = build(raw(&text), &LoadConfig::default()).unwrap_err();
        assert!(matches!(err, ColladaError::DuplicateJoint { id: 1, .. }));
    }

    #[test]
    fn test_zero_max_influences_rejected() {
        let config = LoadConfig {
            max_influences: 0,
            ..LoadConfig::default()
        };
        let err = build(raw(TRIANGLE), &config).unwrap_err();
        assert!(matches!(err, ColladaError::ConfigError(_)));
    }
}
