//! `<visual_scene>` node tree decoding

use super::element::Element;
use crate::error::{ColladaError, Result};
use crate::math::{mat4_from_row_major, parse_floats};
use glam::{Mat4, Vec3};

/// A scene node below the skeleton root
#[derive(Debug, Clone)]
pub struct RawNode {
    pub id: Option<String>,
    pub sid: Option<String>,
    pub name: Option<String>,
    /// `type="JOINT"` on the node
    pub is_joint: bool,
    /// Local transform relative to the parent node
    pub transform: Mat4,
    pub children: Vec<RawNode>,
}

impl RawNode {
    /// Name under which this node is known to a skin's joint table
    ///
    /// Checks `sid`, then `name`, then `id` against the table; a node the
    /// table does not mention falls back to the first identifier it has.
    pub fn joint_name(&self, joint_table: &[String]) -> String {
        let candidates: Vec<&str> = [&self.sid, &self.name, &self.id]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect();
        candidates
            .iter()
            .find(|candidate| joint_table.iter().any(|name| name.as_str() == **candidate))
            .or_else(|| candidates.first())
            .map_or_else(String::new, |name| (*name).to_string())
    }

    /// Every node of the subtree, depth first, parents before children
    pub fn walk(&self) -> Vec<&RawNode> {
        let mut nodes = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children.iter().rev());
        }
        nodes
    }
}

/// Find the skeleton root below `root_name` and decode its subtree
///
/// `root_name` designates the node holding the skeleton (matched against
/// `id` or `name`). If that node is itself a joint it becomes the root;
/// otherwise its first joint child does. A holder with only non-joint
/// children (meshes, lights) has no skeleton.
pub(crate) fn parse_skeleton(visual_scene: &Element, root_name: &str) -> Result<RawNode> {
    let holder = visual_scene
        .descendants_named("node")
        .into_iter()
        .find(|node| node.attr("id") == Some(root_name) || node.attr("name") == Some(root_name))
        .ok_or_else(|| ColladaError::MissingSection(format!("skeleton root node '{root_name}'")))?;

    let root = if is_joint(holder) {
        holder
    } else {
        holder
            .children_named("node")
            .find(|child| is_joint(child))
            .ok_or_else(|| {
                ColladaError::MissingSection(format!("joint node below '{root_name}'"))
            })?
    };

    parse_node(root)
}

fn is_joint(node: &Element) -> bool {
    node.attr("type") == Some("JOINT")
}

fn parse_node(element: &Element) -> Result<RawNode> {
    let id = element.attr("id").map(str::to_string);
    let context = format!("transform of node '{}'", id.as_deref().unwrap_or("?"));

    let children = element
        .children_named("node")
        .map(parse_node)
        .collect::<Result<Vec<_>>>()?;

    Ok(RawNode {
        sid: element.attr("sid").map(str::to_string),
        name: element.attr("name").map(str::to_string),
        is_joint: is_joint(element),
        transform: node_transform(element, &context)?,
        children,
        id,
    })
}

/// Local transform of a node: its `<matrix>`, or its transform elements
/// composed in document order
fn node_transform(element: &Element, context: &str) -> Result<Mat4> {
    if let Some(matrix) = element.child("matrix") {
        return mat4_from_row_major(&parse_floats(&matrix.text, context)?, context);
    }

    let mut transform = Mat4::IDENTITY;
    for part in &element.children {
        let step = match part.name.as_str() {
            "translate" => Mat4::from_translation(vec3(&parse_floats(&part.text, context)?, context)?),
            "scale" => Mat4::from_scale(vec3(&parse_floats(&part.text, context)?, context)?),
            "rotate" => {
                let values = parse_floats(&part.text, context)?;
                let &[x, y, z, degrees] = values.as_slice() else {
                    return Err(ColladaError::ParseError(format!(
                        "{context}: <rotate> needs 4 values"
                    )));
                };
                Mat4::from_axis_angle(Vec3::new(x, y, z).normalize_or_zero(), degrees.to_radians())
            }
            _ => continue,
        };
        transform *= step;
    }
    Ok(transform)
}

fn vec3(values: &[f32], context: &str) -> Result<Vec3> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(ColladaError::ParseError(format!(
            "{context}: expected 3 values, found {}",
            values.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r#"<visual_scene id="Scene">
      <node id="Armature" name="Armature">
        <node id="Armature_Hip" sid="Hip" name="Hip" type="JOINT">
          <matrix sid="transform">1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1</matrix>
          <node id="Armature_Knee" sid="Knee" name="Knee" type="JOINT">
            <matrix sid="transform">1 0 0 0 0 1 0 2 0 0 1 0 0 0 0 1</matrix>
          </node>
          <node id="Armature_Toe" name="Toe" type="JOINT">
            <translate>0 0 1</translate>
            <rotate>0 0 1 90</rotate>
          </node>
        </node>
      </node>
      <node id="Body" name="Body"/>
    </visual_scene>"#;

    fn scene() -> Element {
        Element::read(SCENE.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_skeleton_below_holder() {
        let root = parse_skeleton(&scene(), "Armature").unwrap();
        assert_eq!(root.sid.as_deref(), Some("Hip"));
        assert!(root.is_joint);
        assert_eq!(root.children.len(), 2);

        let knee = &root.children[0];
        let p = knee.transform.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_root_can_be_joint_itself() {
        let root = parse_skeleton(&scene(), "Armature_Knee").unwrap();
        assert_eq!(root.sid.as_deref(), Some("Knee"));
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_missing_root() {
        let err = parse_skeleton(&scene(), "Rig").unwrap_err();
        assert!(matches!(err, ColladaError::MissingSection(_)));
    }

    #[test]
    fn test_holder_without_joint_child() {
        let err = parse_skeleton(&scene(), "Body").unwrap_err();
        assert!(matches!(err, ColladaError::MissingSection(_)));

        let xml = r#"<visual_scene>
          <node id="Armature"><node id="Lamp" name="Lamp"/></node>
        </visual_scene>"#;
        let err = parse_skeleton(&Element::read(xml.as_bytes()).unwrap(), "Armature").unwrap_err();
        assert!(matches!(err, ColladaError::MissingSection(_)));
    }

    #[test]
    fn test_composed_transform_elements() {
        let root = parse_skeleton(&scene(), "Armature").unwrap();
        let toe = &root.children[1];
        let p = toe.transform.transform_point3(Vec3::X);
        assert!((p - Vec3::new(0.0, 1.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn test_joint_name_prefers_table_entry() {
        let root = parse_skeleton(&scene(), "Armature").unwrap();
        let table = vec!["Armature_Hip".to_string()];
        assert_eq!(root.joint_name(&table), "Armature_Hip");
        assert_eq!(root.joint_name(&[]), "Hip");
        assert_eq!(root.children[1].joint_name(&[]), "Toe");
    }

    #[test]
    fn test_walk_order() {
        let root = parse_skeleton(&scene(), "Armature").unwrap();
        let names: Vec<_> = root.walk().iter().map(|n| n.joint_name(&[])).collect();
        assert_eq!(names, vec!["Hip", "Knee", "Toe"]);
    }
}
