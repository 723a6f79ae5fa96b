//! `rigkit tree`

use anyhow::Result;
use glam::Vec3;
use rig_collada::{Joint, PipelineConfig};
use std::path::Path;

use super::load_document;
use crate::utils::{NodeType, TreeNode, TreeOptions, format_floats, render_tree};

pub fn execute(
    path: &Path,
    depth: Option<usize>,
    no_color: bool,
    metadata: bool,
    settings: &PipelineConfig,
) -> Result<()> {
    let loaded = load_document(path, settings)?;

    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    let root = TreeNode::new(name, NodeType::Root)
        .with_metadata("joints", &loaded.model.joint_count().to_string())
        .add_child(joint_node(&loaded.model.root_joint));

    let options = TreeOptions {
        max_depth: depth,
        no_color,
        show_metadata: metadata,
    };
    print!("{}", render_tree(&root, &options));
    Ok(())
}

fn joint_node(joint: &Joint) -> TreeNode {
    let node_type = if joint.children.is_empty() {
        NodeType::Leaf
    } else {
        NodeType::Joint
    };
    let bind_position = joint
        .inverse_bind_transform()
        .inverse()
        .transform_point3(Vec3::ZERO);

    joint
        .children
        .iter()
        .fold(
            TreeNode::new(joint.name.clone(), node_type)
                .with_metadata("id", &joint.id.to_string())
                .with_metadata("bind position", &format_floats(&bind_position.to_array())),
            |node, child| node.add_child(joint_node(child)),
        )
}
