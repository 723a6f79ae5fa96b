//! `rigkit info`

use anyhow::Result;
use std::path::Path;

use super::load_document;
use crate::utils::{add_table_row, create_table};
use rig_collada::PipelineConfig;

pub fn execute(path: &Path, settings: &PipelineConfig) -> Result<()> {
    let loaded = load_document(path, settings)?;
    let model = &loaded.model;

    println!("=== Model Information ===");
    let mut table = create_table(vec!["Property", "Value"]);
    add_table_row(&mut table, vec!["File".to_string(), path.display().to_string()]);
    add_table_row(&mut table, vec!["Positions".to_string(), model.positions.len().to_string()]);
    add_table_row(&mut table, vec!["Triangles".to_string(), model.triangle_count().to_string()]);
    add_table_row(
        &mut table,
        vec!["Vertex colors".to_string(), model.colors.is_some().to_string()],
    );
    add_table_row(&mut table, vec!["Joints".to_string(), model.joint_count().to_string()]);
    add_table_row(
        &mut table,
        vec!["Root joint".to_string(), model.root_joint.name.clone()],
    );
    add_table_row(
        &mut table,
        vec!["Max influences".to_string(), model.max_influences.to_string()],
    );

    match &loaded.animation {
        Some(animation) => {
            add_table_row(
                &mut table,
                vec![
                    "Animation length".to_string(),
                    format!("{} ms", animation.length_ms()),
                ],
            );
            add_table_row(
                &mut table,
                vec!["Keyframes".to_string(), animation.keyframes().len().to_string()],
            );
        }
        None => add_table_row(&mut table, vec!["Animation".to_string(), "none".to_string()]),
    }
    table.printstd();

    Ok(())
}
