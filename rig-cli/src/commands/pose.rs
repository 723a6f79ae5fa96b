//! `rigkit pose`

use anyhow::{Context, Result};
use log::debug;
use rig_collada::{AnimatorConfig, Animator, PipelineConfig};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::load_document;
use crate::cli::EndPolicyArg;
use crate::utils::{add_table_row, create_table, format_floats};

/// Skinning matrix of one joint, as printed
#[derive(Debug, Serialize)]
struct JointPose<'a> {
    id: usize,
    name: &'a str,
    /// Row-major, like the document
    matrix: [f32; 16],
}

pub fn execute(
    path: &Path,
    time: f64,
    end_policy: Option<EndPolicyArg>,
    json: bool,
    settings: &PipelineConfig,
) -> Result<()> {
    let animator_config = match end_policy {
        Some(policy) => AnimatorConfig::new(policy.into()),
        None => settings.animator_config().context(
            "No end-of-animation policy: pass --end-policy or set end_policy in the settings file",
        )?,
    };

    let loaded = load_document(path, settings)?;
    let animation = loaded
        .animation
        .with_context(|| format!("{} has no animation", path.display()))?;
    let model = Arc::new(loaded.model);

    let mut animator = Animator::new(Arc::clone(&model), animator_config);
    animator.play_animation(Arc::new(animation));
    animator.tick(time);
    debug!("Sampled pose at {} ms", animator.elapsed_ms());

    let poses: Vec<JointPose<'_>> = animator
        .joint_transforms()
        .iter()
        .enumerate()
        .map(|(id, matrix)| JointPose {
            id,
            name: model.joint_names.get(id).map_or("?", String::as_str),
            matrix: matrix.transpose().to_cols_array(),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&poses)?);
        return Ok(());
    }

    println!("=== Pose at {} ms ===", animator.elapsed_ms());
    let mut table = create_table(vec!["Id", "Joint", "Skinning matrix (row-major)"]);
    for pose in &poses {
        let rows: Vec<String> = pose.matrix.chunks(4).map(format_floats).collect();
        add_table_row(
            &mut table,
            vec![pose.id.to_string(), pose.name.to_string(), rows.join("\n")],
        );
    }
    table.printstd();
    Ok(())
}
