//! `rigkit validate`

use anyhow::{Result, bail};
use console::style;
use glam::Mat4;
use rig_collada::PipelineConfig;
use std::path::Path;

use super::{LoadedDocument, load_document};

const TOLERANCE: f32 = 1.0e-3;

/// Outcome of one check
struct Check {
    name: &'static str,
    problems: Vec<String>,
}

pub fn execute(path: &Path, settings: &PipelineConfig) -> Result<()> {
    println!("Validating scene document: {}", path.display());
    let loaded = load_document(path, settings)?;

    let checks = [
        check_bind_pose(&loaded),
        check_joint_ids(&loaded),
        check_influence_width(&loaded),
        check_weight_sums(&loaded),
        check_buffers(&loaded),
        check_animated_joints(&loaded),
    ];

    let mut failures = 0;
    for check in &checks {
        if check.problems.is_empty() {
            println!("{} {}", style("✓").green(), check.name);
        } else {
            failures += check.problems.len();
            println!("{} {}", style("✗").red(), check.name);
            for problem in &check.problems {
                println!("    {problem}");
            }
        }
    }

    if failures > 0 {
        bail!("Validation failed with {failures} problem(s)");
    }
    println!("Model is valid");
    Ok(())
}

fn check_bind_pose(loaded: &LoadedDocument) -> Check {
    let root = &loaded.model.root_joint;
    let problems = root
        .bind_transforms()
        .into_iter()
        .filter_map(|(id, bind)| {
            let joint = root.iter().find(|j| j.id == id)?;
            let product = bind * joint.inverse_bind_transform();
            (!product.abs_diff_eq(Mat4::IDENTITY, TOLERANCE))
                .then(|| format!("joint '{}': bind x inverse bind is not identity", joint.name))
        })
        .collect();
    Check {
        name: "bind x inverse bind = identity",
        problems,
    }
}

fn check_joint_ids(loaded: &LoadedDocument) -> Check {
    let problems = match loaded.model.root_joint.validate_ids() {
        Ok(()) => Vec::new(),
        Err(err) => vec![err.to_string()],
    };
    Check {
        name: "joint ids are unique",
        problems,
    }
}

fn check_influence_width(loaded: &LoadedDocument) -> Check {
    let width = loaded.config.max_influences;
    let problems = loaded
        .model
        .influences
        .iter()
        .enumerate()
        .filter(|(_, influences)| influences.len() != width || influences.weights.len() != width)
        .map(|(vertex, influences)| {
            format!("vertex {vertex}: {} influences, expected {width}", influences.len())
        })
        .collect();
    Check {
        name: "influence lists have a fixed width",
        problems,
    }
}

fn check_weight_sums(loaded: &LoadedDocument) -> Check {
    let model = &loaded.model;
    let problems = model
        .influences
        .iter()
        .zip(&model.vertex_joint_ids)
        .enumerate()
        .filter(|(_, (_, raw))| raw.len() > model.max_influences)
        .filter_map(|(vertex, (influences, _))| {
            let sum = influences.weight_sum();
            ((sum - 1.0).abs() > TOLERANCE && sum != 0.0)
                .then(|| format!("vertex {vertex}: truncated weights sum to {sum}"))
        })
        .collect();
    Check {
        name: "truncated weights sum to 1",
        problems,
    }
}

fn check_buffers(loaded: &LoadedDocument) -> Check {
    let model = &loaded.model;
    let expected = model.corners.len() * model.max_influences;
    let mut problems = Vec::new();
    if model.vertex_buffer().len() != model.corners.len() * rig_collada::VERTEX_STRIDE {
        problems.push("vertex buffer has the wrong length".to_string());
    }
    if model.joint_id_buffer().len() != expected {
        problems.push(format!("joint id buffer is not {expected} entries"));
    }
    if model.joint_weight_buffer().len() != expected {
        problems.push(format!("joint weight buffer is not {expected} entries"));
    }
    Check {
        name: "output buffers are in lockstep",
        problems,
    }
}

fn check_animated_joints(loaded: &LoadedDocument) -> Check {
    let problems = match &loaded.animation {
        Some(animation) => animation
            .joint_names()
            .into_iter()
            .filter(|name| loaded.model.root_joint.find(name).is_none())
            .map(|name| format!("animation targets unknown joint '{name}'"))
            .collect(),
        None => Vec::new(),
    };
    Check {
        name: "animated joints exist in the skeleton",
        problems,
    }
}
