//! CLI integration tests for the rigkit commands

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../file-formats/scene/rig-collada/tests/data/two_bone.dae")
}

fn rigkit() -> Command {
    Command::cargo_bin("rigkit").expect("rigkit binary should be built")
}

#[test]
fn test_info_summary() {
    rigkit()
        .arg("info")
        .arg(fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("Triangles"))
        .stdout(predicate::str::contains("Root"))
        .stdout(predicate::str::contains("1000 ms"));
}

#[test]
fn test_tree_lists_joints() {
    rigkit()
        .args(["tree", "--no-color", "--metadata"])
        .arg(fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("Root"))
        .stdout(predicate::str::contains("└── • Arm"))
        .stdout(predicate::str::contains("id: 1"));
}

#[test]
fn test_pose_requires_end_policy() {
    rigkit()
        .arg("pose")
        .arg(fixture())
        .assert()
        .failure()
        .stderr(predicate::str::contains("end-of-animation policy"));
}

#[test]
fn test_pose_json_output() {
    let output = rigkit()
        .args(["pose", "--time", "500", "--end-policy", "wrap", "--json"])
        .arg(fixture())
        .output()
        .unwrap();
    assert!(output.status.success());

    let poses: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let poses = poses.as_array().unwrap();
    assert_eq!(poses.len(), 2);
    assert_eq!(poses[1]["name"], "Arm");
    assert_eq!(poses[1]["matrix"].as_array().unwrap().len(), 16);
}

#[test]
fn test_pose_end_policy_from_settings() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.json");
    fs::write(&settings, r#"{ "end_policy": "clamp", "max_influences": 4 }"#).unwrap();

    rigkit()
        .arg("--config")
        .arg(&settings)
        .args(["pose", "--time", "5000"])
        .arg(fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("Pose at 1000 ms"));
}

#[test]
fn test_validate_fixture() {
    rigkit()
        .arg("validate")
        .arg(fixture())
        .assert()
        .success()
        .stdout(predicate::str::contains("Model is valid"));
}

#[test]
fn test_missing_file() {
    rigkit()
        .args(["info", "does-not-exist.dae"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse"));
}

#[test]
fn test_invalid_settings() {
    let dir = TempDir::new().unwrap();
    let settings = dir.path().join("settings.json");
    fs::write(&settings, r#"{ "max_influences": 0 }"#).unwrap();

    rigkit()
        .arg("--config")
        .arg(&settings)
        .arg("info")
        .arg(fixture())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid load settings"));
}
