//! Common test utilities and fixtures

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Path of a file under `tests/data`
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Contents of the two-bone panel fixture
pub fn two_bone_document() -> String {
    std::fs::read_to_string(fixture("two_bone.dae")).expect("Failed to read fixture")
}

/// Write `content` to a file in a fresh temporary directory
pub fn write_document(content: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("model.dae");
    std::fs::write(&path, content).expect("Failed to write test document");
    (dir, path)
}

/// Whether two points are within `1e-4` of each other
pub fn near(a: glam::Vec3, b: glam::Vec3) -> bool {
    (a - b).length() < 1e-4
}
