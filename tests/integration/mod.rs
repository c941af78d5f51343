//! Bundled patch sets under `patches/`, run against representative fixtures

mod date_utils;
mod rebrand;
mod routing;

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use text_patcher::config::{load_from_path, PatchConfig};

pub fn manifest_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn load_bundled(name: &str) -> PatchConfig {
    let path = manifest_dir().join("patches").join(name);
    load_from_path(&path).unwrap_or_else(|err| panic!("failed to load {name}: {err}"))
}

pub fn load_fixture(name: &str) -> String {
    fs::read_to_string(manifest_dir().join("tests/fixtures").join(name))
        .unwrap_or_else(|err| panic!("failed to load fixture {name}: {err}"))
}

/// Temp workspace with `files` written at their relative paths.
pub fn workspace_with(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (rel, contents) in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }
    dir
}

pub fn read(dir: &Path, rel: &str) -> String {
    fs::read_to_string(dir.join(rel)).unwrap()
}
