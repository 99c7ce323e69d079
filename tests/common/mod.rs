use assert_cmd::{Command, cargo::cargo_bin_cmd};
use std::fs;
use std::path::{Path, PathBuf};

pub const HASH_A: &str = "0cc175b9c0f1b6a831c399e269772661";
pub const HASH_B: &str = "92eb5ffee6ae2fec3ad71c777531578f";

/// The binary with `RUST_LOG` cleared so the caller's environment does not
/// leak into stderr assertions.
pub fn checktree_cmd() -> Command {
    let mut cmd = cargo_bin_cmd!("checktree");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Creates `<parent>/<name>` containing `files`.
pub fn dir_with_files(parent: &Path, name: &str, files: &[(&str, &str)]) -> PathBuf {
    let dir = parent.join(name);
    fs::create_dir_all(&dir).unwrap();
    for (file, content) in files {
        fs::write(dir.join(file), content).unwrap();
    }
    dir
}

// Each integration test file is compiled as its own crate, and not all of
// them inspect manifests.
#[allow(dead_code)]
pub fn manifest_of(dir: &Path) -> PathBuf {
    let name = dir.file_name().unwrap().to_str().unwrap();
    dir.join(format!("{name}.md5"))
}

#[allow(dead_code)]
pub fn write_manifest(dir: &Path, entries: &[(&str, &str)]) {
    let raw: String = entries
        .iter()
        .map(|(name, hash)| format!("{hash}  {name}\n"))
        .collect();
    fs::write(manifest_of(dir), raw).unwrap();
}
