mod common;

use common::checktree_cmd;
use predicates::prelude::*;

#[test]
fn no_directories_prints_help() {
    checktree_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"))
        .stdout(predicate::str::contains("[DIRECTORY]..."));
}

#[test]
fn version_is_long_only() {
    checktree_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn resolved_policy_is_printed() {
    let temp = tempfile::TempDir::new().unwrap();

    checktree_cmd()
        .args(["-u", "fail", "-m", "skip"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "renames = \"show\"\n\
             missing = \"skip\"\n\
             new = \"prompt\"\n\
             deletes = \"prompt\"\n\
             updates = \"fail\"\n",
        ));
}

#[test]
fn preset_overrides_explicit_policy() {
    let temp = tempfile::TempDir::new().unwrap();

    checktree_cmd()
        .args(["-u", "fail", "--autoupdate-all"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "renames = \"autoupdate\"\n\
             missing = \"create\"\n\
             new = \"autoupdate\"\n\
             deletes = \"autoupdate\"\n\
             updates = \"autoupdate\"\n",
        ));
}

#[test]
fn unknown_action_is_rejected() {
    checktree_cmd()
        .args(["-n", "sometimes", "."])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value 'sometimes'"));
}

#[test]
fn long_help_lists_policies_and_presets() {
    checktree_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("POLICIES:"))
        .stdout(predicate::str::contains("-A, --autoupdate-all"))
        .stdout(predicate::str::contains("-s, --safe-mode"));
}
