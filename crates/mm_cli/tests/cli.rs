//! End-to-end CLI tests against the compiled `mm` binary (spec §6 "Input — CLI").

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn write_archive(dir: &std::path::Path, name: &str, class_name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let body = format!(
        r#"[{{"name":"{class_name}","super_name":null,"interfaces":[],"access":0,"methods":[],"fields":[]}}]"#
    );
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn identity_run_writes_mapping_file_and_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_archive(dir.path(), "a.json", "com/example/clientApp");
    let b = write_archive(dir.path(), "b.json", "com/example/clientApp");
    let out = dir.path().join("mappings.txt");

    Command::cargo_bin("mm")
        .unwrap()
        .arg(&a)
        .arg(&b)
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("classes"));

    let mapping = fs::read_to_string(&out).unwrap();
    assert!(mapping.contains("## Class Mappings"));
    assert!(mapping.contains("com/example/clientApp -> com/example/clientApp"));
}

#[test]
fn quiet_flag_suppresses_the_run_summary() {
    let dir = tempfile::tempdir().unwrap();
    let a = write_archive(dir.path(), "a.json", "com/example/clientApp");
    let b = write_archive(dir.path(), "b.json", "com/example/clientApp");
    let out = dir.path().join("mappings.txt");

    Command::cargo_bin("mm")
        .unwrap()
        .arg(&a)
        .arg(&b)
        .arg(&out)
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn conflicting_hybrid_flags_exit_with_usage_error() {
    Command::cargo_bin("mm")
        .unwrap()
        .args(["a.json", "b.json", "--hybrid", "--no-hybrid"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn missing_archive_exits_with_code_one() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("does-not-exist.json");
    let b = write_archive(dir.path(), "b.json", "a/A");

    Command::cargo_bin("mm")
        .unwrap()
        .arg(&missing)
        .arg(&b)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("mm: error"));
}
