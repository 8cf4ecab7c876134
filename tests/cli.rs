//! Exit status and output of the `envrender` binary.

#![allow(deprecated)] // cargo_bin

use assert_cmd::assert::OutputAssertExt;
use assert_cmd::cargo::CommandCargoExt;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn envrender() -> Command {
    let mut cmd = Command::cargo_bin("envrender").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write_template(dir: &TempDir, src: &str) -> std::path::PathBuf {
    let path = dir.path().join("app.tpl");
    fs::write(&path, src).unwrap();
    path
}

#[test]
fn test_renders_to_stdout() {
    let dir = TempDir::new().unwrap();
    let source = write_template(&dir, "host={{ .DbHost }}");
    envrender()
        .arg("-s")
        .arg(&source)
        .env("APPCONF_DB_HOST", "db.local")
        .assert()
        .success()
        .stdout("host=db.local");
}

#[test]
fn test_custom_prefix_and_target() {
    let dir = TempDir::new().unwrap();
    let source = write_template(&dir, "{{ .Port }}");
    let target = dir.path().join("out.conf");
    envrender()
        .args(["-p", "SVC", "-t"])
        .arg(&target)
        .arg("-s")
        .arg(&source)
        .env("SVC_PORT", "8080")
        .assert()
        .success()
        .stdout("");
    assert_eq!(fs::read_to_string(&target).unwrap(), "8080");
}

#[test]
fn test_no_source_argument_exits_1() {
    envrender()
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--source"));
}

#[test]
fn test_missing_source_file_exits_1() {
    let dir = TempDir::new().unwrap();
    envrender()
        .arg("-s")
        .arg(dir.path().join("absent.tpl"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_bad_template_exits_2() {
    let dir = TempDir::new().unwrap();
    let source = write_template(&dir, "{{.VarStandard} items are made of {.VarList}}");
    envrender().arg("-s").arg(&source).assert().code(2);
}

#[test]
fn test_render_failure_exits_3_and_keeps_target() {
    let dir = TempDir::new().unwrap();
    let source = write_template(&dir, "{{ .Items | upper }}");
    let target = dir.path().join("out.conf");
    fs::write(&target, "previous").unwrap();
    envrender()
        .arg("-s")
        .arg(&source)
        .arg("-t")
        .arg(&target)
        .env("APPCONF_ITEMS", "a,b")
        .assert()
        .code(3);
    assert_eq!(fs::read_to_string(&target).unwrap(), "previous");
}

#[test]
fn test_explain_prints_bindings() {
    let dir = TempDir::new().unwrap();
    let source = write_template(&dir, "{{ .DbHost }}");
    envrender()
        .arg("--explain")
        .arg("-s")
        .arg(&source)
        .env_remove("APPCONF_DB_HOST")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"key\": \"APPCONF_DB_HOST\""))
        .stdout(predicate::str::contains("\"missing\": true"));
}

#[test]
fn test_help_exits_0() {
    envrender().arg("--help").assert().success();
}
