use std::env;
use std::fs;

use envrender::{run, RenderConfig, Renderer, TemplateError};
use pretty_assertions::assert_eq;
use serial_test::serial;

#[test]
#[serial]
fn test_snapshot_is_taken_once() {
    env::set_var("ENVRENDER_TEST_GREETING", "hello");
    let renderer = Renderer::from_env("ENVRENDER_TEST");
    env::set_var("ENVRENDER_TEST_GREETING", "changed");

    let tpl = renderer.parse("t", "{{ .Greeting }} {{ env \"greeting\" }}").unwrap();
    assert_eq!(renderer.render(&tpl).unwrap(), "hello hello");
    env::remove_var("ENVRENDER_TEST_GREETING");
}

#[test]
#[serial]
fn test_run_writes_target_file() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("app.conf.tpl");
    let target = dir.path().join("app.conf");
    fs::write(&source, "port={{ .HttpPort }}\nhosts={{ join .Hosts \";\" }}\n").unwrap();

    env::set_var("ENVRENDER_RUN_HTTP_PORT", "8080");
    env::set_var("ENVRENDER_RUN_HOSTS", "a,b");
    let mut config = RenderConfig::new(&source);
    config.target = Some(target.clone());
    config.prefix = "ENVRENDER_RUN".into();
    run(&config).unwrap();
    env::remove_var("ENVRENDER_RUN_HTTP_PORT");
    env::remove_var("ENVRENDER_RUN_HOSTS");

    assert_eq!(fs::read_to_string(&target).unwrap(), "port=8080\nhosts=a;b\n");
}

#[test]
#[serial]
fn test_failed_render_leaves_target_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("bad.tpl");
    let target = dir.path().join("out.txt");
    fs::write(&source, "{{ .Items | upper }}").unwrap();
    fs::write(&target, "previous").unwrap();

    env::set_var("ENVRENDER_BAD_ITEMS", "x,y");
    let mut config = RenderConfig::new(&source);
    config.target = Some(target.clone());
    config.prefix = "ENVRENDER_BAD".into();
    let err = run(&config).unwrap_err();
    env::remove_var("ENVRENDER_BAD_ITEMS");

    assert!(matches!(err, TemplateError::Render(_)), "{err}");
    assert_eq!(fs::read_to_string(&target).unwrap(), "previous");
}

#[test]
fn test_run_reports_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let config = RenderConfig::new(dir.path().join("absent.tpl"));
    assert!(matches!(run(&config), Err(TemplateError::SourceNotFound(_))));
}
