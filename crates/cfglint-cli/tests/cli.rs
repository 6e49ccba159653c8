//! Integration test: run the `cfglint` binary against a project laid out
//! in a temporary directory and check exit codes and operator output.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const APP_SCHEMA: &str = r#"{
    "type": "object",
    "required": ["name"],
    "properties": {
        "name": {"type": "string"},
        "env": {"enum": ["dev", "prod"]}
    }
}"#;

fn project() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let root = std::fs::canonicalize(dir.path()).unwrap();
    let schemas = root.join("node_modules/web/schemas");
    std::fs::create_dir_all(&schemas).unwrap();
    std::fs::write(schemas.join("app.json"), APP_SCHEMA).unwrap();
    (dir, root)
}

fn cfglint(root: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cfglint"))
        .args(args)
        .arg("--root")
        .arg(root)
        .env_remove("RUST_LOG")
        .env_remove("CFGLINT_FRAMEWORK")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn clean_project_passes() {
    let (_dir, root) = project();
    std::fs::write(root.join("app.json"), r#"{"name": "site"}"#).unwrap();

    let output = cfglint(&root, &["validate", "--framework-name", "web", "--strict"]);
    let out = stdout(&output);
    assert_eq!(output.status.code(), Some(0), "{out}");
    assert!(out.contains("config validation passed"), "{out}");
    assert!(out.contains("cfglint validate done."), "{out}");
}

#[test]
fn violations_are_reported_with_trails() {
    let (_dir, root) = project();
    std::fs::write(root.join("app.json"), r#"{"name": 5, "env": "qa"}"#).unwrap();

    let output = cfglint(&root, &["validate", "--framework-name", "web"]);
    let out = stdout(&output);
    assert_eq!(output.status.code(), Some(0), "{out}");
    assert!(out.contains("possible errors in config file"), "{out}");
    assert!(out.contains("context -> name"), "{out}");
    assert!(
        out.contains("Instance is not one of the possible values: dev,prod"),
        "{out}"
    );
}

#[test]
fn strict_mode_fails_on_violations() {
    let (_dir, root) = project();
    std::fs::write(root.join("app.json"), r#"{"env": "qa"}"#).unwrap();

    let output = cfglint(&root, &["validate", "--framework-name", "web", "--strict"]);
    let out = stdout(&output);
    assert_eq!(output.status.code(), Some(1), "{out}");
    assert!(out.contains("possible errors in config file"), "{out}");
    assert!(!out.contains("parse error"), "{out}");
    assert!(out.contains("cfglint validate done."), "{out}");
}

#[test]
fn strict_mode_fails_on_parse_errors() {
    let (_dir, root) = project();
    std::fs::write(root.join("app.json"), "{\"name\": \"x\",}").unwrap();

    let output = cfglint(&root, &["validate", "--framework-name", "web", "--strict"]);
    let out = stdout(&output);
    assert_eq!(output.status.code(), Some(1), "{out}");
    assert!(out.contains("JSON parse error in file"), "{out}");
}

#[test]
fn run_config_file_supplies_framework() {
    let (_dir, root) = project();
    std::fs::write(root.join("cfglint.yaml"), "framework_name: web\n").unwrap();
    std::fs::write(root.join("app.json"), r#"{"name": "site"}"#).unwrap();

    let output = cfglint(&root, &["validate", "--json"]);
    let out = stdout(&output);
    assert_eq!(output.status.code(), Some(0), "{out}");
    assert!(out.contains("\"passed\": 1"), "{out}");
}

#[test]
fn missing_framework_is_an_error() {
    let (_dir, root) = project();
    let output = cfglint(&root, &["validate", "--framework-name", "absent"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("cannot find host framework"));
}

#[test]
fn extra_arguments_are_rejected() {
    let (_dir, root) = project();
    let output = cfglint(&root, &["validate", "unexpected"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn schemas_lists_registered_names() {
    let (_dir, root) = project();
    let output = cfglint(&root, &["schemas", "--framework-name", "web"]);
    let out = stdout(&output);
    assert_eq!(output.status.code(), Some(0), "{out}");
    assert!(out.lines().any(|l| l.starts_with("app") && l.contains("draft-03")), "{out}");
}
