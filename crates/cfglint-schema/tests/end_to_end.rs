//! Integration test: run real files through schema loading, classification,
//! parsing, validation and reporting, and check the exact diagnostics an
//! operator would see.

use std::path::{Path, PathBuf};

use cfglint_core::{Diagnostic, MemorySink, Severity};
use cfglint_schema::{Checker, FileOutcome, ScanSummary, SchemaRegistry};

const APP_SCHEMA: &str = r#"{
    "type": "object",
    "required": ["name"],
    "properties": {
        "name": {"type": "string"},
        "env": {"enum": ["dev", "prod"]},
        "routes": {
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "path": {"type": "string", "required": true},
                    "port": {"type": "integer", "minimum": 1, "maximum": 65535}
                }
            }
        }
    }
}"#;

struct Fixture {
    _dir: tempfile::TempDir,
    schemas: PathBuf,
    project: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let schemas = dir.path().join("schemas");
        let project = dir.path().join("project");
        std::fs::create_dir_all(&schemas).unwrap();
        std::fs::create_dir_all(&project).unwrap();
        std::fs::write(schemas.join("app.json"), APP_SCHEMA).unwrap();
        Self {
            _dir: dir,
            schemas,
            project,
        }
    }

    fn config(&self, file: &str, content: &str) -> PathBuf {
        let path = self.project.join(file);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn check(&self, path: &Path) -> (FileOutcome, Vec<Diagnostic>) {
        let registry = SchemaRegistry::load_dir(&self.schemas).unwrap();
        let checker = Checker::new(&registry);
        let mut sink = MemorySink::new();
        let outcome = checker.check_file(path, &mut sink).unwrap();
        (outcome, sink.into_inner())
    }
}

fn violation(path: &Path, config: &str, message: &str) -> Diagnostic {
    Diagnostic::Violation {
        path: path.to_path_buf(),
        config: config.to_string(),
        message: message.to_string(),
    }
}

#[test]
fn type_mismatch_is_reported_at_member() {
    let fx = Fixture::new();
    let path = fx.config("app.json", r#"{"name": 5}"#);
    let (outcome, diagnostics) = fx.check(&path);

    assert_eq!(outcome, FileOutcome::Violations(1));
    assert_eq!(
        diagnostics,
        vec![
            Diagnostic::ViolationsFound { path: path.clone(), count: 1 },
            violation(&path, "context -> name", "Instance is not a required type"),
        ]
    );
}

#[test]
fn valid_file_passes() {
    let fx = Fixture::new();
    let path = fx.config("app.json", r#"{"name": "ok"}"#);
    let (outcome, diagnostics) = fx.check(&path);

    assert_eq!(outcome, FileOutcome::Passed);
    assert_eq!(diagnostics, vec![Diagnostic::Passed { path: path.clone() }]);
    assert!(diagnostics[0].to_string().contains(&path.display().to_string()));
}

#[test]
fn trailing_comma_reports_syntax_and_skips_validation() {
    let fx = Fixture::new();
    let path = fx.config("app.json", "{\n  \"name\": \"ok\",\n}\n");
    let (outcome, diagnostics) = fx.check(&path);

    assert_eq!(outcome, FileOutcome::ParseFailed);
    assert_eq!(diagnostics.len(), 2);
    assert_eq!(diagnostics[0].severity(), Severity::Error);
    assert!(diagnostics[0].to_string().contains(&path.display().to_string()));
    assert_eq!(diagnostics[1].severity(), Severity::Warn);
    let detail = diagnostics[1].to_string();
    assert!(detail.contains("line 3"), "{detail}");
    assert!(detail.contains("column 1"), "{detail}");
}

#[test]
fn nested_violations_render_index_trails() {
    let fx = Fixture::new();
    let path = fx.config(
        "app.yaml",
        "name: web\nenv: qa\nroutes:\n  - path: /\n    port: 0\n  - port: 80\n",
    );
    let (outcome, diagnostics) = fx.check(&path);

    assert_eq!(outcome, FileOutcome::Violations(3));
    assert_eq!(
        diagnostics[1..],
        [
            violation(&path, "context -> env", "Instance is not one of the possible values: dev,prod"),
            violation(
                &path,
                "context -> routes[0] -> port",
                "Number is less than the required minimum value"
            ),
            violation(&path, "context -> routes[1] -> path", "Property is required"),
        ]
    );
}

#[test]
fn malformed_yaml_is_recoverable() {
    let fx = Fixture::new();
    let path = fx.config("app.yaml", "name: web\n  bad indent: [\n");
    let (outcome, diagnostics) = fx.check(&path);

    assert_eq!(outcome, FileOutcome::ParseFailed);
    assert_eq!(diagnostics[0].to_string(), format!("YAML parse error in file: {}", path.display()));
    assert_eq!(diagnostics[1].severity(), Severity::Warn);
}

#[test]
fn unmatched_files_produce_nothing() {
    let fx = Fixture::new();
    for file in ["app.txt", "app.yml", "other.json", "README"] {
        let path = fx.config(file, "not even json");
        let (outcome, diagnostics) = fx.check(&path);
        assert_eq!(outcome, FileOutcome::Skipped, "{file}");
        assert!(diagnostics.is_empty(), "{file}");
    }
}

#[test]
fn dotted_names_share_a_schema() {
    let fx = Fixture::new();
    let path = fx.config("app.production.json", r#"{"name": "prod"}"#);
    let (outcome, _) = fx.check(&path);
    assert_eq!(outcome, FileOutcome::Passed);
}

#[test]
fn one_bad_file_does_not_stop_the_scan() {
    let fx = Fixture::new();
    let files = [
        fx.config("app.json", "{"),
        fx.config("app.yaml", "name: ok\n"),
        fx.config("app.staging.json", r#"{"name": []}"#),
    ];
    let registry = SchemaRegistry::load_dir(&fx.schemas).unwrap();
    let checker = Checker::new(&registry);
    let mut sink = MemorySink::new();
    let mut summary = ScanSummary::default();
    for file in &files {
        summary.record(checker.check_file(file, &mut sink).unwrap());
    }

    assert_eq!(summary.scanned, 3);
    assert_eq!(summary.parse_failures, 1);
    assert_eq!(summary.passed, 1);
    assert_eq!(summary.with_violations, 1);
}
