//! # Parser Layer
//!
//! Turns a config file into a [`serde_json::Value`], or explains why it
//! cannot. Nothing here returns an error: an unreadable or malformed file
//! produces a `ParseFailed`/`SyntaxDetail` diagnostic pair and `None`, and
//! the scan moves on to the next file.
//!
//! JSON is decoded strictly (no comments, no trailing commas). Syntax
//! errors are rendered jsonlint-style:
//!
//! ```text
//! Parse error on line 3, column 1:
//! }
//! ^
//! trailing comma
//! ```
//!
//! YAML goes through `serde_yaml` and is then converted into the JSON value
//! model, so both formats validate identically.

use std::fmt;
use std::path::Path;

use cfglint_core::{ConfigFormat, Diagnostic, DiagnosticSink};
use serde_json::Value;

use crate::classify::ConfigFile;

/// Characters of source shown before the error column.
const EXCERPT_LEAD: usize = 40;
/// Characters of source shown after the error column.
const EXCERPT_TAIL: usize = 20;

/// Decode `file` according to its format.
pub fn parse(file: &ConfigFile, sink: &mut dyn DiagnosticSink) -> Option<Value> {
    match file.format {
        ConfigFormat::Json => parse_json(&file.path, sink),
        ConfigFormat::Yaml => parse_yaml(&file.path, sink),
    }
}

/// Read and strictly decode a JSON file.
pub fn parse_json(path: &Path, sink: &mut dyn DiagnosticSink) -> Option<Value> {
    let content = read(path, ConfigFormat::Json, sink)?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            let detail = JsonSyntaxError::locate(&content, &e).to_string();
            fail(path, ConfigFormat::Json, detail, sink);
            None
        }
    }
}

/// Read and decode a YAML file into the JSON value model.
///
/// Merge keys (`<<`) are resolved before conversion.
pub fn parse_yaml(path: &Path, sink: &mut dyn DiagnosticSink) -> Option<Value> {
    let content = read(path, ConfigFormat::Yaml, sink)?;
    let decoded = serde_yaml::from_str::<serde_yaml::Value>(&content)
        .and_then(|mut yaml| yaml.apply_merge().map(|()| yaml))
        .map_err(|e| e.to_string())
        .and_then(|yaml| yaml_to_json_value(&yaml));
    match decoded {
        Ok(value) => Some(value),
        Err(detail) => {
            fail(path, ConfigFormat::Yaml, detail, sink);
            None
        }
    }
}

fn read(path: &Path, format: ConfigFormat, sink: &mut dyn DiagnosticSink) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            fail(path, format, format!("cannot read file: {e}"), sink);
            None
        }
    }
}

fn fail(path: &Path, format: ConfigFormat, detail: String, sink: &mut dyn DiagnosticSink) {
    sink.emit(Diagnostic::ParseFailed {
        path: path.to_path_buf(),
        format,
    });
    sink.emit(Diagnostic::SyntaxDetail {
        path: path.to_path_buf(),
        detail,
    });
}

/// Position and explanation of a JSON syntax error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonSyntaxError {
    /// 1-based line of the error.
    pub line: usize,
    /// 1-based character column of the error; 0 when the decoder reports none.
    pub column: usize,
    /// The offending source line, windowed around the column.
    pub excerpt: String,
    /// Offset of the caret within `excerpt`.
    pub caret: usize,
    /// What the decoder found, without its position suffix.
    pub reason: String,
}

impl JsonSyntaxError {
    /// Build the display form of `error`, raised while decoding `content`.
    pub fn locate(content: &str, error: &serde_json::Error) -> Self {
        let line = error.line();
        let source_line = content
            .lines()
            .nth(line.saturating_sub(1))
            .unwrap_or_default();
        let chars: Vec<char> = source_line.chars().collect();

        // serde_json counts columns in bytes.
        let byte_at = error.column().saturating_sub(1);
        let at = source_line
            .char_indices()
            .take_while(|(i, _)| *i < byte_at)
            .count();
        let column = if error.column() == 0 { 0 } else { at + 1 };
        let start = at.saturating_sub(EXCERPT_LEAD);
        let end = (at + EXCERPT_TAIL).min(chars.len());
        let mut excerpt = String::new();
        let mut caret = at - start;
        if start > 0 {
            excerpt.push_str("...");
            caret += 3;
        }
        excerpt.extend(&chars[start..end]);
        if end < chars.len() {
            excerpt.push_str("...");
        }

        Self {
            line,
            column,
            excerpt,
            caret,
            reason: strip_position(&error.to_string()),
        }
    }
}

impl fmt::Display for JsonSyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Parse error on line {}, column {}:", self.line, self.column)?;
        writeln!(f, "{}", self.excerpt)?;
        writeln!(f, "{}^", "-".repeat(self.caret))?;
        f.write_str(&self.reason)
    }
}

/// Drop serde_json's trailing " at line N column M".
fn strip_position(message: &str) -> String {
    match message.rfind(" at line ") {
        Some(idx) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Tags are dropped in favour of the tagged value. Scalar keys are
/// stringified; sequence or mapping keys have no JSON equivalent.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(i.into()))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(u.into()))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent number {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => seq
            .iter()
            .map(yaml_to_json_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    serde_yaml::Value::Null => "null".to_string(),
                    other => return Err(format!("unsupported YAML mapping key: {other:?}")),
                };
                object.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(object))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfglint_core::{MemorySink, SchemaName, Severity};
    use serde_json::json;
    use std::path::PathBuf;

    fn write(dir: &Path, file: &str, content: &str) -> PathBuf {
        let path = dir.join(file);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn detail(sink: &MemorySink) -> String {
        match &sink.diagnostics()[1] {
            Diagnostic::SyntaxDetail { detail, .. } => detail.clone(),
            other => panic!("expected SyntaxDetail, got {other:?}"),
        }
    }

    #[test]
    fn valid_json_decodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.json", r#"{"name": "ok", "port": 80}"#);
        let mut sink = MemorySink::new();
        let value = parse_json(&path, &mut sink).unwrap();
        assert_eq!(value, json!({"name": "ok", "port": 80}));
        assert!(sink.is_empty());
    }

    #[test]
    fn trailing_comma_is_error_and_warning_pair() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.json", "{\n  \"name\": \"ok\",\n}\n");
        let mut sink = MemorySink::new();
        assert!(parse_json(&path, &mut sink).is_none());

        assert_eq!(sink.len(), 2);
        assert_eq!(
            sink.diagnostics()[0],
            Diagnostic::ParseFailed { path: path.clone(), format: ConfigFormat::Json }
        );
        assert_eq!(sink.at(Severity::Error).count(), 1);
        assert_eq!(sink.at(Severity::Warn).count(), 1);

        let detail = detail(&sink);
        assert!(detail.starts_with("Parse error on line 3, column 1:"), "{detail}");
        assert!(detail.contains("trailing comma"), "{detail}");
        assert!(!detail.contains(" at line "), "{detail}");
    }

    #[test]
    fn comments_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.json", "// note\n{}");
        let mut sink = MemorySink::new();
        assert!(parse_json(&path, &mut sink).is_none());
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn caret_sits_under_error_column() {
        let content = r#"{"a": 1 "b": 2}"#;
        let err = serde_json::from_str::<Value>(content).unwrap_err();
        let located = JsonSyntaxError::locate(content, &err);
        assert_eq!(located.line, 1);
        assert_eq!(located.excerpt, content);
        let rendered = located.to_string();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], content);
        assert_eq!(lines[2].len(), located.caret + 1);
        assert!(lines[2].ends_with('^'));
        assert_eq!(located.caret, located.column - 1);
    }

    #[test]
    fn column_counts_characters_on_non_ascii_lines() {
        let content = r#"{"éééé": 1 x}"#;
        let err = serde_json::from_str::<Value>(content).unwrap_err();
        let located = JsonSyntaxError::locate(content, &err);
        let x = content.chars().position(|c| c == 'x').unwrap();
        assert_eq!(located.caret, x);
        assert_eq!(located.column, x + 1);
        assert_eq!(located.excerpt.chars().nth(located.caret), Some('x'));
    }

    #[test]
    fn long_lines_are_windowed() {
        let content = format!("{{\"key\": \"{}\" x}}", "v".repeat(200));
        let err = serde_json::from_str::<Value>(&content).unwrap_err();
        let located = JsonSyntaxError::locate(&content, &err);
        assert!(located.excerpt.starts_with("..."));
        assert!(located.excerpt.chars().count() < content.chars().count());
        assert!(located.caret <= EXCERPT_LEAD + 3);
    }

    #[test]
    fn empty_json_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.json", "");
        let mut sink = MemorySink::new();
        assert!(parse_json(&path, &mut sink).is_none());
        assert!(detail(&sink).contains("EOF while parsing"));
    }

    #[test]
    fn unreadable_file_is_recoverable() {
        let mut sink = MemorySink::new();
        let path = PathBuf::from("/nonexistent/cfglint/app.json");
        assert!(parse_json(&path, &mut sink).is_none());
        assert_eq!(sink.len(), 2);
        assert!(detail(&sink).starts_with("cannot read file:"));
    }

    #[test]
    fn valid_yaml_converts_to_json_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "app.yaml",
            "name: web\nport: 8080\nratio: 0.5\ntags:\n  - a\n  - b\n1: numeric key\n",
        );
        let mut sink = MemorySink::new();
        let value = parse_yaml(&path, &mut sink).unwrap();
        assert_eq!(
            value,
            json!({"name": "web", "port": 8080, "ratio": 0.5, "tags": ["a", "b"], "1": "numeric key"})
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn yaml_merge_keys_are_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "app.yaml",
            "base: &base\n  host: localhost\nprod:\n  <<: *base\n  port: 443\n",
        );
        let mut sink = MemorySink::new();
        let value = parse_yaml(&path, &mut sink).unwrap();
        assert_eq!(value["prod"], json!({"host": "localhost", "port": 443}));
    }

    #[test]
    fn yaml_tags_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.yaml", "secret: !vault abc\n");
        let mut sink = MemorySink::new();
        assert_eq!(parse_yaml(&path, &mut sink).unwrap(), json!({"secret": "abc"}));
    }

    #[test]
    fn malformed_yaml_reports_decoder_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.yaml", "name: [unclosed\n");
        let mut sink = MemorySink::new();
        assert!(parse_yaml(&path, &mut sink).is_none());
        assert_eq!(
            sink.diagnostics()[0],
            Diagnostic::ParseFailed { path, format: ConfigFormat::Yaml }
        );
        assert!(!detail(&sink).is_empty());
    }

    #[test]
    fn parse_dispatches_on_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.yaml", "name: web\n");
        let file = ConfigFile {
            path,
            format: ConfigFormat::Yaml,
            schema_name: SchemaName::new("app"),
        };
        let mut sink = MemorySink::new();
        assert_eq!(parse(&file, &mut sink), Some(json!({"name": "web"})));
    }

    #[test]
    fn strip_position_keeps_message() {
        assert_eq!(strip_position("trailing comma at line 3 column 1"), "trailing comma");
        assert_eq!(strip_position("no position"), "no position");
    }
}
