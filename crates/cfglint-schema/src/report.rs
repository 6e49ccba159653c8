//! # Error Reporter
//!
//! Renders a [`ValidationReport`] into operator-facing diagnostics. A
//! violation's JSON Pointer becomes a display trail rooted at `context`:
//!
//! | pointer | trail |
//! |---|---|
//! | `""` | `context` |
//! | `/name` | `context -> name` |
//! | `/0/name` | `context[0] -> name` |
//! | `/routes/2/path` | `context -> routes[2] -> path` |

use std::path::Path;

use cfglint_core::{Diagnostic, DiagnosticSink};
use serde_json::Value;

use crate::validate::{ValidationReport, Violation, ViolationKind};

/// Root of every display trail.
pub const TRAIL_ROOT: &str = "context";

/// Emit the diagnostics for one validated file.
///
/// An empty report yields a single pass message. Otherwise a header is
/// followed by one record per violation, in report order.
pub fn report(report: &ValidationReport, path: &Path, sink: &mut dyn DiagnosticSink) {
    if report.is_empty() {
        sink.emit(Diagnostic::Passed {
            path: path.to_path_buf(),
        });
        return;
    }

    sink.emit(Diagnostic::ViolationsFound {
        path: path.to_path_buf(),
        count: report.len(),
    });
    for violation in report {
        sink.emit(Diagnostic::Violation {
            path: path.to_path_buf(),
            config: render_location(&violation.pointer),
            message: render_message(violation),
        });
    }
}

/// Render a JSON Pointer as a `context -> field[idx]` trail.
pub fn render_location(pointer: &str) -> String {
    let mut trail = String::from(TRAIL_ROOT);
    for segment in pointer.split('/').skip(1) {
        if segment.bytes().all(|b| b.is_ascii_digit()) {
            trail.push('[');
            trail.push_str(segment);
            trail.push(']');
        } else {
            trail.push_str(" -> ");
            trail.push_str(&unescape(segment));
        }
    }
    trail
}

fn unescape(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

/// The violation message, with the allowed values appended for enum failures.
pub fn render_message(violation: &Violation) -> String {
    match (&violation.kind, &violation.details) {
        (ViolationKind::Enum, Some(details)) => {
            format!("{}: {}", violation.message, render_details(details))
        }
        _ => violation.message.clone(),
    }
}

/// Join array details with `,`; strings are shown bare, other values as JSON.
pub fn render_details(details: &Value) -> String {
    match details {
        Value::Array(values) => values.iter().map(render_scalar).collect::<Vec<_>>().join(","),
        other => render_scalar(other),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
