//! # Per-File Pipeline
//!
//! [`Checker`] runs one file through classify → parse → validate → report.
//! Unmatched files are skipped silently, parse failures are reported and
//! skipped, and only a schema that cannot be evaluated stops the run.

use std::path::Path;

use cfglint_core::DiagnosticSink;
use serde::Serialize;

use crate::classify::classify;
use crate::parse::parse;
use crate::registry::SchemaRegistry;
use crate::report::report;
use crate::validate::{SchemaValidator, ValidatorError};

/// What happened to one walked file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Not a config file, or no schema for it.
    Skipped,
    /// Matched a schema but could not be decoded.
    ParseFailed,
    /// Validated with no violations.
    Passed,
    /// Validated with this many violations.
    Violations(usize),
}

/// Checks files against the schemas of one registry.
#[derive(Debug)]
pub struct Checker<'r> {
    registry: &'r SchemaRegistry,
    validator: SchemaValidator,
}

impl<'r> Checker<'r> {
    /// Prepare a checker over `registry`.
    pub fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            validator: SchemaValidator::new(registry),
        }
    }

    /// The registry files are matched against.
    pub fn registry(&self) -> &SchemaRegistry {
        self.registry
    }

    /// Process one file, emitting its diagnostics into `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidatorError`] when the matched schema cannot be evaluated.
    pub fn check_file(
        &self,
        path: &Path,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<FileOutcome, ValidatorError> {
        let Some(file) = classify(path, self.registry) else {
            return Ok(FileOutcome::Skipped);
        };
        let Some(schema) = self.registry.lookup(file.schema_name.as_str()) else {
            return Ok(FileOutcome::Skipped);
        };
        tracing::debug!(path = %path.display(), schema = %file.schema_name, format = %file.format, "checking config file");

        let Some(instance) = parse(&file, sink) else {
            return Ok(FileOutcome::ParseFailed);
        };

        let violations = self.validator.validate(&instance, schema)?;
        report(&violations, &file.path, sink);

        Ok(if violations.is_empty() {
            FileOutcome::Passed
        } else {
            FileOutcome::Violations(violations.len())
        })
    }
}

/// Totals over a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    /// Files matched to a schema.
    pub scanned: usize,
    /// Files that validated cleanly.
    pub passed: usize,
    /// Files with at least one violation.
    pub with_violations: usize,
    /// Files that could not be decoded.
    pub parse_failures: usize,
    /// Violations across all files.
    pub violations: usize,
}

impl ScanSummary {
    /// Fold one file outcome into the totals.
    pub fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Skipped => return,
            FileOutcome::ParseFailed => self.parse_failures += 1,
            FileOutcome::Passed => self.passed += 1,
            FileOutcome::Violations(n) => {
                self.with_violations += 1;
                self.violations += n;
            }
        }
        self.scanned += 1;
    }

    /// True if every scanned file parsed and validated cleanly.
    pub fn is_clean(&self) -> bool {
        self.with_violations == 0 && self.parse_failures == 0
    }
}

impl std::fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} config file(s) checked: {} passed, {} with violations ({} total), {} unparseable",
            self.scanned, self.passed, self.with_violations, self.violations, self.parse_failures
        )
    }
}
