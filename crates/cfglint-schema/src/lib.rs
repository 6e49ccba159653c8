//! # cfglint-schema — Config Validation Pipeline
//!
//! Validates project configuration files against the JSON schemas a host
//! framework ships in its `schemas` directory.
//!
//! ## Pipeline
//!
//! 1. [`registry`]: load schema documents, keyed by file name before the
//!    first `.`.
//! 2. [`classify`]: match a walked file to a schema by base name and
//!    extension (`.json` or `.yaml`). Unmatched files are skipped silently.
//! 3. [`parse`]: decode the file. Syntax errors become diagnostics, never
//!    errors.
//! 4. [`validate`]: check the decoded value. Draft-03 schemas run through
//!    the native evaluator in `draft3`; later drafts go to `jsonschema`.
//! 5. [`report`]: render violations as `context -> field[idx]` trails.
//!
//! [`Checker`] strings the steps together for one file.
//!
//! ## Crate Policy
//!
//! - Depends only on `cfglint-core` internally.
//! - Schemas are trusted: a bad schema is a fatal error. Config files are
//!   not: a bad config file is a diagnostic and the scan continues.

pub mod classify;
mod draft3;
pub mod parse;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod validate;

pub use classify::{classify, ConfigFile};
pub use parse::{parse_json, parse_yaml, JsonSyntaxError};
pub use pipeline::{Checker, FileOutcome, ScanSummary};
pub use registry::{discover_schema_files, RegistryError, SchemaDocument, SchemaRegistry, SchemaSource};
pub use report::{render_location, render_message};
pub use validate::{
    validate_value, SchemaDraft, SchemaValidator, ValidationReport, ValidatorError, Violation,
    ViolationKind,
};
