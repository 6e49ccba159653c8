//! # cfglint-core — Foundational Types for cfglint
//!
//! Shared vocabulary for the config validation pipeline. Every other crate
//! in the workspace depends on `cfglint-core`; it depends on nothing
//! internal.
//!
//! ## Key Types
//!
//! - [`SchemaName`]: the key that pairs a config file with its schema,
//!   derived from a file's base name up to the first `.`.
//! - [`ConfigFormat`]: JSON or YAML, chosen by file extension.
//! - [`Diagnostic`] and [`DiagnosticSink`]: the operator-facing message
//!   stream. The pipeline never writes to stdout or a logger directly; it
//!   emits diagnostics into a sink. [`TracingSink`] forwards them to
//!   `tracing`, [`MemorySink`] records them for inspection.
//! - [`CfglintError`]: run-aborting failures (no host framework, no
//!   schemas, traversal I/O).
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cfglint-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod diagnostic;
pub mod error;
pub mod format;
pub mod name;

// Re-export primary types for ergonomic imports.
pub use diagnostic::{Diagnostic, DiagnosticSink, MemorySink, Severity, TracingSink};
pub use error::CfglintError;
pub use format::ConfigFormat;
pub use name::SchemaName;
