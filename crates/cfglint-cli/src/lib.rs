//! # cfglint-cli — Config Validation Command-Line Interface
//!
//! The `cfglint` binary: find the host framework, load the schemas it
//! ships, walk the project root and validate every matching config file.
//!
//! ## Subcommands
//!
//! - `validate`: scan the project and report violations
//! - `schemas`: list the schemas a scan would use
//!
//! ## Crate Policy
//!
//! - Argument parsing and settings resolution live here; validation logic
//!   lives in `cfglint-schema`.
//! - Handlers return `anyhow::Result<u8>` (the exit code). Fatal errors
//!   carry context from each boundary they cross.

pub mod config;
pub mod host;
pub mod schemas;
pub mod validate;
pub mod walk;
