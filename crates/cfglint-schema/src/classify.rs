//! # File Classifier
//!
//! Decides whether a walked file is a config file: its extension must be a
//! known [`ConfigFormat`] and its schema name must be registered. Everything
//! else is skipped without output.

use std::path::{Path, PathBuf};

use cfglint_core::{ConfigFormat, SchemaName};

use crate::registry::SchemaRegistry;

/// A file that will be parsed and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    /// Location of the file.
    pub path: PathBuf,
    /// Decoder selected by extension.
    pub format: ConfigFormat,
    /// Registered schema the file is validated against.
    pub schema_name: SchemaName,
}

/// Classify `path` against `registry`.
///
/// Returns `None` for unknown extensions and for names with no registered
/// schema. The format check runs first, so unrelated files never touch the
/// registry.
pub fn classify(path: &Path, registry: &SchemaRegistry) -> Option<ConfigFile> {
    let format = ConfigFormat::from_path(path)?;
    let schema_name = SchemaName::from_path(path)?;
    if !registry.contains(schema_name.as_str()) {
        tracing::trace!(path = %path.display(), schema = %schema_name, "no schema registered; skipping");
        return None;
    }
    Some(ConfigFile {
        path: path.to_path_buf(),
        format,
        schema_name,
    })
}
