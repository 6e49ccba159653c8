//! # Schema Registry
//!
//! Holds the schema documents of one run, keyed by [`SchemaName`]. The
//! registry is filled once from the host framework's schema directory and
//! only read afterwards. Each run builds its own instance; there is no
//! process-wide schema table.
//!
//! Schemas are trusted input. A schema that cannot be read or is not JSON
//! means the host installation is broken, so every error here is fatal to
//! the run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use cfglint_core::SchemaName;
use serde_json::Value;
use thiserror::Error;

use crate::validate::SchemaDraft;

/// Error while loading schema documents.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The schema file could not be read.
    #[error("cannot read schema '{name}' at {path}: {source}")]
    Read {
        /// Name the schema was being registered under.
        name: String,
        /// Path of the schema file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("schema '{name}' at {path} is not valid JSON: {reason}")]
    Parse {
        /// Name the schema was being registered under.
        name: String,
        /// Path of the schema file.
        path: String,
        /// Decoder message.
        reason: String,
    },

    /// The schema is JSON but cannot be a schema document.
    #[error("schema '{name}' is not a schema document: {reason}")]
    InvalidSchema {
        /// Name the schema was being registered under.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The schema directory could not be listed.
    #[error("cannot read schema directory {path}: {source}")]
    DirectoryRead {
        /// The directory.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// A registered schema and where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDocument {
    name: SchemaName,
    path: PathBuf,
    value: Value,
    draft: SchemaDraft,
}

impl SchemaDocument {
    /// Name this document is registered under.
    pub fn name(&self) -> &SchemaName {
        &self.name
    }

    /// File the document was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The schema itself.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Draft the document is evaluated under.
    pub fn draft(&self) -> SchemaDraft {
        self.draft
    }
}

/// A schema file found in a schema directory, not yet loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaSource {
    /// File name up to the first `.`.
    pub name: SchemaName,
    /// Full path of the file.
    pub path: PathBuf,
}

/// List the schema files of `dir`: every regular `.json` file, sorted by path.
///
/// Subdirectories are not descended into.
///
/// # Errors
///
/// Returns [`RegistryError::DirectoryRead`] if the directory or one of its
/// entries cannot be read.
pub fn discover_schema_files(dir: &Path) -> Result<Vec<SchemaSource>, RegistryError> {
    let dir_err = |source| RegistryError::DirectoryRead {
        path: dir.display().to_string(),
        source,
    };

    let mut sources = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(dir_err)? {
        let path = entry.map_err(dir_err)?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        if let Some(name) = SchemaName::from_path(&path) {
            sources.push(SchemaSource { name, path });
        }
    }
    sources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sources)
}

/// Mapping from schema name to schema document for one run.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<SchemaName, SchemaDocument>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from every schema file in `dir`.
    ///
    /// Files are registered in path order, so when two files derive the same
    /// name the later one wins.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable or malformed schema.
    pub fn load_dir(dir: &Path) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for source in discover_schema_files(dir)? {
            registry.register(source.name, &source.path)?;
        }
        tracing::debug!(
            dir = %dir.display(),
            schema_count = registry.len(),
            "loaded schema directory"
        );
        Ok(registry)
    }

    /// Read the JSON schema at `path` and store it under `name`.
    ///
    /// An existing entry with the same name is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Read`] if the file cannot be read,
    /// [`RegistryError::Parse`] if it is not JSON, and
    /// [`RegistryError::InvalidSchema`] if it is not a JSON object.
    pub fn register(&mut self, name: SchemaName, path: impl AsRef<Path>) -> Result<(), RegistryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| RegistryError::Read {
            name: name.to_string(),
            path: path.display().to_string(),
            source,
        })?;
        let value: Value = serde_json::from_str(&content).map_err(|e| RegistryError::Parse {
            name: name.to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        self.insert(name, value, path)
    }

    /// Store an already-decoded schema under `name`, replacing any entry.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidSchema`] if `value` is not a JSON object.
    pub fn insert(
        &mut self,
        name: SchemaName,
        value: Value,
        path: impl Into<PathBuf>,
    ) -> Result<(), RegistryError> {
        if !value.is_object() {
            return Err(RegistryError::InvalidSchema {
                name: name.to_string(),
                reason: "top-level value must be an object".to_string(),
            });
        }

        let draft = SchemaDraft::detect(&value);
        let document = SchemaDocument {
            name: name.clone(),
            path: path.into(),
            value,
            draft,
        };
        tracing::trace!(schema = %name, path = %document.path.display(), ?draft, "registered schema");
        if let Some(previous) = self.schemas.insert(name, document) {
            tracing::debug!(
                schema = %previous.name,
                replaced = %previous.path.display(),
                "schema name registered twice; keeping the later file"
            );
        }
        Ok(())
    }

    /// Look up a schema by name. Never fails.
    pub fn lookup(&self, name: &str) -> Option<&SchemaDocument> {
        self.schemas.get(name)
    }

    /// True if a schema is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Returns the number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&SchemaName> {
        let mut names: Vec<&SchemaName> = self.schemas.keys().collect();
        names.sort();
        names
    }

    /// Iterate over registered documents in no particular order.
    pub fn documents(&self) -> impl Iterator<Item = &SchemaDocument> {
        self.schemas.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, file: &str, content: &str) -> PathBuf {
        let path = dir.join(file);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn register_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.json", r#"{"type": "object"}"#);

        let mut registry = SchemaRegistry::new();
        registry.register(SchemaName::new("app"), &path).unwrap();

        let doc = registry.lookup("app").unwrap();
        assert_eq!(doc.name().as_str(), "app");
        assert_eq!(doc.path(), path.as_path());
        assert_eq!(doc.value(), &json!({"type": "object"}));
        assert_eq!(doc.draft(), SchemaDraft::Draft3);
    }

    #[test]
    fn lookup_miss_is_none() {
        let registry = SchemaRegistry::new();
        assert!(registry.lookup("app").is_none());
        assert!(!registry.contains("app"));
    }

    #[test]
    fn later_registration_wins() {
        let dir = tempfile::tempdir().unwrap();
        let first = write(dir.path(), "a.json", r#"{"type": "object"}"#);
        let second = write(dir.path(), "b.json", r#"{"type": "array"}"#);

        let mut registry = SchemaRegistry::new();
        registry.register(SchemaName::new("app"), &first).unwrap();
        registry.register(SchemaName::new("app"), &second).unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("app").unwrap().value(), &json!({"type": "array"}));
    }

    #[test]
    fn missing_file_is_read_error() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .register(SchemaName::new("app"), "/nonexistent/cfglint/app.json")
            .unwrap_err();
        assert!(matches!(err, RegistryError::Read { .. }), "got: {err}");
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "app.json", r#"{"type": "object",}"#);

        let mut registry = SchemaRegistry::new();
        let err = registry.register(SchemaName::new("app"), &path).unwrap_err();
        match err {
            RegistryError::Parse { name, reason, .. } => {
                assert_eq!(name, "app");
                assert!(!reason.is_empty());
            }
            other => panic!("expected Parse, got: {other}"),
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn non_object_schema_rejected() {
        let mut registry = SchemaRegistry::new();
        let err = registry
            .insert(SchemaName::new("app"), json!([1, 2]), "app.json")
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidSchema { .. }));
    }

    #[test]
    fn draft_detected_on_insert() {
        let mut registry = SchemaRegistry::new();
        registry
            .insert(
                SchemaName::new("modern"),
                json!({"$schema": "http://json-schema.org/draft-07/schema#"}),
                "modern.json",
            )
            .unwrap();
        assert_eq!(registry.lookup("modern").unwrap().draft(), SchemaDraft::Draft7);
    }

    #[test]
    fn discover_only_json_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "routes.schema.json", "{}");
        write(dir.path(), "application.json", "{}");
        write(dir.path(), "README.md", "# schemas");
        std::fs::create_dir(dir.path().join("nested.json")).unwrap();

        let sources = discover_schema_files(dir.path()).unwrap();
        let names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["application", "routes"]);
    }

    #[test]
    fn discover_missing_dir_is_directory_error() {
        let err = discover_schema_files(Path::new("/nonexistent/cfglint/schemas")).unwrap_err();
        assert!(matches!(err, RegistryError::DirectoryRead { .. }));
    }

    #[test]
    fn load_dir_registers_everything() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "application.json", r#"{"type": "array"}"#);
        write(dir.path(), "defaults.json", r#"{"type": "array"}"#);
        write(dir.path(), "routes.json", r#"{"type": "object"}"#);

        let registry = SchemaRegistry::load_dir(dir.path()).unwrap();
        let names: Vec<&str> = registry.names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["application", "defaults", "routes"]);
        assert_eq!(registry.documents().count(), 3);
    }

    #[test]
    fn load_dir_fails_on_bad_schema() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "application.json", r#"{"type": "array"}"#);
        write(dir.path(), "routes.json", "not json");

        let err = SchemaRegistry::load_dir(dir.path()).unwrap_err();
        assert!(matches!(err, RegistryError::Parse { ref name, .. } if name == "routes"));
    }
}
