//! # Schema Names
//!
//! A [`SchemaName`] pairs a configuration file with the schema that
//! describes it. Both sides derive the name the same way: take the file's
//! base name and keep everything before the first `.`. So
//! `application.json`, `application.yaml` and `application.schema.json`
//! all map to `application`.
//!
//! Names are case-sensitive and compared byte-for-byte.

use std::borrow::Borrow;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Key identifying one configuration category in the schema registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaName(String);

impl SchemaName {
    /// Wrap an already-derived name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derive a name from a bare file name: the portion before the first `.`.
    ///
    /// A file name starting with `.` yields the empty name, which never
    /// matches a registered schema.
    pub fn from_file_name(file_name: &str) -> Self {
        let stem = file_name.split('.').next().unwrap_or_default();
        Self(stem.to_string())
    }

    /// Derive a name from the final component of `path`.
    ///
    /// Returns `None` when the path has no file name or it is not UTF-8.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.file_name()
            .and_then(|n| n.to_str())
            .map(Self::from_file_name)
    }

    /// Access the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True if the name is empty (e.g. derived from a dotfile).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Borrow<str> for SchemaName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SchemaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SchemaName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
